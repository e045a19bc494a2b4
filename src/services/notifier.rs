// src/services/notifier.rs

use crate::models::location::LocationState;

/// Ponto de extensão: quem avisa a empresa quando um local enche.
/// Chamado depois que o depósito foi gravado, só na transição
/// `available -> full`.
pub trait CapacityNotifier: Send + Sync {
    fn notify_full(&self, location: &LocationState);
}

/// Implementação padrão: só registra a intenção no log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl CapacityNotifier for LogNotifier {
    fn notify_full(&self, location: &LocationState) {
        tracing::warn!(
            location_id = %location.location_id,
            company_id = ?location.company_id,
            current_weight_kg = %location.current_weight_kg,
            capacity_kg = %location.capacity_kg,
            "Local de coleta cheio: notificar a empresa responsável"
        );
    }
}
