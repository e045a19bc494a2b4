// src/common/i18n.rs

use std::collections::HashMap;

const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens: (chave, inglês, português).
// Parâmetros usam a forma `{nome}`.
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("invalid_input", "Invalid request.", "Requisição inválida."),
    (
        "below_minimum",
        "Minimum withdrawal amount is ₦{minimum}",
        "O valor mínimo de saque é ₦{minimum}",
    ),
    ("unknown_code", "Invalid unique code", "Código único inválido"),
    ("not_found", "{resource} not found", "{resource} não encontrado"),
    ("insufficient_balance", "Insufficient points", "Pontos insuficientes"),
    (
        "unique_code_taken",
        "This unique code is already linked to another account.",
        "Este código único já está vinculado a outra conta.",
    ),
    ("slug_taken", "Company slug '{slug}' is already in use.", "O slug '{slug}' já está em uso."),
    (
        "withdrawal_resolved",
        "This withdrawal has already been processed.",
        "Este saque já foi processado.",
    ),
    (
        "conflict",
        "The resource was modified concurrently. Please retry.",
        "O recurso foi alterado por outra requisição. Tente novamente.",
    ),
    (
        "portal_disabled",
        "Cash rewards are not enabled for this company.",
        "As recompensas em dinheiro não estão ativas para esta empresa.",
    ),
    (
        "invalid_token",
        "Invalid or missing authentication token.",
        "Token de autenticação inválido ou ausente.",
    ),
    ("forbidden", "Access denied.", "Acesso negado."),
    ("internal", "Internal server error", "Ocorreu um erro inesperado."),
];

/// Armazena as traduções por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut en = HashMap::new();
        let mut pt = HashMap::new();
        for (key, en_msg, pt_msg) in MESSAGES {
            en.insert(*key, *en_msg);
            pt.insert(*key, *pt_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("en", en);
        catalogs.insert("pt", pt);
        Self { catalogs }
    }

    /// Traduz uma chave. Idioma desconhecido cai no inglês; chave
    /// desconhecida volta como ela mesma.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .copied()
            .unwrap_or(key);

        params.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{}}}", name), value)
        })
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
