// src/models/policy.rs

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{company::Company, deposit::WasteType},
};

// =========================================================================
//  PONTUAÇÃO DE DEPÓSITOS
// =========================================================================

/// Regra de pontuação de um canal de submissão. Cada variante carrega a
/// própria taxa e o próprio predicado de validade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPolicy {
    /// Canal padrão: taxa fixa, só pontua acima do limiar (estrito).
    FlatRate { points_per_kg: Decimal, threshold_kg: Decimal },
    /// Taxa configurada pela empresa, sem limiar.
    TenantRate { points_per_kg: Decimal },
    /// Taxa por categoria de resíduo, sem limiar.
    WasteCategory { metal_per_kg: Decimal, non_metal_per_kg: Decimal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub is_valid: bool,
    pub points_earned: Decimal,
}

// Peso x taxa sem pânico: estouro do Decimal é entrada inválida.
fn points_for_weight(weight_kg: Decimal, rate: Decimal) -> Result<Decimal, AppError> {
    weight_kg
        .checked_mul(rate)
        .ok_or_else(|| AppError::InvalidInput("weight_kg is too large".into()))
}

impl SubmissionPolicy {
    /// Classifica o depósito e calcula os pontos. O peso já chega validado
    /// como não negativo.
    pub fn assess(&self, weight_kg: Decimal, waste_type: Option<WasteType>) -> Result<Assessment, AppError> {
        let assessment = match self {
            SubmissionPolicy::FlatRate { points_per_kg, threshold_kg } => {
                let is_valid = weight_kg > *threshold_kg;
                Assessment {
                    is_valid,
                    points_earned: if is_valid {
                        points_for_weight(weight_kg, *points_per_kg)?
                    } else {
                        Decimal::ZERO
                    },
                }
            }
            SubmissionPolicy::TenantRate { points_per_kg } => Assessment {
                is_valid: true,
                points_earned: points_for_weight(weight_kg, *points_per_kg)?,
            },
            SubmissionPolicy::WasteCategory { metal_per_kg, non_metal_per_kg } => {
                let rate = match waste_type {
                    Some(WasteType::Metal) => metal_per_kg,
                    Some(WasteType::NonMetal) => non_metal_per_kg,
                    None => {
                        return Err(AppError::InvalidInput(
                            "waste_type is required for category pricing".into(),
                        ));
                    }
                };
                Assessment { is_valid: true, points_earned: points_for_weight(weight_kg, *rate)? }
            }
        };
        Ok(assessment)
    }
}

// =========================================================================
//  CONVERSÃO PONTOS <-> NAIRA
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NairaConversion {
    /// 1 ponto = ₦1 (portal das empresas)
    OneToOne,
    /// 1 ponto = ₦N (canal padrão usa N = 4)
    Fixed { naira_per_point: Decimal },
}

impl NairaConversion {
    /// `None` quando o resultado não cabe num `Decimal`.
    pub fn points_for(&self, amount_naira: Decimal) -> Option<Decimal> {
        match self {
            NairaConversion::OneToOne => Some(amount_naira),
            NairaConversion::Fixed { naira_per_point } => amount_naira.checked_div(*naira_per_point),
        }
    }

    pub fn naira_for(&self, points: Decimal) -> Option<Decimal> {
        match self {
            NairaConversion::OneToOne => Some(points),
            NairaConversion::Fixed { naira_per_point } => points.checked_mul(*naira_per_point),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalPolicy {
    pub conversion: NairaConversion,
    pub minimum_naira: Decimal,
}

impl WithdrawalPolicy {
    /// Valida o valor pedido e devolve quantos pontos serão reservados.
    /// O saldo é verificado depois, de forma atômica, pelo Ledger.
    pub fn points_required(&self, amount_naira: Decimal) -> Result<Decimal, AppError> {
        if amount_naira <= Decimal::ZERO {
            return Err(AppError::InvalidInput("amount_naira must be greater than 0".into()));
        }
        if amount_naira < self.minimum_naira {
            return Err(AppError::BelowMinimumWithdrawal {
                minimum: self.minimum_naira,
                requested: amount_naira,
            });
        }
        self.conversion
            .points_for(amount_naira)
            .ok_or_else(|| AppError::InvalidInput("amount_naira is too large".into()))
    }
}

// =========================================================================
//  TABELA DE REGRAS (vinda da configuração)
// =========================================================================

/// Constantes de pontuação e saque, e a escolha da regra por canal.
#[derive(Debug, Clone)]
pub struct RewardRules {
    pub flat_rate_points_per_kg: Decimal,
    pub valid_threshold_kg: Decimal,
    pub metal_points_per_kg: Decimal,
    pub non_metal_points_per_kg: Decimal,
    pub naira_per_point: Decimal,
    pub min_withdrawal_naira: Decimal,
    pub company_default_min_withdrawal_naira: Decimal,
}

impl Default for RewardRules {
    fn default() -> Self {
        Self {
            flat_rate_points_per_kg: Decimal::from(50),
            valid_threshold_kg: Decimal::new(1, 1),
            metal_points_per_kg: Decimal::from(5),
            non_metal_points_per_kg: Decimal::from(2),
            naira_per_point: Decimal::from(4),
            min_withdrawal_naira: Decimal::from(50),
            company_default_min_withdrawal_naira: Decimal::from(1000),
        }
    }
}

impl RewardRules {
    /// `None` = canal padrão do hardware; `Some` = canal da empresa.
    pub fn submission_for(&self, company: Option<&Company>, waste_type: Option<WasteType>) -> SubmissionPolicy {
        match (company, waste_type) {
            (None, _) => SubmissionPolicy::FlatRate {
                points_per_kg: self.flat_rate_points_per_kg,
                threshold_kg: self.valid_threshold_kg,
            },
            (Some(_), Some(_)) => SubmissionPolicy::WasteCategory {
                metal_per_kg: self.metal_points_per_kg,
                non_metal_per_kg: self.non_metal_points_per_kg,
            },
            (Some(c), None) => SubmissionPolicy::TenantRate { points_per_kg: c.points_per_kg },
        }
    }

    pub fn withdrawal_for(&self, company: Option<&Company>) -> WithdrawalPolicy {
        match company {
            None => WithdrawalPolicy {
                conversion: NairaConversion::Fixed { naira_per_point: self.naira_per_point },
                minimum_naira: self.min_withdrawal_naira,
            },
            Some(c) => WithdrawalPolicy {
                conversion: NairaConversion::OneToOne,
                minimum_naira: c
                    .min_withdrawal_amount
                    .unwrap_or(self.company_default_min_withdrawal_naira),
            },
        }
    }
}
