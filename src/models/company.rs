// src/models/company.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_COMPANY_POINTS_PER_KG: i64 = 10;

// ---
// Company (o "Tenant")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Company {
    pub id: Uuid,
    #[schema(ignore)]
    pub owner_user_id: Option<Uuid>,
    #[schema(example = "GreenCycle Ltd")]
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub contact_person: String,
    pub description: Option<String>,
    pub registration_number: Option<String>,
    #[schema(example = "greencycle-ltd")]
    pub company_slug: String,
    #[schema(value_type = f64, example = 10.0)]
    pub points_per_kg: Decimal,
    pub cash_reward_enabled: bool,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub welcome_message: Option<String>,
    #[schema(value_type = Option<f64>, example = 1000.0)]
    pub min_withdrawal_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub owner_user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub contact_person: String,
    pub description: Option<String>,
    pub registration_number: Option<String>,
    pub company_slug: String,
}

/// Campos que o dono da empresa pode alterar pelo painel.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CompanySettings {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub points_per_kg: Option<Decimal>,
    pub cash_reward_enabled: Option<bool>,
    #[validate(url(message = "logo_url must be a valid URL"))]
    pub logo_url: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub primary_color: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub secondary_color: Option<String>,
    #[validate(length(max = 500, message = "welcome_message is too long"))]
    pub welcome_message: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub min_withdrawal_amount: Option<Decimal>,
}

impl CompanySettings {
    pub fn apply_to(&self, company: &mut Company) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut company.name, &self.name);
        set(&mut company.phone, &self.phone);
        set(&mut company.address, &self.address);
        set(&mut company.contact_person, &self.contact_person);
        set_opt(&mut company.description, &self.description);
        set(&mut company.points_per_kg, &self.points_per_kg);
        set(&mut company.cash_reward_enabled, &self.cash_reward_enabled);
        set_opt(&mut company.logo_url, &self.logo_url);
        set_opt(&mut company.primary_color, &self.primary_color);
        set_opt(&mut company.secondary_color, &self.secondary_color);
        set_opt(&mut company.welcome_message, &self.welcome_message);
        set_opt(&mut company.min_withdrawal_amount, &self.min_withdrawal_amount);
    }
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        let mut err = ValidationError::new("hex_color");
        err.message = Some("Colors must use the #RRGGBB format.".into());
        return Err(err);
    }
    Ok(())
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterCompanyPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "contact_person is required"))]
    pub contact_person: String,
    pub description: Option<String>,
    pub registration_number: Option<String>,
}

/// O que o portal público da empresa mostra.
#[derive(Debug, Serialize, ToSchema)]
pub struct PortalView {
    pub name: String,
    pub company_slug: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub welcome_message: Option<String>,
    #[schema(value_type = f64)]
    pub points_per_kg: Decimal,
    #[schema(value_type = f64)]
    pub min_withdrawal_amount: Decimal,
}

/// Gera o slug base a partir do nome ("GreenCycle Ltd." -> "greencycle-ltd").
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() { "company".to_string() } else { slug }
}
