// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "admin";

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor
// de autenticação externo. Aqui só validamos, nunca emitimos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário = ID do profile)
    pub exp: usize, // Expiration time
    #[serde(default)]
    pub iat: Option<usize>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}
