// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{MemoryStore, PgStore, RewardsStore},
    models::policy::RewardRules,
    services::{notifier::LogNotifier, Services},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("backend de armazenamento desconhecido: {other}"),
        }
    }
}

// ---
// Configuração (variáveis de ambiente)
// ---
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub device_api_key: Option<String>,
    pub rules: RewardRules,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        fn parse<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
        where
            T: FromStr,
            T::Err: std::fmt::Display,
        {
            match value {
                None => Ok(default),
                Some(raw) => raw
                    .parse::<T>()
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .with_context(|| format!("{key} inválido: {raw:?}")),
            }
        }

        let storage_backend = parse(get("STORAGE_BACKEND"), "STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database_url = get("DATABASE_URL");
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL deve ser definida");
        }
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let defaults = RewardRules::default();
        let rules = RewardRules {
            flat_rate_points_per_kg: parse(
                get("FLAT_RATE_POINTS_PER_KG"),
                "FLAT_RATE_POINTS_PER_KG",
                defaults.flat_rate_points_per_kg,
            )?,
            valid_threshold_kg: parse(get("VALID_THRESHOLD_KG"), "VALID_THRESHOLD_KG", defaults.valid_threshold_kg)?,
            metal_points_per_kg: parse(get("METAL_POINTS_PER_KG"), "METAL_POINTS_PER_KG", defaults.metal_points_per_kg)?,
            non_metal_points_per_kg: parse(
                get("NON_METAL_POINTS_PER_KG"),
                "NON_METAL_POINTS_PER_KG",
                defaults.non_metal_points_per_kg,
            )?,
            naira_per_point: parse(get("NAIRA_PER_POINT"), "NAIRA_PER_POINT", defaults.naira_per_point)?,
            min_withdrawal_naira: parse(
                get("MIN_WITHDRAWAL_NAIRA"),
                "MIN_WITHDRAWAL_NAIRA",
                defaults.min_withdrawal_naira,
            )?,
            company_default_min_withdrawal_naira: parse(
                get("COMPANY_DEFAULT_MIN_WITHDRAWAL_NAIRA"),
                "COMPANY_DEFAULT_MIN_WITHDRAWAL_NAIRA",
                defaults.company_default_min_withdrawal_naira,
            )?,
        };
        if rules.naira_per_point <= Decimal::ZERO {
            bail!("NAIRA_PER_POINT deve ser maior que zero");
        }

        Ok(Self {
            port: parse(get("PORT"), "PORT", 3000)?,
            storage_backend,
            database_url,
            database_max_connections: parse(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            device_api_key: get("DEVICE_API_KEY"),
            rules,
        })
    }
}

// ---
// Estado compartilhado da aplicação
// ---
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RewardsStore>,
    pub services: Services,
    pub i18n_store: Arc<I18nStore>,
    pub jwt_secret: String,
    pub device_api_key: Option<String>,
}

impl AppState {
    // Conecta ao armazenamento escolhido e monta o gráfico de dependências.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn RewardsStore> = match config.storage_backend {
            StorageBackend::Postgres => {
                let database_url = config.database_url.as_deref().context("DATABASE_URL deve ser definida")?;
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgStore::new(db_pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("Usando armazenamento em memória: os dados somem ao reiniciar");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<dyn RewardsStore>, config: &Config) -> Self {
        let services = Services::new(store.clone(), config.rules.clone(), Arc::new(LogNotifier));
        Self {
            store,
            services,
            i18n_store: Arc::new(I18nStore::new()),
            jwt_secret: config.jwt_secret.clone(),
            device_api_key: config.device_api_key.clone(),
        }
    }
}
