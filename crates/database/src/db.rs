use crate::error::Error;
use models::materialize::StatusPolicy;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::str::FromStr;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const STATUS_POLICY_VAR: &str = "SESSION_STATUS_POLICY";

/// Settings for the allocation and attendance core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database_url: String,
    pub status_policy: StatusPolicy,
}

impl CoreConfig {
    /// Reads the configuration from the process environment, loading `.env`
    /// first when one exists
    pub fn from_env() -> Result<Self, Error> {
        // A missing .env file is normal outside development
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let database_url = lookup(DATABASE_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{DATABASE_URL_VAR} is not set")))?;

        let status_policy = match lookup(STATUS_POLICY_VAR) {
            Some(raw) => StatusPolicy::from_str(raw.trim()).map_err(|_| {
                Error::Config(format!(
                    "{STATUS_POLICY_VAR} must be `preserve` or `reset`, got `{raw}`"
                ))
            })?,
            None => StatusPolicy::default(),
        };

        Ok(Self {
            database_url,
            status_policy,
        })
    }
}

/// Creates a database connection
pub async fn create_connection(config: &CoreConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging_level(log::LevelFilter::Debug);

    Database::connect(options).await
}
