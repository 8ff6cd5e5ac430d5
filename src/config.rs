use anyhow::Context;
use serde::Deserialize;

use crate::auth::password::hash_password;

/// Credentials for the single admin identity. Only the argon2 hash is held
/// in memory.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_dir: String,
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into());
        let email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@planora.events".into());
        let password_hash = match std::env::var("ADMIN_PASSWORD_HASH") {
            Ok(hash) => hash,
            Err(_) => {
                let plain = std::env::var("ADMIN_PASSWORD")
                    .context("either ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be set")?;
                hash_password(&plain)?
            }
        };
        Ok(Self {
            data_dir,
            admin: AdminConfig {
                email,
                password_hash,
            },
        })
    }
}
