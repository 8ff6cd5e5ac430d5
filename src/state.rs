use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::{FsStorage, MemStorage, Storage};
use crate::users::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn Storage>,
    pub users: UserStore,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(&config.data_dir).await?);
        Ok(Self::from_parts(config, storage))
    }

    pub fn from_parts(config: Arc<AppConfig>, storage: Arc<dyn Storage>) -> Self {
        let users = UserStore::new(storage.clone());
        Self {
            config,
            storage,
            users,
        }
    }

    /// In-memory state for unit tests. The admin password is "admin-secret".
    pub fn fake() -> Self {
        use crate::auth::password::hash_password;
        use crate::config::AdminConfig;

        let config = Arc::new(AppConfig {
            data_dir: "unused".into(),
            admin: AdminConfig {
                email: "admin@test.local".into(),
                password_hash: hash_password("admin-secret").expect("hash test password"),
            },
        });
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::default());
        Self::from_parts(config, storage)
    }
}
