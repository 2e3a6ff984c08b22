use std::sync::Arc;

use config::Config;
use db::{DBService, DbErr};

/// Shared per-request state: the database pool plus the immutable process
/// configuration.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, DbErr> {
        let db = DBService::new(&config.database_url).await?;
        Ok(Self {
            db,
            config: Arc::new(config),
        })
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.config.token_ttl_days)
    }
}
