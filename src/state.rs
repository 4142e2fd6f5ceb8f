use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db;
use crate::services::api::http::HttpSalonApi;
use crate::services::api::SalonApi;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub api: Box<dyn SalonApi>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let conn = db::init_db(&config.storage_path)?;
        let api = HttpSalonApi::new(&config.api_url, Duration::from_secs(config.http_timeout_secs))?;
        api.set_tenant(config.tenant_id.clone());

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            api: Box::new(api),
        })
    }

    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
