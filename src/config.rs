use std::env;

use chrono::NaiveTime;

use crate::services::daily_schedule::GridConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: String,
    pub tenant_id: Option<String>,
    pub storage_path: String,
    pub salon_name: String,
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_minutes: u32,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("SALONBOOK_API_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            tenant_id: env::var("SALONBOOK_TENANT_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            storage_path: env::var("SALONBOOK_STORAGE")
                .unwrap_or_else(|_| "salonbook.db".to_string()),
            salon_name: env::var("SALONBOOK_SALON_NAME").unwrap_or_else(|_| "Salão".to_string()),
            open: env::var("SALONBOOK_OPEN")
                .ok()
                .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
                .unwrap_or_else(default_open),
            close: env::var("SALONBOOK_CLOSE")
                .ok()
                .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
                .unwrap_or_else(default_close),
            slot_minutes: env::var("SALONBOOK_SLOT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(30),
            http_timeout_secs: env::var("SALONBOOK_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
        }
    }

    pub fn grid(&self) -> GridConfig {
        GridConfig {
            open: self.open,
            close: self.close,
            slot_minutes: self.slot_minutes,
        }
    }
}

fn default_open() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_close() -> NaiveTime {
    NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN)
}
