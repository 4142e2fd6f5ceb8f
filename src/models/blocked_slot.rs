use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{datetime, wire};

/// A period a professional is unavailable. Shares the timeline with
/// appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSlot {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    #[serde(deserialize_with = "wire::id")]
    pub professional_id: String,
    #[serde(with = "datetime")]
    pub start_time: NaiveDateTime,
    #[serde(with = "datetime")]
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub reason: Option<String>,
}

impl BlockedSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}
