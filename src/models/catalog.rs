use serde::{Deserialize, Serialize};

use super::wire;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub category_id: Option<String>,
    pub duration: i32,
    #[serde(default, deserialize_with = "wire::amount")]
    pub price: f64,
    #[serde(default = "default_true", alias = "isActive")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}
