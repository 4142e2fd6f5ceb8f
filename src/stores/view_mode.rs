use std::fmt;
use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;

pub const VIEW_MODE_KEY: &str = "salonbook.view_mode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        Ok(queries::load_json(conn, VIEW_MODE_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        queries::save_json(conn, VIEW_MODE_KEY, self)
    }

    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Grid => f.write_str("grid"),
            ViewMode::List => f.write_str("list"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid" | "grade" => Ok(ViewMode::Grid),
            "list" | "lista" => Ok(ViewMode::List),
            other => Err(format!("unknown view mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_default_and_toggle() {
        let conn = db::init_db(":memory:").unwrap();
        assert_eq!(ViewMode::load(&conn).unwrap(), ViewMode::Grid);

        let mode = ViewMode::Grid.toggle();
        mode.save(&conn).unwrap();
        assert_eq!(ViewMode::load(&conn).unwrap(), ViewMode::List);
        assert_eq!(queries::get_item(&conn, VIEW_MODE_KEY).unwrap().as_deref(), Some("\"list\""));
    }

    #[test]
    fn test_parse() {
        assert_eq!("lista".parse::<ViewMode>().unwrap(), ViewMode::List);
        assert!("kanban".parse::<ViewMode>().is_err());
    }
}
