use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

// ── Raw key/value ──

pub fn get_item(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM local_storage WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_item(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, datetime('now')) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

pub fn remove_item(conn: &Connection, key: &str) -> anyhow::Result<bool> {
    let affected = conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
    Ok(affected > 0)
}

pub fn remove_prefix(conn: &Connection, prefix: &str) -> anyhow::Result<usize> {
    let pattern = format!("{prefix}%");
    let affected = conn.execute(
        "DELETE FROM local_storage WHERE key LIKE ?1",
        params![pattern],
    )?;
    Ok(affected)
}

// ── JSON-encoded stores ──

/// Loads a JSON value. A corrupt entry is dropped and treated as missing.
pub fn load_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> anyhow::Result<Option<T>> {
    let Some(raw) = get_item(conn, key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable stored value");
            remove_item(conn, key)?;
            Ok(None)
        }
    }
}

pub fn save_json<T: Serialize>(conn: &Connection, key: &str, value: &T) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)?;
    set_item(conn, key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    #[test]
    fn test_set_and_get_item() {
        let conn = setup_db();
        set_item(&conn, "salonbook.auth.token", "abc").unwrap();
        assert_eq!(get_item(&conn, "salonbook.auth.token").unwrap().as_deref(), Some("abc"));

        set_item(&conn, "salonbook.auth.token", "def").unwrap();
        assert_eq!(get_item(&conn, "salonbook.auth.token").unwrap().as_deref(), Some("def"));
    }

    #[test]
    fn test_remove_item() {
        let conn = setup_db();
        set_item(&conn, "k", "v").unwrap();
        assert!(remove_item(&conn, "k").unwrap());
        assert!(!remove_item(&conn, "k").unwrap());
        assert!(get_item(&conn, "k").unwrap().is_none());
    }

    #[test]
    fn test_remove_prefix() {
        let conn = setup_db();
        set_item(&conn, "salonbook.auth.token", "t").unwrap();
        set_item(&conn, "salonbook.auth.tenant", "x").unwrap();
        set_item(&conn, "salonbook.cart", "[]").unwrap();

        assert_eq!(remove_prefix(&conn, "salonbook.auth.").unwrap(), 2);
        assert!(get_item(&conn, "salonbook.cart").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_json_is_discarded() {
        let conn = setup_db();
        set_item(&conn, "salonbook.cart", "{not json").unwrap();
        let loaded: Option<Vec<String>> = load_json(&conn, "salonbook.cart").unwrap();
        assert!(loaded.is_none());
        assert!(get_item(&conn, "salonbook.cart").unwrap().is_none());
    }
}
