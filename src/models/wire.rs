//! Lenient field decoders for API payloads that send ids and amounts either
//! as JSON numbers or as strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_id(value).ok_or_else(|| serde::de::Error::custom("expected string or numeric id"))
}

pub fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_id))
}

pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => s
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s}"))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid amount: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::id")]
        id: String,
        #[serde(default, deserialize_with = "super::opt_id")]
        parent: Option<String>,
        #[serde(default, deserialize_with = "super::amount")]
        price: f64,
    }

    #[test]
    fn test_numeric_and_string_ids() {
        let p: Probe = serde_json::from_str(r#"{"id": 42, "parent": "7", "price": "35,50"}"#).unwrap();
        assert_eq!(p.id, "42");
        assert_eq!(p.parent.as_deref(), Some("7"));
        assert_eq!(p.price, 35.5);
    }

    #[test]
    fn test_missing_optional_fields() {
        let p: Probe = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert!(p.parent.is_none());
        assert_eq!(p.price, 0.0);
    }

    #[test]
    fn test_invalid_id() {
        assert!(serde_json::from_str::<Probe>(r#"{"id": true}"#).is_err());
    }
}
