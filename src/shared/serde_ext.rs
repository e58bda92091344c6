use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn scalar_text<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(Some(raw)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(E::custom(format!(
            "expected a string or number, got `{other}`"
        ))),
    }
}

/// Accepts `"172"` and `172` alike; step scripts are not consistent about ids.
pub fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value) => scalar_text(value),
        None => Ok(None),
    }
}
