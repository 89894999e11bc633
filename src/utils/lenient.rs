//! Deserializers for form and webhook payloads, where numbers arrive as JSON
//! numbers, numeric strings (sometimes with a decimal comma) or not at all.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_f64(s),
        _ => None,
    }
}

pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn parse_f64(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix("mm").unwrap_or(trimmed).trim_end();
    let normalized = trimmed.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_u32(raw: &str) -> Option<u32> {
    parse_f64(raw).filter(|v| *v >= 0.0).map(|v| v.trunc() as u32)
}

pub fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value).unwrap_or(0.0))
}

pub fn de_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.trunc() as u32)
        .unwrap_or(0))
}

pub fn de_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    de_u32(deserializer).map(|q| q.max(1))
}

pub fn de_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_string(&value).unwrap_or_default())
}

pub fn de_option_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = de_string(deserializer)?;
    if value.is_empty() {
        Ok(crate::NONE_OPTION.to_string())
    } else {
        Ok(value)
    }
}

pub fn de_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(value_as_string).collect(),
        _ => Vec::new(),
    })
}

pub fn de_f64_list<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(value_as_f64).collect(),
        _ => Vec::new(),
    })
}

pub fn de_u32_list<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_f64_list(deserializer)?
        .into_iter()
        .filter(|v| *v >= 0.0)
        .map(|v| v.trunc() as u32)
        .collect())
}
