use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::EventId;

/// Fixed `policy_mode` form field sent with every scan upload.
pub const SCAN_POLICY_MODE: &str = "REDACT_CLOUD";

/// `POST /upload_scan` success body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub original_snippet: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub safe_output: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub privacy_action: String,
}

/// `GET /stats` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_requests: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub blocked_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub sovereign_count: u64,
    #[serde(default, deserialize_with = "lenient_count_map")]
    pub risk_distribution: BTreeMap<String, u64>,
}

impl TrafficStats {
    /// Count recorded under `level`, matching keys case-insensitively.
    pub fn risk_count(&self, level: &str) -> u64 {
        self.risk_distribution
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(level))
            .fold(0u64, |total, (_, count)| total.saturating_add(*count))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(default, deserialize_with = "lenient_event_id")]
    pub event_id: EventId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp_utc: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub policy_action: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub routing_decision: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub detected_risk_level: String,
}

/// `GET /logs` body. Entries keep the order the server sent them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsResponse {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub logs: Vec<AuditLogEntry>,
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn value_to_count(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v > 0.0).map(|v| v as u64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

/// Strings that tolerate `null` and non-string JSON values.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value).unwrap_or_default())
}

fn lenient_event_id<'de, D>(deserializer: D) -> Result<EventId, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(EventId)
}

pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value))
}

/// Non-negative counts; anything negative or non-numeric reads as 0.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_count(&value))
}

pub fn lenient_count_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .map(|(key, count)| {
            let count = value_to_count(&count);
            (key, count)
        })
        .collect())
}

/// Log rows; `null` or a non-array reads as empty and non-object rows are skipped.
pub fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<AuditLogEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(rows) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(rows
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|row| AuditLogEntry::deserialize(row).ok())
        .collect())
}
