//! Display formatting for the audit-log table.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use shared::{domain::EventId, protocol::AuditLogEntry};

use crate::metrics::PanelState;

/// Placeholder rendered for routing decisions the console does not recognise.
pub const UNKNOWN_DESTINATION: &str = "—";

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Local,
    Cloud,
    Unknown,
}

impl Destination {
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Cloud => "Cloud",
            Self::Unknown => UNKNOWN_DESTINATION,
        }
    }
}

/// Visual severity of a row's risk badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Neutral,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLogEntry {
    pub event_id: EventId,
    pub timestamp: String,
    pub user_role: String,
    pub policy_action: String,
    pub destination: Destination,
    pub risk_level: String,
    pub risk_tier: RiskTier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogView {
    pub entries: Vec<FormattedLogEntry>,
}

impl AuditLogView {
    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

pub type LogsPanel = PanelState<AuditLogView>;

/// Renders `raw` as `DD/MM/YYYY HH:MM:SS` in UTC. Timestamps without an
/// offset are taken as UTC; anything unparseable is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    parse_instant(raw.trim())
        .map(|instant| instant.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn destination(routing_decision: &str) -> Destination {
    match routing_decision.to_ascii_uppercase().as_str() {
        "SAFE_MODE" | "LOCAL" => Destination::Local,
        "CLOUD_LLM" => Destination::Cloud,
        _ => Destination::Unknown,
    }
}

pub fn risk_tier(level: &str) -> RiskTier {
    match level.to_ascii_uppercase().as_str() {
        "CRITICAL" => RiskTier::Critical,
        "HIGH" | "MEDIUM" => RiskTier::Warning,
        _ => RiskTier::Neutral,
    }
}

pub fn format_entry(entry: &AuditLogEntry) -> FormattedLogEntry {
    FormattedLogEntry {
        event_id: entry.event_id.clone(),
        timestamp: format_timestamp(&entry.timestamp_utc),
        user_role: entry.user_role.clone(),
        policy_action: entry.policy_action.clone(),
        destination: destination(&entry.routing_decision),
        risk_level: entry.detected_risk_level.clone(),
        risk_tier: risk_tier(&entry.detected_risk_level),
    }
}

/// Formats every row, keeping the server's order.
pub fn build_view(entries: &[AuditLogEntry]) -> AuditLogView {
    AuditLogView {
        entries: entries.iter().map(format_entry).collect(),
    }
}
