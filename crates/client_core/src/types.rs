use serde::{Deserialize, Serialize};
use shared::{domain::RouteDecision, protocol::ScanResponse};

use crate::{error::ScanError, routing};

/// Sanitized output of one scan, with the destination derived from its action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub original_snippet: String,
    pub safe_output: String,
    pub privacy_action: String,
    pub route: RouteDecision,
}

impl From<ScanResponse> for ScanResult {
    fn from(response: ScanResponse) -> Self {
        let route = routing::classify(&response.privacy_action);
        Self {
            original_snippet: response.original_snippet,
            safe_output: response.safe_output,
            privacy_action: response.privacy_action,
            route,
        }
    }
}

/// User-facing toast raised by a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn scan_failed(error: &ScanError) -> Self {
        Self {
            title: "Scan failed".to_string(),
            description: error.user_message(),
        }
    }
}

/// Light/dark appearance of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}
