use serde::{Deserialize, Serialize};

use crate::protocol::lenient_opt_string;

/// Error payload the policy service attaches to failed (and occasionally
/// successful) responses: `{ "detail": .. }` or `{ "error": .. }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub detail: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub error: Option<String>,
}

impl ErrorBody {
    /// First non-empty message, preferring `detail`.
    pub fn message(&self) -> Option<&str> {
        [self.detail.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .find(|message| !message.is_empty())
    }

    /// Explicit `error` field, which marks a failure even on HTTP success.
    pub fn explicit_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}
