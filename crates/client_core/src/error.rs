use shared::error::ErrorBody;
use thiserror::Error;

/// Shown instead of the raw transport error when the policy service cannot be reached.
pub const BACKEND_UNREACHABLE_MESSAGE: &str =
    "Backend may not be running. Start the policy service and try again.";

const UNREACHABLE_SIGNATURES: &[&str] = &[
    "failed to connect",
    "connection refused",
    "connection reset",
    "error sending request",
    "dns",
    "timed out",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("scan request failed: {0}")]
    Request(String),
}

impl ScanError {
    pub fn from_transport(err: reqwest::Error) -> Self {
        let text = error_chain_text(&err);
        if err.is_connect() || err.is_timeout() || is_unreachable_message(&text) {
            Self::Unreachable(text)
        } else {
            Self::Request(text)
        }
    }

    pub fn from_status(status: u16, body: &ErrorBody) -> Self {
        let message = body
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed (status {status})"));
        Self::Status { status, message }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Text for the operator-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable(_) => BACKEND_UNREACHABLE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document '{file_name}' is empty")]
    Empty { file_name: String },
    #[error("failed to read document '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn is_unreachable_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    UNREACHABLE_SIGNATURES
        .iter()
        .any(|signature| lower.contains(signature))
}

/// Panel-facing text for a failed stats/logs fetch. Only transport failures
/// map to the unreachable message; server-supplied text is shown as sent.
pub fn describe_fetch_error(err: &anyhow::Error) -> String {
    let unreachable = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .any(|cause| {
            cause.is_connect()
                || cause.is_timeout()
                || is_unreachable_message(&error_chain_text(cause))
        });
    if unreachable {
        BACKEND_UNREACHABLE_MESSAGE.to_string()
    } else {
        format!("{err:#}")
    }
}

fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
