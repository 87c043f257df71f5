use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    error::ErrorBody,
    protocol::{AuditLogEntry, LogsResponse, ScanResponse, TrafficStats, SCAN_POLICY_MODE},
};
use tracing::{info, warn};
use url::Url;

pub mod audit_log;
pub mod counter;
pub mod document;
pub mod error;
pub mod metrics;
pub mod routing;
pub mod session;
pub mod types;
pub mod workflow;

pub use counter::RedactionCounter;
pub use document::{DocumentFile, DocumentPreview};
pub use error::{DocumentError, ScanError};
pub use session::ConsoleSession;
pub use types::{Notification, ScanResult, Theme};
pub use workflow::{SubmissionState, SubmissionWorkflow, WorkflowEvent};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// The three policy-service endpoints the console consumes.
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    async fn upload_scan(&self, document: &DocumentFile) -> Result<ScanResult, ScanError>;
    async fn fetch_stats(&self) -> Result<TrafficStats>;
    async fn fetch_logs(&self) -> Result<Vec<AuditLogEntry>>;
}

pub struct PolicyClient {
    http: Client,
    base_url: Url,
}

impl PolicyClient {
    pub fn new(backend_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(backend_url.trim())
            .with_context(|| format!("invalid backend url '{backend_url}'"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path '{path}'"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        decode_fetch_response(response).await
    }
}

/// Body of a scan response; malformed or non-object JSON reads as `{}`.
fn parse_json_object(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Default::default()),
    }
}

/// Applies the scan error taxonomy to a received response.
pub fn scan_result_from_response(status: u16, body: Value) -> Result<ScanResult, ScanError> {
    let error_body = ErrorBody::from_value(&body);
    if !(200..300).contains(&status) {
        return Err(ScanError::from_status(status, &error_body));
    }
    if let Some(message) = error_body.explicit_error() {
        return Err(ScanError::Rejected(message.to_string()));
    }
    let response: ScanResponse = serde_json::from_value(body).unwrap_or_default();
    Ok(ScanResult::from(response))
}

async fn decode_fetch_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await.context("failed to read response body")?;
    if !status.is_success() {
        let body = ErrorBody::from_value(&parse_json_object(&bytes));
        return Err(match body.message() {
            Some(message) => anyhow!("{message}"),
            None => anyhow!("request failed (status {})", status.as_u16()),
        });
    }
    serde_json::from_slice(&bytes).context("malformed response body")
}

#[async_trait]
impl ConsoleBackend for PolicyClient {
    async fn upload_scan(&self, document: &DocumentFile) -> Result<ScanResult, ScanError> {
        let url = self
            .endpoint("upload_scan")
            .map_err(|err| ScanError::Request(format!("{err:#}")))?;
        let part = Part::bytes(document.content().to_vec())
            .file_name(document.file_name().to_string())
            .mime_str(document.mime_type())
            .map_err(ScanError::from_transport)?;
        let form = Form::new()
            .part("file", part)
            .text("policy_mode", SCAN_POLICY_MODE);

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(ScanError::from_transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(ScanError::from_transport)?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "upload_scan returned error status");
        }
        let result = scan_result_from_response(status.as_u16(), parse_json_object(&bytes))?;
        info!(
            file = document.file_name(),
            action = %result.privacy_action,
            route = result.route.as_str(),
            "upload_scan completed"
        );
        Ok(result)
    }

    async fn fetch_stats(&self) -> Result<TrafficStats> {
        self.get_json("stats").await
    }

    async fn fetch_logs(&self) -> Result<Vec<AuditLogEntry>> {
        let response: LogsResponse = self.get_json("logs").await?;
        Ok(response.logs)
    }
}

pub async fn load_stats_panel(backend: &dyn ConsoleBackend) -> metrics::StatsPanel {
    let result = backend.fetch_stats().await;
    if let Err(err) = &result {
        warn!("stats fetch failed: {err:#}");
    }
    metrics::PanelState::from_fetch(result, |stats| metrics::summarize(&stats))
}

pub async fn load_logs_panel(backend: &dyn ConsoleBackend) -> audit_log::LogsPanel {
    let result = backend.fetch_logs().await;
    match &result {
        Ok(entries) => info!(entries = entries.len(), "audit log fetched"),
        Err(err) => warn!("audit log fetch failed: {err:#}"),
    }
    metrics::PanelState::from_fetch(result, |entries| audit_log::build_view(&entries))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
