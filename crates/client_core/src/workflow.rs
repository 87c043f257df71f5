//! Submission state machine for a single operator document.
//!
//! [`transition`] is pure: it maps a state and an input to the next state and
//! the effects to run. [`SubmissionWorkflow`] owns the state, runs effects on
//! the tokio runtime and feeds their completions back in as inputs. Every
//! submit gets a fresh [`RequestToken`]; completions carrying any other token
//! are dropped, so superseded or cleared submissions never touch the state.

use std::{mem, sync::Arc};

use shared::domain::RouteDecision;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::{
    document::{DocumentFile, DocumentPreview},
    error::ScanError,
    types::{Notification, ScanResult},
    ConsoleBackend,
};

/// Redacted-entity increment announced per completed scan. The scan response
/// carries no entity count, so this is a display approximation.
pub const REDACTION_DELTA_PER_SCAN: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    /// Preview still decoding, scan request in flight.
    Reading {
        token: RequestToken,
        document: DocumentFile,
    },
    /// Preview ready, scan request in flight.
    Submitting {
        token: RequestToken,
        document: DocumentFile,
        preview: DocumentPreview,
    },
    Processed {
        token: RequestToken,
        file_name: String,
        preview: Option<DocumentPreview>,
        result: ScanResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionPhase {
    Idle,
    Reading,
    Submitting,
    Processed,
}

impl SubmissionState {
    pub fn phase(&self) -> SubmissionPhase {
        match self {
            Self::Idle => SubmissionPhase::Idle,
            Self::Reading { .. } => SubmissionPhase::Reading,
            Self::Submitting { .. } => SubmissionPhase::Submitting,
            Self::Processed { .. } => SubmissionPhase::Processed,
        }
    }

    pub fn token(&self) -> Option<RequestToken> {
        match self {
            Self::Idle => None,
            Self::Reading { token, .. }
            | Self::Submitting { token, .. }
            | Self::Processed { token, .. } => Some(*token),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Reading { .. } | Self::Submitting { .. })
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Reading { document, .. } | Self::Submitting { document, .. } => {
                Some(document.file_name())
            }
            Self::Processed { file_name, .. } => Some(file_name),
        }
    }

    pub fn preview(&self) -> Option<&DocumentPreview> {
        match self {
            Self::Submitting { preview, .. } => Some(preview),
            Self::Processed { preview, .. } => preview.as_ref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            Self::Processed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn route(&self) -> Option<RouteDecision> {
        self.result().map(|result| result.route)
    }
}

#[derive(Debug)]
pub enum WorkflowInput {
    Submit {
        token: RequestToken,
        document: DocumentFile,
    },
    PreviewReady {
        token: RequestToken,
        preview: DocumentPreview,
    },
    ScanSucceeded {
        token: RequestToken,
        result: ScanResult,
    },
    ScanFailed {
        token: RequestToken,
        error: ScanError,
    },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ReadPreview {
        token: RequestToken,
        document: DocumentFile,
    },
    SendScan {
        token: RequestToken,
        document: DocumentFile,
    },
    Notify(Notification),
    ScanCompleted {
        token: RequestToken,
        route: RouteDecision,
        redaction_delta: u64,
    },
}

/// Events published to subscribers of a [`SubmissionWorkflow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    PhaseChanged(SubmissionPhase),
    ScanCompleted {
        token: RequestToken,
        route: RouteDecision,
        redaction_delta: u64,
    },
    ScanFailed(Notification),
}

pub fn transition(state: SubmissionState, input: WorkflowInput) -> (SubmissionState, Vec<Effect>) {
    use SubmissionState::*;
    use WorkflowInput::*;

    match (state, input) {
        (_, Submit { token, document }) => (
            Reading {
                token,
                document: document.clone(),
            },
            vec![
                Effect::ReadPreview {
                    token,
                    document: document.clone(),
                },
                Effect::SendScan { token, document },
            ],
        ),
        (_, Clear) => (Idle, Vec::new()),
        (
            Reading { token, document },
            PreviewReady {
                token: completed,
                preview,
            },
        ) if completed == token => (
            Submitting {
                token,
                document,
                preview,
            },
            Vec::new(),
        ),
        (
            Processed {
                token,
                file_name,
                preview: None,
                result,
            },
            PreviewReady {
                token: completed,
                preview,
            },
        ) if completed == token => (
            Processed {
                token,
                file_name,
                preview: Some(preview),
                result,
            },
            Vec::new(),
        ),
        (
            Reading { token, document },
            ScanSucceeded {
                token: completed,
                result,
            },
        ) if completed == token => processed(token, document, None, result),
        (
            Submitting {
                token,
                document,
                preview,
            },
            ScanSucceeded {
                token: completed,
                result,
            },
        ) if completed == token => processed(token, document, Some(preview), result),
        (
            Reading { token, .. } | Submitting { token, .. },
            ScanFailed {
                token: completed,
                error,
            },
        ) if completed == token => (Idle, vec![Effect::Notify(Notification::scan_failed(&error))]),
        (state, input) => {
            debug!(
                phase = ?state.phase(),
                current = ?state.token(),
                input = input_name(&input),
                "workflow: ignoring stale input"
            );
            (state, Vec::new())
        }
    }
}

fn processed(
    token: RequestToken,
    document: DocumentFile,
    preview: Option<DocumentPreview>,
    result: ScanResult,
) -> (SubmissionState, Vec<Effect>) {
    let route = result.route;
    (
        SubmissionState::Processed {
            token,
            file_name: document.file_name().to_string(),
            preview,
            result,
        },
        vec![Effect::ScanCompleted {
            token,
            route,
            redaction_delta: REDACTION_DELTA_PER_SCAN,
        }],
    )
}

fn input_name(input: &WorkflowInput) -> &'static str {
    match input {
        WorkflowInput::Submit { .. } => "submit",
        WorkflowInput::PreviewReady { .. } => "preview_ready",
        WorkflowInput::ScanSucceeded { .. } => "scan_succeeded",
        WorkflowInput::ScanFailed { .. } => "scan_failed",
        WorkflowInput::Clear => "clear",
    }
}

pub struct SubmissionWorkflow {
    backend: Arc<dyn ConsoleBackend>,
    state: SubmissionState,
    last_token: u64,
    in_flight: usize,
    completions_tx: mpsc::UnboundedSender<WorkflowInput>,
    completions_rx: mpsc::UnboundedReceiver<WorkflowInput>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl SubmissionWorkflow {
    pub fn new(backend: Arc<dyn ConsoleBackend>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(256);
        Self {
            backend,
            state: SubmissionState::Idle,
            last_token: 0,
            in_flight: 0,
            completions_tx,
            completions_rx,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Number of spawned effects whose completion has not been applied yet.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Starts preview decoding and the scan upload for `document`. Must be
    /// called from within a tokio runtime.
    pub fn submit(&mut self, document: DocumentFile) -> RequestToken {
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        info!(
            token = token.0,
            file = document.file_name(),
            bytes = document.len(),
            "workflow: submitting document"
        );
        self.apply(WorkflowInput::Submit { token, document });
        token
    }

    pub fn clear(&mut self) {
        self.apply(WorkflowInput::Clear);
    }

    /// Waits for one outstanding effect and applies its completion. Returns
    /// `false` when nothing is outstanding.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(input) => {
                self.in_flight -= 1;
                self.apply(input);
                true
            }
            None => false,
        }
    }

    /// Applies completions until every spawned effect has resolved.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn apply(&mut self, input: WorkflowInput) {
        let previous = self.state.phase();
        let state = mem::replace(&mut self.state, SubmissionState::Idle);
        let (next, effects) = transition(state, input);
        self.state = next;

        let phase = self.state.phase();
        if phase != previous {
            debug!(from = ?previous, to = ?phase, "workflow: phase changed");
            let _ = self.events.send(WorkflowEvent::PhaseChanged(phase));
        }
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::ReadPreview { token, document } => {
                self.in_flight += 1;
                let tx = self.completions_tx.clone();
                tokio::spawn(async move {
                    let preview = document.preview();
                    let _ = tx.send(WorkflowInput::PreviewReady { token, preview });
                });
            }
            Effect::SendScan { token, document } => {
                self.in_flight += 1;
                let tx = self.completions_tx.clone();
                let backend = Arc::clone(&self.backend);
                tokio::spawn(async move {
                    // A panicking backend still has to resolve its completion.
                    let upload =
                        tokio::spawn(async move { backend.upload_scan(&document).await });
                    let input = match upload.await {
                        Ok(Ok(result)) => WorkflowInput::ScanSucceeded { token, result },
                        Ok(Err(error)) => WorkflowInput::ScanFailed { token, error },
                        Err(join_error) => {
                            warn!(token = token.0, "workflow: scan task aborted: {join_error}");
                            WorkflowInput::ScanFailed {
                                token,
                                error: ScanError::Request(format!("scan task aborted: {join_error}")),
                            }
                        }
                    };
                    let _ = tx.send(input);
                });
            }
            Effect::Notify(notification) => {
                warn!(
                    title = %notification.title,
                    description = %notification.description,
                    "workflow: scan failed"
                );
                let _ = self.events.send(WorkflowEvent::ScanFailed(notification));
            }
            Effect::ScanCompleted {
                token,
                route,
                redaction_delta,
            } => {
                info!(
                    token = token.0,
                    route = route.as_str(),
                    "workflow: scan processed"
                );
                let _ = self.events.send(WorkflowEvent::ScanCompleted {
                    token,
                    route,
                    redaction_delta,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
