use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::workflow::WorkflowEvent;

/// Redacted-entity total shown in the metrics bar. Subscribes to workflow
/// events and adds the delta of every completed scan.
pub struct RedactionCounter {
    value: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl RedactionCounter {
    pub fn spawn(initial: u64, mut events: broadcast::Receiver<WorkflowEvent>) -> Self {
        let (tx, value) = watch::channel(initial);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(WorkflowEvent::ScanCompleted {
                        redaction_delta, ..
                    }) => {
                        tx.send_modify(|total| *total += redaction_delta);
                        debug!(total = *tx.borrow(), "redaction counter updated");
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "redaction counter lagged behind workflow events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { value, task }
    }

    pub fn current(&self) -> u64 {
        *self.value.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.value.clone()
    }
}

impl Drop for RedactionCounter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shared::domain::RouteDecision;

    use super::*;
    use crate::workflow::{RequestToken, SubmissionPhase};

    #[tokio::test]
    async fn adds_delta_for_each_completed_scan() {
        let (tx, rx) = broadcast::channel(16);
        let counter = RedactionCounter::spawn(142, rx);
        let mut watch = counter.watch();

        tx.send(WorkflowEvent::PhaseChanged(SubmissionPhase::Reading))
            .expect("send");
        tx.send(WorkflowEvent::ScanCompleted {
            token: RequestToken(1),
            route: RouteDecision::Local,
            redaction_delta: 5,
        })
        .expect("send");
        tx.send(WorkflowEvent::ScanCompleted {
            token: RequestToken(2),
            route: RouteDecision::Cloud,
            redaction_delta: 5,
        })
        .expect("send");

        tokio::time::timeout(Duration::from_secs(2), watch.wait_for(|total| *total == 152))
            .await
            .expect("counter update timed out")
            .expect("counter task alive");
        assert_eq!(counter.current(), 152);
    }

    #[tokio::test]
    async fn stops_when_event_stream_closes() {
        let (tx, rx) = broadcast::channel::<WorkflowEvent>(4);
        let counter = RedactionCounter::spawn(0, rx);
        let mut watch = counter.watch();
        drop(tx);

        let closed = tokio::time::timeout(Duration::from_secs(2), watch.changed())
            .await
            .expect("close timed out");
        assert!(closed.is_err());
        assert_eq!(counter.current(), 0);
    }
}
