//! View-lifetime state shared by every panel: the UTC header clock and the theme.
//!
//! A session is mounted once when the console view comes up and must be
//! unmounted when it goes away; unmounting (or dropping) stops the clock task.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

use crate::types::Theme;

pub const CLOCK_INTERVAL: Duration = Duration::from_secs(1);

struct HeaderClock {
    time: watch::Receiver<String>,
    task: JoinHandle<()>,
}

pub struct ConsoleSession {
    clock: Option<HeaderClock>,
    theme: Theme,
}

pub fn format_clock(now: DateTime<Utc>) -> String {
    now.format("%H:%M:%S").to_string()
}

impl ConsoleSession {
    /// Starts the repeating clock. Must be called from within a tokio runtime.
    pub fn mount(interval: Duration, theme: Theme) -> Self {
        let (tx, time) = watch::channel(format_clock(Utc::now()));
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(format_clock(Utc::now())).is_err() {
                    break;
                }
            }
        });
        info!(interval_ms = interval.as_millis() as u64, "console session mounted");
        Self {
            clock: Some(HeaderClock { time, task }),
            theme,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.clock.is_some()
    }

    /// Latest `HH:MM:SS` tick, or `None` once unmounted.
    pub fn clock_time(&self) -> Option<String> {
        self.clock.as_ref().map(|clock| clock.time.borrow().clone())
    }

    pub fn clock_watch(&self) -> Option<watch::Receiver<String>> {
        self.clock.as_ref().map(|clock| clock.time.clone())
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        debug!(theme = ?self.theme, "theme toggled");
        self.theme
    }

    /// Stops the clock and waits for its task to finish.
    pub async fn unmount(&mut self) {
        let Some(clock) = self.clock.take() else {
            return;
        };
        clock.task.abort();
        let _ = clock.task.await;
        info!("console session unmounted");
    }
}

impl Drop for ConsoleSession {
    fn drop(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.task.abort();
        }
    }
}
