use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_logs_panel, load_stats_panel,
    metrics::{MetricsBar, PanelState},
    ConsoleBackend, ConsoleSession, DocumentFile, PolicyClient, RedactionCounter,
    SubmissionWorkflow, Theme, WorkflowEvent,
};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Settings};

const COUNTER_SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "console", about = "Monitoring console for the document sanitization pipeline")]
struct Args {
    /// Policy service base URL; overrides the config file and environment.
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long, env = "CONSOLE_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    light: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Upload a document for scanning and show the routing decision.
    Scan { file: PathBuf },
    /// Show the traffic analysis panel.
    Stats,
    /// Show the audit log.
    Logs,
    /// Metrics bar, traffic analysis and audit log together.
    Dashboard,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?.with_overrides(args.backend_url);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let backend: Arc<dyn ConsoleBackend> = Arc::new(PolicyClient::new(&settings.backend_url)?);
    info!(backend = %settings.backend_url, "console starting");

    let theme = if args.light { Theme::Light } else { Theme::Dark };
    let mut session = ConsoleSession::mount(settings.clock_interval(), theme);
    println!("{}", render::header(session.clock_time().as_deref(), session.theme()));

    let outcome = match args.command.unwrap_or(Command::Dashboard) {
        Command::Scan { file } => scan(backend, &settings, file).await,
        Command::Stats => {
            let stats = load_stats_panel(backend.as_ref()).await;
            print!("{}", render::traffic_panel(&stats));
            Ok(())
        }
        Command::Logs => {
            let logs = load_logs_panel(backend.as_ref()).await;
            print!("{}", render::logs_panel(&logs));
            Ok(())
        }
        Command::Dashboard => {
            let (stats, logs) = futures::join!(
                load_stats_panel(backend.as_ref()),
                load_logs_panel(backend.as_ref())
            );
            let bar = MetricsBar::new(settings.initial_redacted_count, &stats);
            println!("{}", render::metrics_bar(&bar));
            println!();
            print!("{}", render::traffic_panel(&stats));
            println!();
            print!("{}", render::logs_panel(&logs));
            Ok(())
        }
    };

    session.unmount().await;
    outcome
}

async fn scan(backend: Arc<dyn ConsoleBackend>, settings: &Settings, file: PathBuf) -> Result<()> {
    let document = DocumentFile::from_path(&file).await?;

    let mut workflow = SubmissionWorkflow::new(backend);
    let mut events = workflow.subscribe();
    let counter = RedactionCounter::spawn(settings.initial_redacted_count, workflow.subscribe());

    workflow.submit(document);
    print!("{}", render::submission(workflow.state()));
    workflow.settle().await;

    let mut expected = settings.initial_redacted_count;
    let mut failure = None;
    loop {
        match events.try_recv() {
            Ok(WorkflowEvent::ScanCompleted {
                redaction_delta, ..
            }) => expected += redaction_delta,
            Ok(WorkflowEvent::ScanFailed(notification)) => failure = Some(notification),
            Ok(WorkflowEvent::PhaseChanged(_)) => {}
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "missed workflow events");
            }
            Err(_) => break,
        }
    }

    let mut total = counter.watch();
    if tokio::time::timeout(COUNTER_SETTLE_TIMEOUT, total.wait_for(|value| *value >= expected))
        .await
        .is_err()
    {
        warn!(expected, "redaction counter did not catch up");
    }

    if let Some(notification) = failure {
        return Err(anyhow!(render::notification(&notification)));
    }

    let bar = MetricsBar::new(counter.current(), &PanelState::Loading);
    println!();
    print!("{}", render::submission(workflow.state()));
    println!();
    println!("{}", render::metrics_bar(&bar));
    Ok(())
}
