#![deny(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infrastructure;
pub mod ports;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use app::{AppController, RuntimeOrchestrator};
use cli::Cli;
use commands::{Command, CommandOutcome};
use domain::RuntimeEvent;

/// Run the headless runtime until Ctrl-C, `exit` on stdin, or stdin closing.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let controller = AppController::new(&cli.controller_options())
        .context("Failed to initialize application")?;
    let orchestrator = controller.orchestrator().clone();

    let events = tokio::spawn(log_events(orchestrator.subscribe()));
    orchestrator.start().await;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
        result = read_commands(&orchestrator), if !cli.no_stdin => {
            result.context("Control input failed")?;
        }
    }

    orchestrator.stop().await;
    events.abort();
    info!("HoldSense shut down");
    Ok(())
}

/// Execute stdin commands until `exit` or end of input.
async fn read_commands(orchestrator: &RuntimeOrchestrator) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(commands::CommandParseError::Empty) => continue,
            Err(err) => {
                warn!(error = %err, "Ignoring control input");
                continue;
            }
        };

        if commands::execute(orchestrator, command, &mut stdout).await? == CommandOutcome::Exit {
            return Ok(());
        }
    }

    debug!("Control input closed");
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<RuntimeEvent>) {
    loop {
        match events.recv().await {
            Ok(RuntimeEvent::StatusChanged(status)) => info!(
                audio_active = status.audio_active,
                detection_enabled = status.detection_enabled,
                phone_detected = status.phone_detected,
                keybind_enabled = status.keybind_enabled,
                manual_override = status.manual_override.map(|o| o.as_str()),
                "Status changed"
            ),
            Ok(RuntimeEvent::Error(err)) => error!(kind = ?err.kind, "{}", err.message),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
