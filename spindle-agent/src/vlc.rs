//! VLC preview command channel client: fetch pending commands
//! (fetch atomically flips them to `sent` on the coordinator), launch the
//! player, and report the result.

use std::path::Path;

use spindle_contracts::vlc::ReportVlcResultRequest;
use spindle_runtime::client::CoordinatorClient;
use spindle_model::VlcCommand;
use tokio::process::Command;
use tracing::{error, info};

use crate::error::{AgentError, Result};

/// Polls for pending preview commands for `agent_id` and runs each to
/// completion, reporting success/failure back to the coordinator.
pub async fn poll_and_run(coordinator: &CoordinatorClient, agent_id: &str, vlc_path: &Path) -> Result<()> {
    let commands = coordinator.vlc_commands(agent_id).await.map_err(AgentError::from)?.commands;
    for command in commands {
        run_one(coordinator, vlc_path, &command).await;
    }
    Ok(())
}

async fn run_one(coordinator: &CoordinatorClient, vlc_path: &Path, command: &VlcCommand) {
    let result = launch(vlc_path, &command.file_path, command.fullscreen).await;
    let req = match &result {
        Ok(()) => ReportVlcResultRequest { success: true, error: None },
        Err(err) => ReportVlcResultRequest { success: false, error: Some(err.to_string()) },
    };
    if let Err(err) = coordinator.report_vlc_result(command.id, &req).await {
        error!(command_id = %command.id, error = %err, "failed to report vlc result");
    }
}

async fn launch(vlc_path: &Path, file_path: &str, fullscreen: bool) -> std::result::Result<(), String> {
    if !vlc_path.exists() {
        return Err(format!("VLC not found at {}", vlc_path.display()));
    }
    if !Path::new(file_path).exists() {
        return Err(format!("file not found: {file_path}"));
    }

    let mut cmd = Command::new(vlc_path);
    if fullscreen {
        cmd.arg("--fullscreen");
    }
    cmd.arg(file_path);

    info!(file_path, fullscreen, "launching vlc preview");
    let status = cmd.status().await.map_err(|e| e.to_string())?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("vlc exited with {status}"))
    }
}
