use anyhow::Context;
use orbit_contracts::{AppError, AppResult, ResultExt};
use std::path::PathBuf;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub path: String,
    pub ide_id: String,
    pub target_file: Option<String>,
}

impl LaunchRequest {
    /// Path handed to the IDE: the target file inside the project when given.
    pub fn open_path(&self) -> PathBuf {
        let root = PathBuf::from(&self.path);
        match self
            .target_file
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(file) => root.join(file),
            None => root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

pub fn resolve_ide_executable(ide_id: &str) -> &str {
    match ide_id {
        "vscode" => "code",
        "cursor" => "cursor",
        "intellijidea" => "idea",
        "webstorm" => "webstorm",
        "pycharm" => "pycharm",
        "visualstudio" => "devenv",
        other => other,
    }
}

pub fn build_launch_command(request: &LaunchRequest) -> AppResult<LaunchCommand> {
    let ide_id = request.ide_id.trim();
    if request.path.trim().is_empty() || ide_id.is_empty() {
        return Err(AppError::new(
            "project_launch_invalid_input",
            "Project path and IDE are required",
        )
        .with_context("path", request.path.clone())
        .with_context("ideId", request.ide_id.clone()));
    }

    let executable = resolve_ide_executable(ide_id).to_string();
    let open_path = request.open_path().to_string_lossy().to_string();

    // Windows IDE launchers are usually .cmd shims that only resolve through cmd.
    if cfg!(target_os = "windows") {
        Ok(LaunchCommand {
            program: "cmd".to_string(),
            args: vec!["/C".to_string(), executable, open_path],
        })
    } else {
        Ok(LaunchCommand {
            program: executable,
            args: vec![open_path],
        })
    }
}

/// Spawns the IDE without waiting for it to exit.
pub fn launch_project(request: &LaunchRequest) -> AppResult<()> {
    let command = build_launch_command(request)?;

    let child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {}", command.program))
        .with_code("project_launch_failed", "Failed to open project")
        .with_ctx("ideId", request.ide_id.clone())
        .with_ctx("path", request.path.clone())?;

    tracing::info!(
        event = "project_launched",
        ide_id = request.ide_id.as_str(),
        program = command.program.as_str(),
        pid = child.id()
    );
    Ok(())
}

#[cfg(test)]
#[path = "../tests/discovery/launch_tests.rs"]
mod tests;
