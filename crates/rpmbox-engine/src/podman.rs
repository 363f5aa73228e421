use crate::engine::{ContainerEngine, ContainerStatus, ImageRef, RunMode, RunRequest};
use crate::socket::SocketScope;
use crate::EngineError;
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Podman-backed engine client.
///
/// Structured queries go through the control socket (`--url`), so they talk
/// to the same service whose activation is checked at startup. Build and
/// one-shot run invoke podman directly with inherited stdio instead: both
/// are long-running and the operator needs to see output as it happens.
pub struct PodmanEngine {
    scope: SocketScope,
}

impl PodmanEngine {
    pub fn new(scope: SocketScope) -> Self {
        Self { scope }
    }

    /// Engine for the current process, rootful or rootless by effective uid.
    pub fn detect() -> Self {
        Self::new(SocketScope::detect())
    }

    fn query(&self, args: Vec<String>) -> Result<Output, EngineError> {
        let mut full = vec![
            "--url".to_owned(),
            format!("unix://{}", self.scope.socket_path()),
        ];
        full.extend(args);
        let command = render_command("podman", &full);
        debug!("running: {command}");
        let output = Command::new("podman").args(&full).output()?;
        if output.status.success() {
            return Ok(output);
        }
        Err(command_error(
            command,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        ))
    }

    /// Spawn podman with inherited stdio so output reaches the terminal
    /// live. Used for image builds and one-shot runs.
    fn stream(args: Vec<String>) -> Result<(), EngineError> {
        let command = render_command("podman", &args);
        debug!("running (streaming): {command}");
        let status = Command::new("podman")
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        if status.success() {
            return Ok(());
        }
        Err(command_error(
            command,
            status.code(),
            "see output above".to_owned(),
        ))
    }
}

fn command_error(command: String, code: Option<i32>, detail: String) -> EngineError {
    match code {
        Some(code) => EngineError::CommandFailed {
            command,
            code,
            detail,
        },
        None => EngineError::Interrupted { command },
    }
}

pub(crate) fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

pub(crate) fn build_args(context: &Path, tag: &str) -> Vec<String> {
    vec![
        "build".to_owned(),
        "--squash".to_owned(),
        "-t".to_owned(),
        tag.to_owned(),
        context.display().to_string(),
    ]
}

pub(crate) fn run_args(request: &RunRequest<'_>) -> Vec<String> {
    let mut args = vec!["run".to_owned()];
    match request.mode {
        RunMode::Detached => {
            args.push("-d".to_owned());
            args.push("-it".to_owned());
        }
        RunMode::OneShot { .. } => {
            args.push("-it".to_owned());
            args.push("--rm".to_owned());
        }
    }
    if request.privileged {
        args.push("--privileged".to_owned());
    }
    for mount in request.mounts {
        args.push("-v".to_owned());
        args.push(mount.volume_arg());
    }
    args.push("-h".to_owned());
    args.push(request.hostname.to_owned());
    args.push("--name".to_owned());
    args.push(request.name.to_owned());
    args.push(request.image.to_owned());
    if let RunMode::OneShot { command } = request.mode {
        args.push(command.to_owned());
    }
    args
}

#[derive(Debug, Deserialize)]
struct PsEntry {
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "State", default)]
    state: String,
}

/// Resolve a container's status from `podman ps --all --format json` output.
/// The name filter podman applies is a regex over substrings, so the listing
/// is matched against the exact name here.
pub(crate) fn status_from_ps_json(
    raw: &str,
    name: &str,
) -> Result<ContainerStatus, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(ContainerStatus::Absent);
    }
    let entries: Vec<PsEntry> = serde_json::from_str(trimmed)?;
    Ok(entries
        .iter()
        .find(|e| e.names.iter().any(|n| n == name))
        .map_or(ContainerStatus::Absent, |e| {
            ContainerStatus::from_engine_state(&e.state)
        }))
}

pub(crate) fn images_from_json(raw: &str) -> Result<Vec<ImageRef>, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

impl ContainerEngine for PodmanEngine {
    fn name(&self) -> &str {
        "podman"
    }

    fn list_images(&self, reference: &str) -> Result<Vec<ImageRef>, EngineError> {
        let args = vec![
            "images".to_owned(),
            "--format".to_owned(),
            "json".to_owned(),
            "--filter".to_owned(),
            format!("reference={reference}"),
        ];
        let command = render_command("podman", &args);
        let output = self.query(args)?;
        images_from_json(&String::from_utf8_lossy(&output.stdout))
            .map_err(|source| EngineError::InvalidOutput { command, source })
    }

    fn remove_image(&self, reference: &str) -> Result<(), EngineError> {
        self.query(vec!["rmi".to_owned(), reference.to_owned()])?;
        Ok(())
    }

    fn build_image(&self, context: &Path, tag: &str) -> Result<(), EngineError> {
        Self::stream(build_args(context, tag))
    }

    fn container_status(&self, name: &str) -> Result<ContainerStatus, EngineError> {
        let args = vec![
            "ps".to_owned(),
            "--all".to_owned(),
            "--format".to_owned(),
            "json".to_owned(),
            "--filter".to_owned(),
            format!("name=^{name}$"),
        ];
        let command = render_command("podman", &args);
        let output = self.query(args)?;
        status_from_ps_json(&String::from_utf8_lossy(&output.stdout), name)
            .map_err(|source| EngineError::InvalidOutput { command, source })
    }

    fn start_container(&self, name: &str) -> Result<(), EngineError> {
        self.query(vec!["start".to_owned(), name.to_owned()])?;
        Ok(())
    }

    fn stop_container(&self, name: &str) -> Result<(), EngineError> {
        self.query(vec!["stop".to_owned(), name.to_owned()])?;
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<(), EngineError> {
        self.query(vec!["rm".to_owned(), name.to_owned()])?;
        Ok(())
    }

    fn run_container(&self, request: &RunRequest<'_>) -> Result<(), EngineError> {
        match request.mode {
            // Detached creation is a structured call over the socket; the
            // container id on stdout is not interesting.
            RunMode::Detached => {
                self.query(run_args(request))?;
                Ok(())
            }
            RunMode::OneShot { .. } => Self::stream(run_args(request)),
        }
    }
}
