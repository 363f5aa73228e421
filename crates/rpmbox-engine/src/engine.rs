use crate::EngineError;
use rpmbox_config::MountSpec;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Observed status of a named container.
///
/// Never cached by callers: the engine is external mutable state that can
/// change between any two calls (auto-remove, manual intervention), so every
/// convergence step re-queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Absent,
    Stopped,
    Running,
}

impl ContainerStatus {
    /// Map a podman state string ("running", "exited", "created", ...) onto
    /// the status of a container known to exist. Anything that is not
    /// running is startable, hence Stopped.
    pub fn from_engine_state(state: &str) -> Self {
        if state == "running" {
            Self::Running
        } else {
            Self::Stopped
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Stopped => "stopped",
            Self::Running => "running",
        };
        write!(f, "{s}")
    }
}

/// An image known to the engine, as reported by `podman images`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
}

/// How a container run should behave once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode<'a> {
    /// Detached with an allocated tty, left running for manual `exec` use.
    Detached,
    /// Foreground with `--rm`: run the command to completion, stream its
    /// output, propagate its exit code, let the engine reap the container.
    OneShot { command: &'a str },
}

/// Everything the engine needs to create and start a container.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub image: &'a str,
    pub name: &'a str,
    pub hostname: &'a str,
    pub privileged: bool,
    pub mounts: &'a [MountSpec],
    pub mode: RunMode<'a>,
}

/// Image/container CRUD against a container engine.
///
/// Implementations must report current truth on every query; convergence
/// logic in rpmbox-core relies on re-reading state rather than locking.
pub trait ContainerEngine {
    fn name(&self) -> &str;

    /// Images matching a reference (name or name:tag).
    fn list_images(&self, reference: &str) -> Result<Vec<ImageRef>, EngineError>;

    fn remove_image(&self, reference: &str) -> Result<(), EngineError>;

    /// Build an image from a context directory, streaming build output to
    /// the operator. Builds are long-running; buffering would hide progress.
    fn build_image(&self, context: &Path, tag: &str) -> Result<(), EngineError>;

    fn container_status(&self, name: &str) -> Result<ContainerStatus, EngineError>;

    fn start_container(&self, name: &str) -> Result<(), EngineError>;

    fn stop_container(&self, name: &str) -> Result<(), EngineError>;

    fn remove_container(&self, name: &str) -> Result<(), EngineError>;

    /// Create and start a container. One-shot requests stream the command's
    /// output and surface its non-zero exit as `EngineError::CommandFailed`.
    fn run_container(&self, request: &RunRequest<'_>) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_state_maps_to_running() {
        assert_eq!(
            ContainerStatus::from_engine_state("running"),
            ContainerStatus::Running
        );
    }

    #[test]
    fn non_running_states_map_to_stopped() {
        for state in ["exited", "created", "paused", "stopping"] {
            assert_eq!(
                ContainerStatus::from_engine_state(state),
                ContainerStatus::Stopped,
                "state {state} should read as stopped"
            );
        }
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(ContainerStatus::Absent.to_string(), "absent");
        assert_eq!(ContainerStatus::Stopped.to_string(), "stopped");
        assert_eq!(ContainerStatus::Running.to_string(), "running");
    }
}
