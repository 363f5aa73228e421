//! Podman client facade for rpmbox.
//!
//! This crate implements the engine layer: the `ContainerEngine` trait with
//! image/container CRUD plus streaming build and run operations, the
//! `PodmanEngine` implementation driving the podman CLI (structured queries
//! over the control socket, direct invocation where live output matters),
//! systemd socket activation, rpm package-database prerequisite checking,
//! and an in-memory `MockEngine` for convergence tests.

pub mod engine;
pub mod mock;
pub mod podman;
pub mod prereq;
pub mod socket;

pub use engine::{ContainerEngine, ContainerStatus, ImageRef, RunMode, RunRequest};
pub use mock::MockEngine;
pub use podman::PodmanEngine;
pub use prereq::{podman_installed, PODMAN_INSTALL_HINT};
pub use socket::{ensure_socket_active, SocketScope};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start podman.socket (run manually: {command}): {detail}")]
    SocketStart { command: String, detail: String },
    #[error("command '{command}' exited with code {code}: {detail}")]
    CommandFailed {
        command: String,
        code: i32,
        detail: String,
    },
    #[error("command '{command}' was killed by a signal")]
    Interrupted { command: String },
    #[error("failed to parse output of '{command}': {source}")]
    InvalidOutput {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}
