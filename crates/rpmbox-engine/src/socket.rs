use crate::EngineError;
use std::process::Command;
use tracing::{debug, info};

/// Which systemd instance owns the podman control socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketScope {
    /// Rootful podman: system systemd, socket under /run/podman.
    Root,
    /// Rootless podman: user systemd, socket in the user runtime dir.
    User,
}

impl SocketScope {
    /// Scope for the current process, by effective uid.
    pub fn detect() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail.
        #[allow(unsafe_code)]
        let euid = unsafe { libc::geteuid() };
        if euid == 0 {
            Self::Root
        } else {
            Self::User
        }
    }

    /// Filesystem path of the podman control socket for this scope.
    pub fn socket_path(self) -> String {
        match self {
            Self::Root => "/run/podman/podman.sock".to_owned(),
            Self::User => {
                let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| {
                    // SAFETY: geteuid has no preconditions and cannot fail.
                    #[allow(unsafe_code)]
                    let euid = unsafe { libc::geteuid() };
                    format!("/run/user/{euid}")
                });
                format!("{runtime_dir}/podman/podman.sock")
            }
        }
    }

    fn systemctl(self) -> Command {
        let mut cmd = Command::new("systemctl");
        if self == Self::User {
            cmd.arg("--user");
        }
        cmd
    }

    fn render(self, action: &str) -> String {
        match self {
            Self::Root => format!("systemctl {action} podman.socket"),
            Self::User => format!("systemctl --user {action} podman.socket"),
        }
    }
}

fn socket_is_active(scope: SocketScope) -> Result<bool, EngineError> {
    let status = scope
        .systemctl()
        .args(["is-active", "--quiet", "podman.socket"])
        .status()?;
    Ok(status.success())
}

/// Make sure the podman control socket is accepting connections, starting
/// the systemd socket unit if necessary.
///
/// Failures carry the start command so the operator can retry it by hand.
pub fn ensure_socket_active(scope: SocketScope) -> Result<(), EngineError> {
    if socket_is_active(scope)? {
        debug!("podman.socket already active");
        return Ok(());
    }

    let command = scope.render("start");
    info!("starting podman.socket");
    debug!("running: {command}");
    let output = scope.systemctl().args(["start", "podman.socket"]).output()?;
    if !output.status.success() {
        return Err(EngineError::SocketStart {
            command,
            detail: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    if socket_is_active(scope)? {
        Ok(())
    } else {
        Err(EngineError::SocketStart {
            command,
            detail: "podman.socket is still inactive after start".to_owned(),
        })
    }
}
