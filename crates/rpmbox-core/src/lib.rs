//! Lifecycle reconciliation engine for rpmbox.
//!
//! This crate ties the config and engine layers together into the
//! `Reconciler` — idempotent convergence operations that inspect the actual
//! state of an image/container/mount-label set and drive it toward a desired
//! state. It also implements the SELinux label reconciler that keeps
//! bind-mount source trees labeled for container access.

pub mod labels;
pub mod reconcile;

pub use labels::{relabel_mounts, selinux_enabled, LabelError, CONTAINER_CONTEXT_TYPE};
pub use reconcile::{ImageStatus, Outcome, Reconciler, MAX_CONVERGE_STEPS};

use rpmbox_engine::EngineError;
use thiserror::Error;

/// Error taxonomy for convergence operations. The CLI maps each fatal class
/// onto its own exit code, so variants are split by failure class rather
/// than by mechanism.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Engine round trip failed outside the build/run classes below.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// Image build returned non-zero; nothing downstream can proceed.
    #[error("image build failed: {0}")]
    Build(#[source] EngineError),
    /// Mount-source relabeling failed; an unlabeled mount is a security
    /// precondition violation, not a warning.
    #[error("label error: {0}")]
    Label(#[from] LabelError),
    /// The one-shot command exited non-zero.
    #[error("one-shot run failed: {0}")]
    Run(#[source] EngineError),
    #[error("one-shot mode requires build_command in the config")]
    MissingBuildCommand,
    /// Engine state kept oscillating instead of monotonically improving.
    #[error("{resource} did not converge after {steps} corrective steps")]
    Unconverged { resource: String, steps: usize },
}
