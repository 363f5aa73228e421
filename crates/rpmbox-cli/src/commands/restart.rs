use super::{spin_fail, spin_ok, spinner, up};
use rpmbox_config::SandboxConfig;
use rpmbox_core::{CoreError, Reconciler};
use rpmbox_engine::ContainerEngine;

/// Stop the container if it is running, then bring it up again.
pub fn run<E: ContainerEngine>(
    reconciler: &Reconciler<'_, E>,
    config: &SandboxConfig,
    auto: bool,
) -> Result<u8, CoreError> {
    let pb = spinner("stopping container...");
    match reconciler.ensure_container_stopped_removed(false) {
        Ok(outcome) => spin_ok(&pb, &format!("container {}: {}", outcome.resource, outcome.current)),
        Err(e) => {
            spin_fail(&pb, "container stop failed");
            return Err(e);
        }
    }

    up::bring_up(reconciler, config, auto, auto)
}
