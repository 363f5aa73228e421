use super::{spin_fail, spin_ok, spinner, up};
use rpmbox_config::SandboxConfig;
use rpmbox_core::{CoreError, Reconciler};
use rpmbox_engine::ContainerEngine;

/// Remove the container and image if they exist, then build and run anew.
pub fn run<E: ContainerEngine>(
    reconciler: &Reconciler<'_, E>,
    config: &SandboxConfig,
    auto: bool,
) -> Result<u8, CoreError> {
    let pb = spinner("removing container...");
    match reconciler.ensure_container_stopped_removed(true) {
        Ok(outcome) => spin_ok(&pb, &format!("container {}: {}", outcome.resource, outcome.current)),
        Err(e) => {
            spin_fail(&pb, "container removal failed");
            return Err(e);
        }
    }

    let pb = spinner("removing image...");
    match reconciler.ensure_image_removed() {
        Ok(outcome) => spin_ok(&pb, &format!("image {}: {}", outcome.resource, outcome.current)),
        Err(e) => {
            spin_fail(&pb, "image removal failed");
            return Err(e);
        }
    }

    // The cleanup above already guaranteed a fresh container.
    up::bring_up(reconciler, config, auto, false)
}
