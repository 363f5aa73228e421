use super::{print_outcome, EXIT_SUCCESS};
use rpmbox_core::{CoreError, Reconciler};
use rpmbox_engine::ContainerEngine;

/// Stop the container if it is running; never removes it.
pub fn run<E: ContainerEngine>(reconciler: &Reconciler<'_, E>) -> Result<u8, CoreError> {
    let outcome = reconciler.ensure_container_stopped_removed(false)?;
    print_outcome("container", &outcome);
    Ok(EXIT_SUCCESS)
}
