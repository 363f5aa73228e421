use super::{print_outcome, EXIT_SUCCESS};
use rpmbox_core::{CoreError, Reconciler};
use rpmbox_engine::ContainerEngine;

/// Remove the image, and the container that would pin it, if they exist.
pub fn run<E: ContainerEngine>(reconciler: &Reconciler<'_, E>) -> Result<u8, CoreError> {
    let outcome = reconciler.ensure_container_stopped_removed(true)?;
    print_outcome("container", &outcome);

    let outcome = reconciler.ensure_image_removed()?;
    print_outcome("image", &outcome);

    Ok(EXIT_SUCCESS)
}
