use super::{print_outcome, EXIT_SUCCESS};
use console::Style;
use rpmbox_config::SandboxConfig;
use rpmbox_core::{CoreError, Reconciler};
use rpmbox_engine::ContainerEngine;

/// Default action: converge the sandbox to a usable state.
pub fn run<E: ContainerEngine>(
    reconciler: &Reconciler<'_, E>,
    config: &SandboxConfig,
    auto: bool,
) -> Result<u8, CoreError> {
    bring_up(reconciler, config, auto, auto)
}

/// Shared bring-up tail: optionally clear out the previous container
/// (one-shot mode always starts from a fresh container), make sure the
/// image exists, then converge the container.
///
/// Build output and the one-shot command stream straight to the terminal,
/// so this path prints plain status lines rather than spinners.
pub fn bring_up<E: ContainerEngine>(
    reconciler: &Reconciler<'_, E>,
    config: &SandboxConfig,
    auto: bool,
    pre_clean: bool,
) -> Result<u8, CoreError> {
    if pre_clean {
        let outcome = reconciler.ensure_container_stopped_removed(true)?;
        print_outcome("container", &outcome);
    }

    let outcome = reconciler.ensure_image_exists()?;
    print_outcome("image", &outcome);

    let outcome = reconciler.ensure_container_running(!auto)?;
    print_outcome("container", &outcome);

    if !auto {
        println!();
        println!("to log in to the container run:");
        let exec_hint = format!("  podman exec -it {} /bin/bash", config.container);
        println!("{}", Style::new().green().apply_to(exec_hint));
    }

    Ok(EXIT_SUCCESS)
}
