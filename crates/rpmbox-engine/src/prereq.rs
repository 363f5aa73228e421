use std::process::Command;

/// Shown to the operator when podman is missing.
pub const PODMAN_INSTALL_HINT: &str = "dnf install podman";

/// Whether the podman package is present in the local rpm database.
///
/// Queries the package database rather than $PATH: the sandbox is driven
/// through the packaged podman + systemd socket unit, and a stray binary
/// without the unit would fail later in a more confusing way.
pub fn podman_installed() -> bool {
    Command::new("rpm")
        .args(["-q", "podman"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn podman_installed_does_not_panic() {
        // Result depends on the host; just exercise the query path.
        let _ = podman_installed();
    }

    #[test]
    fn install_hint_names_the_package() {
        assert!(PODMAN_INSTALL_HINT.contains("podman"));
    }
}
