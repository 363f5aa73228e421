use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Declarative bind-mount specification: a host/container path pair plus
/// labeling policy.
///
/// Built once at configuration time and immutable afterwards. Path existence
/// is deliberately not validated here; a missing source only matters at run
/// time and podman reports it better than we could.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MountSpec {
    /// Host directory to bind into the container.
    pub source: PathBuf,
    /// Absolute path inside the container.
    pub target: String,
    #[serde(default)]
    pub read_only: bool,
    /// Apply the container file context to the source tree before running.
    /// Set to false for sources that already carry a fixed label, e.g. an
    /// NFS mount labeled nfs_t.
    #[serde(default = "default_true")]
    pub selinux_label: bool,
    /// Relabel the whole source tree rather than just the top-level path.
    #[serde(default = "default_true")]
    pub selinux_recursive: bool,
}

fn default_true() -> bool {
    true
}

impl MountSpec {
    /// New mount with the default policy: read-write, labeled recursively.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
            selinux_label: true,
            selinux_recursive: true,
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_selinux_label(mut self, label: bool) -> Self {
        self.selinux_label = label;
        self
    }

    pub fn with_selinux_recursive(mut self, recursive: bool) -> Self {
        self.selinux_recursive = recursive;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Render the podman `-v` volume argument: `source:target[:ro]`.
    pub fn volume_arg(&self) -> String {
        let option = if self.read_only { ":ro" } else { "" };
        format!("{}:{}{}", self.source.display(), self.target, option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favor_recursive_labeling() {
        let m = MountSpec::new("/srv/rpmbuild", "/root/rpmbuild");
        assert!(!m.read_only);
        assert!(m.selinux_label);
        assert!(m.selinux_recursive);
    }

    #[test]
    fn overrides_apply() {
        let m = MountSpec::new("/mnt/nfs/src", "/src")
            .with_read_only(true)
            .with_selinux_label(false);
        assert!(m.read_only);
        assert!(!m.selinux_label);
        assert!(m.selinux_recursive);
    }

    #[test]
    fn volume_arg_read_write() {
        let m = MountSpec::new("/srv/out", "/output_rpm");
        assert_eq!(m.volume_arg(), "/srv/out:/output_rpm");
    }

    #[test]
    fn volume_arg_read_only() {
        let m = MountSpec::new("/srv/specs", "/specs").with_read_only(true);
        assert_eq!(m.volume_arg(), "/srv/specs:/specs:ro");
    }
}
