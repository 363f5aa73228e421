use crate::mount::MountSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("image name must not be empty")]
    EmptyImage,
    #[error("container name must not be empty")]
    EmptyContainer,
    #[error("mount target '{0}' is not an absolute container path")]
    RelativeMountTarget(String),
}

/// Full sandbox description: what image to build, what to call the
/// container, and which host directories to bind into it.
///
/// Constructed once at startup and passed by reference into the reconciler;
/// there is no process-wide configuration singleton.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Image tag built from `build_context`.
    #[serde(default = "default_image")]
    pub image: String,
    /// Name of the sandbox container.
    #[serde(default = "default_container")]
    pub container: String,
    /// Hostname set inside the container.
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Run the container with --privileged.
    #[serde(default)]
    pub privileged: bool,
    /// Directory holding the Containerfile; consumed opaquely by the
    /// image build.
    #[serde(default = "default_build_context")]
    pub build_context: PathBuf,
    /// In-container command executed in one-shot (auto) mode.
    #[serde(default)]
    pub build_command: Option<String>,
    #[serde(default = "default_mounts")]
    pub mounts: Vec<MountSpec>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            container: default_container(),
            hostname: default_hostname(),
            privileged: false,
            build_context: default_build_context(),
            build_command: None,
            mounts: default_mounts(),
        }
    }
}

impl SandboxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.is_empty() {
            return Err(ConfigError::EmptyImage);
        }
        if self.container.is_empty() {
            return Err(ConfigError::EmptyContainer);
        }
        for mount in &self.mounts {
            if !mount.target.starts_with('/') {
                return Err(ConfigError::RelativeMountTarget(mount.target.clone()));
            }
        }
        Ok(())
    }

    /// Mounts that request SELinux relabeling of their source tree.
    pub fn labeled_mounts(&self) -> impl Iterator<Item = &MountSpec> {
        self.mounts.iter().filter(|m| m.selinux_label)
    }
}

fn default_image() -> String {
    "rpm_build_env:f38".to_owned()
}

fn default_container() -> String {
    "rpm_builder_f38".to_owned()
}

fn default_hostname() -> String {
    "rpm_builder".to_owned()
}

fn default_build_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_mounts() -> Vec<MountSpec> {
    vec![
        MountSpec::new("rpmbuild", "/root/rpmbuild"),
        MountSpec::new("output_rpm", "/output_rpm"),
    ]
}

pub fn parse_config_str(input: &str) -> Result<SandboxConfig, ConfigError> {
    let config: SandboxConfig = toml::from_str(input)?;
    config.validate()?;
    Ok(config)
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<SandboxConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}
