//! Sandbox configuration for rpmbox.
//!
//! This crate defines the configuration layer: the `SandboxConfig` struct
//! parsed from a TOML config file (image/container naming, build context,
//! privilege flag, one-shot build command) and `MountSpec`, the declarative
//! bind-mount descriptor consumed by both the engine facade and the SELinux
//! label reconciler.

pub mod config;
pub mod mount;

pub use config::{parse_config_file, parse_config_str, ConfigError, SandboxConfig};
pub use mount::MountSpec;
