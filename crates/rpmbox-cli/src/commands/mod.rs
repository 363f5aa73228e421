pub mod rebuild;
pub mod rerun;
pub mod restart;
pub mod rm_container;
pub mod rm_image;
pub mod stop;
pub mod up;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use rpmbox_core::{CoreError, Outcome};
use std::fmt;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ENGINE_MISSING: u8 = 1;
pub const EXIT_SOCKET: u8 = 2;
pub const EXIT_BUILD: u8 = 3;
pub const EXIT_LABEL: u8 = 4;
pub const EXIT_RUN: u8 = 5;
pub const EXIT_FAILURE: u8 = 6;

/// Map a convergence failure onto its exit code class so scripts can tell
/// apart why a run aborted.
pub fn exit_code_for(error: &CoreError) -> u8 {
    match error {
        CoreError::Build(_) => EXIT_BUILD,
        CoreError::Label(_) => EXIT_LABEL,
        CoreError::Run(_) => EXIT_RUN,
        CoreError::Engine(_) | CoreError::MissingBuildCommand | CoreError::Unconverged { .. } => {
            EXIT_FAILURE
        }
    }
}

pub fn colorize_status(status: &str) -> String {
    match status {
        "running" => Style::new().cyan().bold().apply_to(status).to_string(),
        "present" => Style::new().green().apply_to(status).to_string(),
        "stopped" => Style::new().yellow().apply_to(status).to_string(),
        "absent" => Style::new().dim().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

/// Render a convergence outcome as one status line.
pub fn print_outcome<S: fmt::Display + PartialEq>(kind: &str, outcome: &Outcome<S>) {
    let check = Style::new().green().apply_to("✓");
    let current = colorize_status(&outcome.current.to_string());
    if outcome.unchanged() {
        println!("{check} {kind} {}: {current}", outcome.resource);
    } else {
        println!(
            "{check} {kind} {}: {} -> {current}",
            outcome.resource, outcome.prior
        );
    }
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpmbox_engine::EngineError;

    fn engine_error() -> EngineError {
        EngineError::CommandFailed {
            command: "podman run".to_owned(),
            code: 5,
            detail: "boom".to_owned(),
        }
    }

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ENGINE_MISSING,
            EXIT_SOCKET,
            EXIT_BUILD,
            EXIT_LABEL,
            EXIT_RUN,
            EXIT_FAILURE,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn build_failures_exit_with_build_class() {
        assert_eq!(exit_code_for(&CoreError::Build(engine_error())), EXIT_BUILD);
    }

    #[test]
    fn run_failures_exit_with_run_class() {
        assert_eq!(exit_code_for(&CoreError::Run(engine_error())), EXIT_RUN);
    }

    #[test]
    fn generic_engine_failures_exit_with_failure_class() {
        assert_eq!(
            exit_code_for(&CoreError::Engine(engine_error())),
            EXIT_FAILURE
        );
        assert_eq!(
            exit_code_for(&CoreError::Unconverged {
                resource: "rpm_builder_f38".to_owned(),
                steps: 4,
            }),
            EXIT_FAILURE
        );
    }

    #[test]
    fn colorize_status_keeps_text() {
        for status in ["running", "present", "stopped", "absent", "weird"] {
            assert!(colorize_status(status).contains(status));
        }
    }

    #[test]
    fn print_outcome_handles_both_shapes() {
        let unchanged = Outcome {
            resource: "rpm_build_env:f38".to_owned(),
            prior: rpmbox_core::ImageStatus::Present,
            current: rpmbox_core::ImageStatus::Present,
        };
        let changed = Outcome {
            resource: "rpm_build_env:f38".to_owned(),
            prior: rpmbox_core::ImageStatus::Absent,
            current: rpmbox_core::ImageStatus::Present,
        };
        print_outcome("image", &unchanged);
        print_outcome("image", &changed);
    }

    #[test]
    fn spinner_helpers_do_not_panic() {
        let pb = spinner("working...");
        spin_ok(&pb, "done");
        let pb = spinner("working...");
        spin_fail(&pb, "failed");
    }
}
