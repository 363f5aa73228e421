use crate::labels::relabel_mounts;
use crate::CoreError;
use rpmbox_config::SandboxConfig;
use rpmbox_engine::{ContainerEngine, ContainerStatus, RunMode, RunRequest};
use std::fmt;
use tracing::{debug, info};

/// Upper bound on corrective-action-then-recheck cycles per operation.
///
/// Engine state improves monotonically under correct behavior (a started
/// container reads back running, a stopped auto-remove container reads back
/// absent), so the deepest legal chain is two corrective steps. Exceeding
/// this bound means the engine is oscillating and is reported as an error
/// rather than retried forever.
pub const MAX_CONVERGE_STEPS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Absent,
    Present,
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Present => "present",
        };
        write!(f, "{s}")
    }
}

/// Structured result of a convergence operation: which resource, what its
/// status was when the operation began, and what it is now. Rendering is
/// the caller's job; the core never prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<S> {
    pub resource: String,
    pub prior: S,
    pub current: S,
}

impl<S: PartialEq> Outcome<S> {
    /// True when the operation found the resource already converged.
    pub fn unchanged(&self) -> bool {
        self.prior == self.current
    }
}

/// The lifecycle reconciliation engine.
///
/// Each operation queries current engine state, takes the minimal
/// corrective action, and re-queries until the declared target status is
/// observed. State is never cached across decision points: the engine is
/// shared mutable state, and re-reading current truth is the substitute for
/// locking.
pub struct Reconciler<'a, E: ContainerEngine> {
    engine: &'a E,
    config: &'a SandboxConfig,
}

impl<'a, E: ContainerEngine> Reconciler<'a, E> {
    pub fn new(engine: &'a E, config: &'a SandboxConfig) -> Self {
        Self { engine, config }
    }

    fn image_status(&self) -> Result<ImageStatus, CoreError> {
        let images = self.engine.list_images(&self.config.image)?;
        Ok(if images.is_empty() {
            ImageStatus::Absent
        } else {
            ImageStatus::Present
        })
    }

    /// Converge the image to Present, building it from the configured
    /// context if necessary.
    pub fn ensure_image_exists(&self) -> Result<Outcome<ImageStatus>, CoreError> {
        let prior = self.image_status()?;
        if prior == ImageStatus::Present {
            return Ok(self.image_outcome(prior, prior));
        }

        info!("building image {}", self.config.image);
        self.engine
            .build_image(&self.config.build_context, &self.config.image)
            .map_err(CoreError::Build)?;
        Ok(self.image_outcome(prior, ImageStatus::Present))
    }

    /// Converge the image to Absent.
    pub fn ensure_image_removed(&self) -> Result<Outcome<ImageStatus>, CoreError> {
        let prior = self.image_status()?;
        if prior == ImageStatus::Absent {
            return Ok(self.image_outcome(prior, prior));
        }

        info!("removing image {}", self.config.image);
        self.engine.remove_image(&self.config.image)?;
        Ok(self.image_outcome(prior, ImageStatus::Absent))
    }

    /// Converge the container to Running (interactive) or execute the
    /// configured one-shot command (non-interactive).
    ///
    /// Interactive mode re-queries after creation to confirm the container
    /// reads back as running; the engine may briefly report a just-created
    /// container as not yet visible. One-shot mode returns as soon as the
    /// command completes: the run itself executed to completion and the
    /// container is expected to be gone, so the exit code is the only
    /// verdict that matters.
    pub fn ensure_container_running(
        &self,
        interactive: bool,
    ) -> Result<Outcome<ContainerStatus>, CoreError> {
        let name = &self.config.container;
        let prior = self.engine.container_status(name)?;
        let mut status = prior;

        for _ in 0..MAX_CONVERGE_STEPS {
            match status {
                ContainerStatus::Running => {
                    return Ok(self.container_outcome(prior, status));
                }
                ContainerStatus::Stopped => {
                    info!("starting container {name}");
                    self.engine.start_container(name)?;
                }
                ContainerStatus::Absent => {
                    relabel_mounts(&self.config.mounts)?;
                    if interactive {
                        info!("running container {name}");
                        self.engine
                            .run_container(&self.run_request(RunMode::Detached))?;
                    } else {
                        let command = self
                            .config
                            .build_command
                            .as_deref()
                            .ok_or(CoreError::MissingBuildCommand)?;
                        info!("running command {command} in container {name}");
                        self.engine
                            .run_container(&self.run_request(RunMode::OneShot { command }))
                            .map_err(CoreError::Run)?;
                        // The command ran to completion and --rm reaped the
                        // container; deliberately no post-run status check.
                        return Ok(self.container_outcome(prior, ContainerStatus::Absent));
                    }
                }
            }
            status = self.engine.container_status(name)?;
            debug!("container {name} now {status}");
        }

        Err(CoreError::Unconverged {
            resource: name.clone(),
            steps: MAX_CONVERGE_STEPS,
        })
    }

    /// Converge the container to Absent (`remove`) or merely not-running.
    ///
    /// Stopping a container created with auto-remove deletes it as a side
    /// effect, so the removal step only runs when a re-query still sees the
    /// container.
    pub fn ensure_container_stopped_removed(
        &self,
        remove: bool,
    ) -> Result<Outcome<ContainerStatus>, CoreError> {
        let name = &self.config.container;
        let prior = self.engine.container_status(name)?;
        let mut status = prior;

        for _ in 0..MAX_CONVERGE_STEPS {
            match status {
                ContainerStatus::Absent => {
                    return Ok(self.container_outcome(prior, status));
                }
                ContainerStatus::Running => {
                    info!("stopping container {name}");
                    self.engine.stop_container(name)?;
                    if !remove {
                        return Ok(self.container_outcome(prior, ContainerStatus::Stopped));
                    }
                }
                ContainerStatus::Stopped => {
                    if !remove {
                        return Ok(self.container_outcome(prior, status));
                    }
                    info!("removing container {name}");
                    self.engine.remove_container(name)?;
                    return Ok(self.container_outcome(prior, ContainerStatus::Absent));
                }
            }
            status = self.engine.container_status(name)?;
            debug!("container {name} now {status}");
        }

        Err(CoreError::Unconverged {
            resource: name.clone(),
            steps: MAX_CONVERGE_STEPS,
        })
    }

    fn run_request<'r>(&'r self, mode: RunMode<'r>) -> RunRequest<'r> {
        RunRequest {
            image: &self.config.image,
            name: &self.config.container,
            hostname: &self.config.hostname,
            privileged: self.config.privileged,
            mounts: &self.config.mounts,
            mode,
        }
    }

    fn image_outcome(&self, prior: ImageStatus, current: ImageStatus) -> Outcome<ImageStatus> {
        Outcome {
            resource: self.config.image.clone(),
            prior,
            current,
        }
    }

    fn container_outcome(
        &self,
        prior: ContainerStatus,
        current: ContainerStatus,
    ) -> Outcome<ContainerStatus> {
        Outcome {
            resource: self.config.container.clone(),
            prior,
            current,
        }
    }
}
