use crate::engine::{ContainerEngine, ContainerStatus, ImageRef, RunMode, RunRequest};
use crate::EngineError;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

/// In-memory engine for convergence tests.
///
/// Tracks images and containers, records every mutating call so tests can
/// assert idempotence (a second convergence pass must read, never write),
/// and can simulate two podman behaviors that matter to the reconciler:
/// auto-removal of a container as a side effect of stopping it, and a
/// one-shot command exiting non-zero.
pub struct MockEngine {
    images: Mutex<HashSet<String>>,
    containers: Mutex<HashMap<String, ContainerStatus>>,
    calls: Mutex<Vec<String>>,
    auto_remove_on_stop: bool,
    oneshot_exit_code: Option<i32>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            images: Mutex::new(HashSet::new()),
            containers: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            auto_remove_on_stop: false,
            oneshot_exit_code: None,
        }
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, reference: &str) -> Self {
        self.lock_images().insert(reference.to_owned());
        self
    }

    pub fn with_running_container(self, name: &str) -> Self {
        self.lock_containers()
            .insert(name.to_owned(), ContainerStatus::Running);
        self
    }

    pub fn with_stopped_container(self, name: &str) -> Self {
        self.lock_containers()
            .insert(name.to_owned(), ContainerStatus::Stopped);
        self
    }

    /// Simulate a container created with auto-remove: stop also deletes it.
    pub fn with_auto_remove_on_stop(mut self) -> Self {
        self.auto_remove_on_stop = true;
        self
    }

    /// Make one-shot runs fail with the given exit code.
    pub fn with_oneshot_exit_code(mut self, code: i32) -> Self {
        self.oneshot_exit_code = Some(code);
        self
    }

    /// Mutating engine calls issued so far, in order.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("calls mutex poisoned").clear();
    }

    pub fn image_present(&self, reference: &str) -> bool {
        self.lock_images().contains(reference)
    }

    fn lock_images(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.images.lock().expect("images mutex poisoned")
    }

    fn lock_containers(&self) -> std::sync::MutexGuard<'_, HashMap<String, ContainerStatus>> {
        self.containers.lock().expect("containers mutex poisoned")
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

impl ContainerEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_images(&self, reference: &str) -> Result<Vec<ImageRef>, EngineError> {
        if self.lock_images().contains(reference) {
            Ok(vec![ImageRef {
                id: format!("mock-{reference}"),
                names: vec![reference.to_owned()],
            }])
        } else {
            Ok(Vec::new())
        }
    }

    fn remove_image(&self, reference: &str) -> Result<(), EngineError> {
        self.record(format!("remove_image {reference}"));
        self.lock_images().remove(reference);
        Ok(())
    }

    fn build_image(&self, _context: &Path, tag: &str) -> Result<(), EngineError> {
        self.record(format!("build_image {tag}"));
        self.lock_images().insert(tag.to_owned());
        Ok(())
    }

    fn container_status(&self, name: &str) -> Result<ContainerStatus, EngineError> {
        Ok(self
            .lock_containers()
            .get(name)
            .copied()
            .unwrap_or(ContainerStatus::Absent))
    }

    fn start_container(&self, name: &str) -> Result<(), EngineError> {
        self.record(format!("start_container {name}"));
        self.lock_containers()
            .insert(name.to_owned(), ContainerStatus::Running);
        Ok(())
    }

    fn stop_container(&self, name: &str) -> Result<(), EngineError> {
        self.record(format!("stop_container {name}"));
        let mut containers = self.lock_containers();
        if self.auto_remove_on_stop {
            containers.remove(name);
        } else {
            containers.insert(name.to_owned(), ContainerStatus::Stopped);
        }
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<(), EngineError> {
        self.record(format!("remove_container {name}"));
        self.lock_containers().remove(name);
        Ok(())
    }

    fn run_container(&self, request: &RunRequest<'_>) -> Result<(), EngineError> {
        match request.mode {
            RunMode::Detached => {
                self.record(format!("run_container {} detached", request.name));
                self.lock_containers()
                    .insert(request.name.to_owned(), ContainerStatus::Running);
                Ok(())
            }
            RunMode::OneShot { command } => {
                self.record(format!("run_container {} oneshot {command}", request.name));
                // --rm: the engine reaps the container after the command,
                // so it never becomes visible to a later status query.
                match self.oneshot_exit_code {
                    None | Some(0) => Ok(()),
                    Some(code) => Err(EngineError::CommandFailed {
                        command: format!("podman run --rm {} {command}", request.image),
                        code,
                        detail: "see output above".to_owned(),
                    }),
                }
            }
        }
    }
}
