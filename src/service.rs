//! Service activator: build and start the containerized service from the
//! materialized project, via the compose backend.
//!
//! Best-effort from the workflow's point of view; both calls return typed
//! results and failures are reported, not discarded.

use std::path::{Path, PathBuf};

use crate::run::{run_captured, RunOutput};

/// Container build/run seam, scoped to the service definition in the install
/// directory. Contract is exit-status only.
pub trait ComposeBackend: Send + Sync {
    fn build(&self) -> Result<RunOutput, std::io::Error>;
    fn up_detached(&self) -> Result<RunOutput, std::io::Error>;
    fn down(&self) -> Result<RunOutput, std::io::Error>;
}

/// Compose CLI wrapper: `docker compose` plugin when available, classic
/// `docker-compose` otherwise.
pub struct DockerComposeCli {
    program: PathBuf,
    base_args: Vec<String>,
    workdir: PathBuf,
}

impl DockerComposeCli {
    /// Pick whichever compose entry point the machine has.
    pub fn resolve(workdir: &Path) -> Self {
        let plugin_available = run_captured(
            "docker",
            &["compose".to_string(), "version".to_string()],
            None,
        )
        .map(|r| r.success())
        .unwrap_or(false);

        if plugin_available {
            Self {
                program: PathBuf::from("docker"),
                base_args: vec!["compose".to_string()],
                workdir: workdir.to_path_buf(),
            }
        } else {
            Self {
                program: PathBuf::from("docker-compose"),
                base_args: Vec::new(),
                workdir: workdir.to_path_buf(),
            }
        }
    }

    /// The invocation as it should appear in generated scripts.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.base_args.iter().cloned());
        parts.join(" ")
    }

    fn run(&self, args: &[&str]) -> Result<RunOutput, std::io::Error> {
        let mut full_args = self.base_args.clone();
        full_args.extend(args.iter().map(|s| s.to_string()));
        run_captured(&self.program, &full_args, Some(&self.workdir))
    }
}

impl ComposeBackend for DockerComposeCli {
    fn build(&self) -> Result<RunOutput, std::io::Error> {
        self.run(&["build"])
    }

    fn up_detached(&self) -> Result<RunOutput, std::io::Error> {
        self.run(&["up", "-d"])
    }

    fn down(&self) -> Result<RunOutput, std::io::Error> {
        self.run(&["down"])
    }
}

/// What activation observed. `issues` is empty on a clean run.
#[derive(Debug, Default)]
pub struct ActivationReport {
    pub issues: Vec<String>,
}

impl ActivationReport {
    pub fn clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Build the service image(s), then start them detached.
pub fn activate(backend: &dyn ComposeBackend) -> ActivationReport {
    let mut report = ActivationReport::default();

    tracing::info!("[Activator] Building service images");
    match backend.build() {
        Ok(result) if result.success() => {}
        Ok(result) => report.issues.push(format!(
            "image build failed (exit {}): {}",
            result.exit_code,
            result.last_diagnostic_line()
        )),
        Err(e) => report
            .issues
            .push(format!("could not invoke compose build: {}", e)),
    }

    tracing::info!("[Activator] Starting service");
    match backend.up_detached() {
        Ok(result) if result.success() => {}
        Ok(result) => report.issues.push(format!(
            "service start failed (exit {}): {}",
            result.exit_code,
            result.last_diagnostic_line()
        )),
        Err(e) => report
            .issues
            .push(format!("could not invoke compose up: {}", e)),
    }

    if report.clean() {
        tracing::info!("[Activator] Service is up");
    } else {
        for issue in &report.issues {
            tracing::warn!("[Activator] {}", issue);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeBackend {
        calls: Mutex<Vec<&'static str>>,
        build_exit: i32,
    }

    impl ComposeBackend for FakeBackend {
        fn build(&self) -> Result<RunOutput, std::io::Error> {
            self.calls.lock().unwrap().push("build");
            Ok(RunOutput {
                exit_code: self.build_exit,
                stdout: String::new(),
                stderr: "build broke".to_string(),
            })
        }
        fn up_detached(&self) -> Result<RunOutput, std::io::Error> {
            self.calls.lock().unwrap().push("up");
            Ok(RunOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
        fn down(&self) -> Result<RunOutput, std::io::Error> {
            self.calls.lock().unwrap().push("down");
            Ok(RunOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn activation_builds_then_starts() {
        let backend = FakeBackend {
            calls: Mutex::new(Vec::new()),
            build_exit: 0,
        };
        let report = activate(&backend);
        assert!(report.clean());
        assert_eq!(*backend.calls.lock().unwrap(), vec!["build", "up"]);
    }

    #[test]
    fn build_failure_is_reported_but_start_still_attempted() {
        let backend = FakeBackend {
            calls: Mutex::new(Vec::new()),
            build_exit: 1,
        };
        let report = activate(&backend);
        assert!(!report.clean());
        assert!(report.issues[0].contains("image build failed"));
        assert_eq!(*backend.calls.lock().unwrap(), vec!["build", "up"]);
    }
}
