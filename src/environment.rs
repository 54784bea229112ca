//! Environment provisioner: ensure the named isolated runtime environment
//! exists (create-if-absent, update-if-present) and that the dependency
//! manifest is installed into it.
//!
//! The step is best-effort from the workflow's point of view, but every
//! underlying call returns a typed result and failures are observed and
//! reported rather than silently discarded.

use std::path::{Path, PathBuf};

use crate::run::{run_captured, RunOutput};

/// The isolated runtime environment: probed for existence, created or
/// updated, never deleted.
#[derive(Debug, Clone)]
pub struct EnvironmentDescriptor {
    pub name: String,
    pub manifest: PathBuf,
    pub runtime_version: String,
}

/// Environment-manager seam. Contract is exit status plus captured output.
pub trait EnvManager: Send + Sync {
    fn list(&self) -> Result<RunOutput, std::io::Error>;
    fn create(&self, name: &str, runtime_version: &str) -> Result<RunOutput, std::io::Error>;
    fn update(&self, name: &str, manifest: &Path) -> Result<RunOutput, std::io::Error>;
    fn install(&self, name: &str, manifest: &Path) -> Result<RunOutput, std::io::Error>;
}

/// Conda CLI wrapper. Holds the resolved executable path so a fresh
/// unattended install works without process-wide PATH mutation.
pub struct CondaCli {
    program: PathBuf,
}

impl CondaCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("conda"),
        }
    }

    pub fn with_program(program: PathBuf) -> Self {
        Self { program }
    }
}

impl Default for CondaCli {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvManager for CondaCli {
    fn list(&self) -> Result<RunOutput, std::io::Error> {
        run_captured(&self.program, &["env".to_string(), "list".to_string()], None)
    }

    fn create(&self, name: &str, runtime_version: &str) -> Result<RunOutput, std::io::Error> {
        run_captured(
            &self.program,
            &[
                "create".to_string(),
                "-n".to_string(),
                name.to_string(),
                format!("python={}", runtime_version),
                "-y".to_string(),
            ],
            None,
        )
    }

    fn update(&self, name: &str, manifest: &Path) -> Result<RunOutput, std::io::Error> {
        run_captured(
            &self.program,
            &[
                "env".to_string(),
                "update".to_string(),
                "-n".to_string(),
                name.to_string(),
                "--file".to_string(),
                manifest.display().to_string(),
            ],
            None,
        )
    }

    fn install(&self, name: &str, manifest: &Path) -> Result<RunOutput, std::io::Error> {
        run_captured(
            &self.program,
            &[
                "run".to_string(),
                "-n".to_string(),
                name.to_string(),
                "pip".to_string(),
                "install".to_string(),
                "-r".to_string(),
                manifest.display().to_string(),
            ],
            None,
        )
    }
}

/// What provisioning observed. `issues` is empty on a clean run.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub created: bool,
    pub updated: bool,
    pub issues: Vec<String>,
}

impl ProvisionReport {
    pub fn clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Ensure the environment exists and install its manifest dependencies.
/// Never fails the workflow; everything observed lands in the report.
pub fn provision(env: &EnvironmentDescriptor, manager: &dyn EnvManager) -> ProvisionReport {
    let mut report = ProvisionReport::default();

    let exists = match manager.list() {
        Ok(result) if result.success() => result.stdout.contains(&env.name),
        Ok(result) => {
            report.issues.push(format!(
                "environment listing failed (exit {}): {}",
                result.exit_code,
                result.last_diagnostic_line()
            ));
            false
        }
        Err(e) => {
            report
                .issues
                .push(format!("could not invoke environment manager: {}", e));
            false
        }
    };

    if exists {
        tracing::info!(
            "[Environment] Environment '{}' already exists, updating",
            env.name
        );
        match manager.update(&env.name, &env.manifest) {
            Ok(result) if result.success() => report.updated = true,
            Ok(result) => report.issues.push(format!(
                "environment update failed (exit {}): {}",
                result.exit_code,
                result.last_diagnostic_line()
            )),
            Err(e) => report
                .issues
                .push(format!("could not run environment update: {}", e)),
        }
    } else {
        tracing::info!("[Environment] Creating environment '{}'", env.name);
        match manager.create(&env.name, &env.runtime_version) {
            Ok(result) if result.success() => report.created = true,
            Ok(result) => report.issues.push(format!(
                "environment creation failed (exit {}): {}",
                result.exit_code,
                result.last_diagnostic_line()
            )),
            Err(e) => report
                .issues
                .push(format!("could not run environment creation: {}", e)),
        }
    }

    tracing::info!("[Environment] Installing dependencies from manifest");
    match manager.install(&env.name, &env.manifest) {
        Ok(result) if result.success() => {}
        Ok(result) => report.issues.push(format!(
            "dependency install failed (exit {}): {}",
            result.exit_code,
            result.last_diagnostic_line()
        )),
        Err(e) => report
            .issues
            .push(format!("could not run dependency install: {}", e)),
    }

    if report.clean() {
        tracing::info!("[Environment] Environment setup completed");
    } else {
        for issue in &report.issues {
            tracing::warn!("[Environment] {}", issue);
        }
    }

    report
}
