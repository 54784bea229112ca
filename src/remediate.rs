//! Remediation installer: fetch a missing prerequisite's installer artifact
//! and run it unattended. Failure degrades to a manual-intervention branch
//! rather than aborting the workflow.

use std::path::{Path, PathBuf};

use crate::fetch::ArtifactFetcher;
use crate::probe::PrerequisiteSpec;
use crate::progress::ProgressReporter;
use crate::prompt::OperatorPrompt;
use crate::run::{run_captured, RunOutput};

/// Outcome of remediating one missing prerequisite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// Unattended install succeeded. When known, carries the explicit path of
    /// the freshly-installed program for later calls (no PATH mutation).
    Installed { resolved_program: Option<PathBuf> },

    /// Unattended install could not complete; the operator was instructed to
    /// install manually and the workflow continues.
    ManualInterventionRequired,
}

/// Executes a fetched installer artifact. Mocked in tests.
pub trait InstallerRunner: Send + Sync {
    fn execute(&self, installer: &Path, args: &[String]) -> Result<RunOutput, std::io::Error>;
}

/// Runs the installer as a child process with captured output.
pub struct NativeInstallerRunner;

impl InstallerRunner for NativeInstallerRunner {
    fn execute(&self, installer: &Path, args: &[String]) -> Result<RunOutput, std::io::Error> {
        run_captured(installer, args, None)
    }
}

/// Fetch the installer for `spec` into a scratch location and execute it
/// unattended. The scratch directory is removed on every path out.
pub async fn remediate(
    spec: &PrerequisiteSpec,
    fetcher: &dyn ArtifactFetcher,
    runner: &dyn InstallerRunner,
    prompt: &dyn OperatorPrompt,
    reporter: &dyn ProgressReporter,
) -> RemediationOutcome {
    tracing::info!("[Remediation] Installing {}", spec.name);

    let scratch = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!(
                "[Remediation] Could not create scratch directory for {}: {}",
                spec.name,
                e
            );
            return RemediationOutcome::ManualInterventionRequired;
        }
    };

    let installer_path = scratch.path().join(installer_file_name(&spec.installer_url));

    reporter.emit(0, format!("Downloading {} installer", spec.name));
    if let Err(e) = fetcher
        .fetch_verified(
            &spec.installer_url,
            &installer_path,
            spec.installer_sha256.as_deref(),
            reporter,
        )
        .await
    {
        tracing::error!(
            "[Remediation] Failed to download {} installer: {}",
            spec.name,
            e
        );
        tracing::error!(
            "[Remediation] Please install {} manually from {}",
            spec.name,
            spec.manual_url
        );
        return RemediationOutcome::ManualInterventionRequired;
    }

    tracing::info!("[Remediation] Running {} installer unattended", spec.name);
    let result = match runner.execute(&installer_path, &spec.silent_args) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(
                "[Remediation] Could not launch {} installer: {}",
                spec.name,
                e
            );
            instruct_manual_install(spec, prompt);
            return RemediationOutcome::ManualInterventionRequired;
        }
    };

    if result.success() {
        tracing::info!("[Remediation] {} installed successfully", spec.name);
        return RemediationOutcome::Installed {
            resolved_program: spec.installed_program.clone(),
        };
    }

    tracing::error!(
        "[Remediation] {} installer failed (exit {}): {}",
        spec.name,
        result.exit_code,
        result.last_diagnostic_line()
    );
    if !result.stderr.is_empty() {
        eprintln!("{}", result.stderr.trim_end());
    }
    instruct_manual_install(spec, prompt);
    RemediationOutcome::ManualInterventionRequired
}

fn instruct_manual_install(spec: &PrerequisiteSpec, prompt: &dyn OperatorPrompt) {
    println!(
        "Please install {} manually from {}",
        spec.name, spec.manual_url
    );
    prompt.acknowledge(&format!(
        "Press Enter to continue after installing {} manually...",
        spec.name
    ));
}

fn installer_file_name(url: &str) -> String {
    url.rsplit('/')
        .next()
        .map(|name| {
            // Strip query strings and percent-escapes down to a safe file name.
            let name = name.split('?').next().unwrap_or(name).replace("%20", "_");
            if name.is_empty() {
                "installer".to_string()
            } else {
                name
            }
        })
        .unwrap_or_else(|| "installer".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_comes_from_last_url_segment() {
        assert_eq!(
            installer_file_name("https://example.com/downloads/Setup.exe"),
            "Setup.exe"
        );
        assert_eq!(
            installer_file_name("https://example.com/Docker%20Desktop%20Installer.exe"),
            "Docker_Desktop_Installer.exe"
        );
        assert_eq!(
            installer_file_name("https://example.com/get?id=42"),
            "get"
        );
    }
}
