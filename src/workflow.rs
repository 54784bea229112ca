//! Workflow orchestrator: the strictly linear, idempotent installation state
//! machine.
//!
//! `Start → Elevate(if needed) → Probe/Remediate per prerequisite →
//! Materialize → Provision → GenerateScripts → Activate → Complete`.
//!
//! Per-step failure policy is explicit: materialization failure aborts the
//! run (there is no artifact to operate on without it); remediation failure
//! degrades to a recorded manual-intervention branch; environment
//! provisioning and service activation are best-effort with their failures
//! observed and recorded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::InstallerConfig;
use crate::environment::{provision, EnvManager, EnvironmentDescriptor};
use crate::fetch::ArtifactFetcher;
use crate::materialize::materialize;
use crate::platform::PrivilegeProvider;
use crate::probe::{is_installed, PrerequisiteSpec, ProductRegistry};
use crate::progress::ProgressReporter;
use crate::prompt::OperatorPrompt;
use crate::remediate::{remediate, InstallerRunner, RemediationOutcome};
use crate::scripts::{ScriptParams, ScriptRenderer, ShortcutCreator};
use crate::service::{activate, ComposeBackend};

/// One step of the installation workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Elevate,
    Probe(String),
    Remediate(String),
    Materialize,
    Provision,
    GenerateScripts,
    Activate,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Elevate => write!(f, "Privilege elevation"),
            Step::Probe(name) => write!(f, "Check {}", name),
            Step::Remediate(name) => write!(f, "Install {}", name),
            Step::Materialize => write!(f, "Download and extract project files"),
            Step::Provision => write!(f, "Set up runtime environment"),
            Step::GenerateScripts => write!(f, "Create startup scripts"),
            Step::Activate => write!(f, "Build and start service"),
        }
    }
}

/// How one step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    /// Prerequisite already satisfied; nothing to do.
    Skipped,
    Failed,
    /// The operator was asked to finish this step out-of-band.
    ManualIntervention,
}

/// Ordered record of what the workflow did.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: Step,
    pub status: StepStatus,
    pub detail: Option<String>,
}

/// Outcome of one workflow run. Not persisted; surfaced as console narration
/// and the terminal exit posture.
#[derive(Debug, Default)]
pub struct WorkflowOutcome {
    pub records: Vec<StepRecord>,
    pub aborted: bool,
}

impl WorkflowOutcome {
    fn record(&mut self, step: Step, status: StepStatus, detail: Option<String>) {
        self.records.push(StepRecord {
            step,
            status,
            detail,
        });
    }

    /// True when nothing failed and nothing was left to the operator.
    pub fn clean(&self) -> bool {
        !self.aborted
            && self
                .records
                .iter()
                .all(|r| matches!(r.status, StepStatus::Completed | StepStatus::Skipped))
    }

    pub fn status_of(&self, step: &Step) -> Option<&StepStatus> {
        self.records
            .iter()
            .find(|r| &r.step == step)
            .map(|r| &r.status)
    }
}

/// The orchestrator and its injected collaborators. All collaborators are
/// trait objects so the workflow runs under test without console, network,
/// or real installers.
pub struct Workflow<'a> {
    pub config: &'a InstallerConfig,
    pub fetcher: &'a dyn ArtifactFetcher,
    pub registry: &'a dyn ProductRegistry,
    pub installer_runner: &'a dyn InstallerRunner,
    pub privilege: &'a dyn PrivilegeProvider,
    pub prompt: &'a dyn OperatorPrompt,
    pub reporter: &'a dyn ProgressReporter,
    pub renderer: &'a ScriptRenderer,
    pub shortcut_creator: Option<&'a dyn ShortcutCreator>,
    /// Builds the environment manager, given the explicitly-resolved program
    /// path when remediation just installed it.
    pub env_manager_factory: &'a dyn Fn(Option<PathBuf>) -> Box<dyn EnvManager>,
    /// Builds the compose backend scoped to the installation directory.
    pub compose_factory: &'a dyn Fn(&Path) -> Box<dyn ComposeBackend>,
    pub script_params: ScriptParams,
    /// Skip the privilege gate (tests, containers).
    pub skip_elevation: bool,
}

impl<'a> Workflow<'a> {
    /// Run the workflow to completion. Strictly sequential; the only early
    /// exit is a failed materialization (or a failed elevation re-launch).
    pub async fn run(&self) -> WorkflowOutcome {
        let mut outcome = WorkflowOutcome::default();

        // Gate first: never proceed unprivileged.
        if !self.skip_elevation && !self.privilege.is_elevated() {
            tracing::info!("[Workflow] Not elevated, re-launching with elevation");
            let err = self.privilege.elevate_and_relaunch();
            // Only reachable when the re-launch itself failed.
            outcome.record(
                Step::Elevate,
                StepStatus::Failed,
                Some(format!("could not re-launch elevated: {}", err)),
            );
            outcome.aborted = true;
            return outcome;
        }

        let mut specs: Vec<PrerequisiteSpec> = self
            .config
            .prerequisites
            .iter()
            .map(PrerequisiteSpec::from)
            .collect();
        let mut resolved_programs: HashMap<String, PathBuf> = HashMap::new();

        // Prerequisites: skip when satisfied, remediate when missing.
        let prereq_count = specs.len().max(1) as u32;
        for (index, spec) in specs.iter_mut().enumerate() {
            let progress = 5 + 25 * index as u32 / prereq_count;
            self.reporter
                .emit(progress, format!("Checking {}", spec.name));

            if is_installed(spec, self.registry) {
                tracing::info!("[Workflow] {} is already installed", spec.name);
                outcome.record(Step::Probe(spec.name.clone()), StepStatus::Skipped, None);
                continue;
            }

            tracing::info!("[Workflow] {} is not installed", spec.name);
            outcome.record(Step::Probe(spec.name.clone()), StepStatus::Completed, None);

            match remediate(
                spec,
                self.fetcher,
                self.installer_runner,
                self.prompt,
                self.reporter,
            )
            .await
            {
                RemediationOutcome::Installed { resolved_program } => {
                    if let Some(program) = resolved_program {
                        spec.resolved_program = Some(program.clone());
                        resolved_programs.insert(spec.name.clone(), program);
                    }
                    outcome.record(
                        Step::Remediate(spec.name.clone()),
                        StepStatus::Completed,
                        None,
                    );
                }
                RemediationOutcome::ManualInterventionRequired => {
                    outcome.record(
                        Step::Remediate(spec.name.clone()),
                        StepStatus::ManualIntervention,
                        Some(format!("install manually from {}", spec.manual_url)),
                    );
                }
            }
        }

        // Materialize: the one fatal step.
        self.reporter
            .emit(40, "Downloading project files".to_string());
        if let Err(e) = materialize(
            self.fetcher,
            &self.config.project.archive_url,
            self.config.project.sha256.as_deref(),
            &self.config.install_dir,
            self.reporter,
        )
        .await
        {
            tracing::error!("[Workflow] Materialization failed: {}", e);
            outcome.record(
                Step::Materialize,
                StepStatus::Failed,
                Some(e.to_string()),
            );
            outcome.aborted = true;
            return outcome;
        }
        outcome.record(Step::Materialize, StepStatus::Completed, None);

        // Environment provisioning: best-effort, observed.
        self.reporter
            .emit(65, "Setting up runtime environment".to_string());
        let manager_program = resolved_programs
            .get(&self.config.environment.manager_prerequisite)
            .cloned();
        let manager = (self.env_manager_factory)(manager_program);
        let descriptor = EnvironmentDescriptor {
            name: self.config.environment.name.clone(),
            manifest: self
                .config
                .install_dir
                .join(&self.config.environment.manifest_file),
            runtime_version: self.config.environment.runtime_version.clone(),
        };
        let report = provision(&descriptor, manager.as_ref());
        if report.clean() {
            outcome.record(Step::Provision, StepStatus::Completed, None);
        } else {
            outcome.record(
                Step::Provision,
                StepStatus::Failed,
                Some(report.issues.join("; ")),
            );
        }

        // Control scripts and shortcut.
        self.reporter
            .emit(85, "Creating startup scripts".to_string());
        match self
            .renderer
            .generate_scripts(&self.config.install_dir, &self.script_params)
        {
            Ok(generated) => {
                let mut detail = None;
                if let Some(creator) = self.shortcut_creator {
                    if let Err(e) = creator.create_shortcut(
                        &generated.start,
                        &self.config.install_dir,
                        &self.script_params,
                    ) {
                        tracing::warn!("[Workflow] Shortcut creation failed: {}", e);
                        detail = Some(format!("shortcut creation failed: {}", e));
                    }
                }
                outcome.record(Step::GenerateScripts, StepStatus::Completed, detail);
            }
            Err(e) => {
                tracing::error!("[Workflow] Script generation failed: {}", e);
                outcome.record(
                    Step::GenerateScripts,
                    StepStatus::Failed,
                    Some(e.to_string()),
                );
            }
        }

        // Activation: best-effort, observed.
        self.reporter.emit(95, "Starting service".to_string());
        let backend = (self.compose_factory)(&self.config.install_dir);
        let report = activate(backend.as_ref());
        if report.clean() {
            outcome.record(Step::Activate, StepStatus::Completed, None);
        } else {
            outcome.record(
                Step::Activate,
                StepStatus::Failed,
                Some(report.issues.join("; ")),
            );
        }

        self.reporter.emit(100, "Installation complete".to_string());
        outcome
    }
}
