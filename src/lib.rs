//! Local provisioning workflow for the Code Execution API.
//!
//! Brings a machine from a bare state to a running containerized service:
//! probes and remediates external prerequisites, materializes the project
//! snapshot into the install directory, provisions the isolated runtime
//! environment, generates the operator control scripts, and activates the
//! service. The whole workflow is idempotent and safe to re-run.

pub mod config;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod materialize;
pub mod platform;
pub mod probe;
pub mod progress;
pub mod prompt;
pub mod remediate;
pub mod run;
pub mod scripts;
pub mod service;
pub mod templates;
pub mod workflow;

pub use config::{InstallerConfig, PrerequisiteConfig};
pub use environment::{provision, CondaCli, EnvManager, EnvironmentDescriptor, ProvisionReport};
pub use error::{FetchError, InstallError};
pub use fetch::{ArtifactFetcher, HttpFetcher};
pub use materialize::materialize;
pub use platform::{open_in_browser, NativePrivilegeProvider, PrivilegeProvider};
pub use probe::{is_installed, NativeProductRegistry, PrerequisiteSpec, ProbeMethod, ProductRegistry};
pub use progress::{ChannelProgressReporter, InstallProgress, NullProgressReporter, ProgressReporter};
pub use prompt::{ConsolePrompt, OperatorPrompt};
pub use remediate::{remediate, InstallerRunner, NativeInstallerRunner, RemediationOutcome};
pub use run::{run_captured, RunOutput};
pub use scripts::{
    GeneratedScripts, NativeShortcutCreator, ScriptParams, ScriptRenderer, ShortcutCreator,
};
pub use service::{activate, ActivationReport, ComposeBackend, DockerComposeCli};
pub use workflow::{Step, StepRecord, StepStatus, Workflow, WorkflowOutcome};
