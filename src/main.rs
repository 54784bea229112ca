//! codexec-installer binary: interactive console front-end for the
//! installation workflow.

use std::path::{Path, PathBuf};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use codexec_installer::{
    open_in_browser, ChannelProgressReporter, CondaCli, ConsolePrompt, DockerComposeCli,
    EnvManager, HttpFetcher, InstallerConfig, NativeInstallerRunner, NativePrivilegeProvider,
    NativeProductRegistry, NativeShortcutCreator, OperatorPrompt, ScriptParams, ScriptRenderer,
    Step, StepStatus, Workflow, WorkflowOutcome,
};

#[derive(Parser, Debug)]
#[command(
    name = "codexec-installer",
    version,
    about = "Installs the Code Execution API as a local containerized service"
)]
struct Args {
    /// Path to an installer.toml overriding the built-in defaults
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Installation directory (overrides the configured one)
    #[arg(long = "install-dir")]
    install_dir: Option<PathBuf>,

    /// Answer yes to every prompt (unattended run)
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Skip the privilege gate (containers, CI)
    #[arg(long = "no-elevate")]
    no_elevate: bool,
}

/// Prompt used for unattended runs: acknowledgements print and move on,
/// confirmations are granted.
struct AssumeYesPrompt;

impl OperatorPrompt for AssumeYesPrompt {
    fn acknowledge(&self, message: &str) {
        println!("{}", message);
    }

    fn confirm(&self, message: &str) -> bool {
        println!("{} (assumed yes)", message);
        true
    }
}

/// Print the failure, hold for acknowledgment, exit non-zero. Every failure
/// path ends here so the operator always sees the message before the window
/// closes.
fn fatal(message: &str, pause: bool) -> ! {
    eprintln!("{}", message);
    if pause {
        ConsolePrompt.acknowledge("Press Enter to exit...");
    }
    std::process::exit(1);
}

fn banner(config: &InstallerConfig) {
    eprintln!("╔════════════════════════════════════════════════════════════════╗");
    eprintln!(
        "║  {:<62}║",
        format!("{} Installer", config.project.name)
    );
    eprintln!("╚════════════════════════════════════════════════════════════════╝");
    eprintln!("  Install directory: {}", config.install_dir.display());
    eprintln!("  Service URL: {}", config.service.url);
    eprintln!();
}

fn narrate(outcome: &WorkflowOutcome) {
    println!();
    for record in &outcome.records {
        let mark = match record.status {
            StepStatus::Completed => console::style("✓").green(),
            StepStatus::Skipped => console::style("-").dim(),
            StepStatus::Failed => console::style("✗").red(),
            StepStatus::ManualIntervention => console::style("!").yellow(),
        };
        match &record.detail {
            Some(detail) => println!("  {} {} ({})", mark, record.step, detail),
            None => println!("  {} {}", mark, record.step),
        }
    }
    println!();
    if outcome.aborted {
        println!("{}", console::style("Installation aborted.").red().bold());
    } else if outcome.clean() {
        println!(
            "{}",
            console::style("Installation completed successfully.")
                .green()
                .bold()
        );
    } else {
        println!(
            "{}",
            console::style("Installation finished with issues; see above.")
                .yellow()
                .bold()
        );
    }
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let args = Args::parse();

    let mut config = match InstallerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fatal(&e.to_string(), !args.yes),
    };
    if let Some(dir) = args.install_dir {
        config.install_dir = dir;
    }

    banner(&config);

    let prompt: Box<dyn OperatorPrompt> = if args.yes {
        Box::new(AssumeYesPrompt)
    } else {
        Box::new(ConsolePrompt)
    };

    if !prompt.confirm(&format!(
        "This will install {} to {}. Continue?",
        config.project.name,
        config.install_dir.display()
    )) {
        println!("Installation cancelled.");
        return;
    }

    let fetcher = HttpFetcher::new();
    let registry = NativeProductRegistry;
    let installer_runner = NativeInstallerRunner;
    let privilege = NativePrivilegeProvider;

    let renderer = match ScriptRenderer::from_embedded() {
        Ok(renderer) => renderer,
        Err(e) => fatal(&format!("Internal template error: {}", e), !args.yes),
    };
    let shortcut_creator = match NativeShortcutCreator::new() {
        Ok(creator) => Some(creator),
        Err(e) => {
            tracing::warn!("[Main] Shortcut support unavailable: {}", e);
            None
        }
    };

    let compose = DockerComposeCli::resolve(&config.install_dir);
    let script_params = ScriptParams {
        project_name: config.project.name.clone(),
        service_url: config.service.url.clone(),
        compose_command: compose.command_line(),
    };

    let env_manager_factory = |resolved: Option<PathBuf>| -> Box<dyn EnvManager> {
        match resolved {
            Some(program) => Box::new(CondaCli::with_program(program)),
            None => Box::new(CondaCli::new()),
        }
    };
    let compose_factory =
        |workdir: &Path| -> Box<dyn codexec_installer::ComposeBackend> {
            Box::new(DockerComposeCli::resolve(workdir))
        };

    // Workflow progress flows through a channel to the console bar.
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let reporter = ChannelProgressReporter::new(tx);
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let bar_task = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(progress) = rx.recv().await {
                bar.set_position(progress.percentage.min(100) as u64);
                bar.set_message(progress.message);
            }
        })
    };

    let outcome = {
        let workflow = Workflow {
            config: &config,
            fetcher: &fetcher,
            registry: &registry,
            installer_runner: &installer_runner,
            privilege: &privilege,
            prompt: prompt.as_ref(),
            reporter: &reporter,
            renderer: &renderer,
            shortcut_creator: shortcut_creator
                .as_ref()
                .map(|c| c as &dyn codexec_installer::ShortcutCreator),
            env_manager_factory: &env_manager_factory,
            compose_factory: &compose_factory,
            script_params,
            skip_elevation: args.no_elevate,
        };
        workflow.run().await
    };

    drop(reporter);
    let _ = bar_task.await;
    bar.finish_and_clear();

    narrate(&outcome);

    let activated = matches!(
        outcome.status_of(&Step::Activate),
        Some(StepStatus::Completed)
    );
    if activated
        && prompt.confirm(&format!(
            "Open {} in your browser now?",
            config.service.url
        ))
    {
        open_in_browser(&config.service.url);
    }

    if !args.yes {
        prompt.acknowledge("Press Enter to exit...");
    }
    if outcome.aborted {
        std::process::exit(1);
    }
}
