//! Launcher script generator: emits the idempotent start/stop control
//! scripts into the installation directory and a desktop shortcut pointing
//! at the start script. Scripts are fully regenerated (overwritten) on every
//! run, so repeated generation is byte-identical.

use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use crate::error::InstallError;
use crate::templates;

/// Rendering context shared by the script and shortcut templates.
#[derive(Debug, Clone)]
pub struct ScriptParams {
    pub project_name: String,
    pub service_url: String,
    /// Compose invocation as it should appear in the scripts, e.g.
    /// "docker compose" or "docker-compose".
    pub compose_command: String,
}

/// Paths of the generated control scripts.
#[derive(Debug, Clone)]
pub struct GeneratedScripts {
    pub start: PathBuf,
    pub stop: PathBuf,
}

/// Renders the embedded launcher templates.
pub struct ScriptRenderer {
    tera: Tera,
}

impl ScriptRenderer {
    pub fn from_embedded() -> Result<Self, InstallError> {
        let mut tera = Tera::default();
        for (name, content) in templates::ALL_TEMPLATES {
            tera.add_raw_template(name, content)
                .map_err(|e| InstallError::Scripts(format!("bad template {}: {}", name, e)))?;
        }
        Ok(Self { tera })
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, InstallError> {
        self.tera
            .render(template, context)
            .map_err(|e| InstallError::Scripts(format!("failed to render {}: {}", template, e)))
    }

    /// Write the start/stop scripts into `target_dir`, overwriting any
    /// previous generation.
    pub fn generate_scripts(
        &self,
        target_dir: &Path,
        params: &ScriptParams,
    ) -> Result<GeneratedScripts, InstallError> {
        let context = script_context(target_dir, params);

        let (start_template, stop_template) = if cfg!(windows) {
            ("start_api.bat", "stop_api.bat")
        } else {
            ("start_api.sh", "stop_api.sh")
        };

        let start = target_dir.join(start_template);
        let stop = target_dir.join(stop_template);

        std::fs::write(&start, self.render(start_template, &context)?)?;
        std::fs::write(&stop, self.render(stop_template, &context)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            for script in [&start, &stop] {
                let mut perms = std::fs::metadata(script)?.permissions();
                perms.set_mode(0o755);
                std::fs::set_permissions(script, perms)?;
            }
        }

        tracing::info!(
            "[Scripts] Generated control scripts in {}",
            target_dir.display()
        );
        Ok(GeneratedScripts { start, stop })
    }
}

fn script_context(target_dir: &Path, params: &ScriptParams) -> Context {
    let mut context = Context::new();
    context.insert("project_name", &params.project_name);
    context.insert("service_url", &params.service_url);
    context.insert("compose_command", &params.compose_command);
    context.insert("install_dir", &target_dir.display().to_string());
    context.insert("open_command", default_open_command());
    context
}

fn default_open_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Desktop-shortcut capability. Platform-specific; the orchestrator depends
/// only on this interface.
pub trait ShortcutCreator: Send + Sync {
    fn create_shortcut(
        &self,
        start_script: &Path,
        workdir: &Path,
        params: &ScriptParams,
    ) -> Result<PathBuf, InstallError>;
}

/// Native shortcut creation: a `.desktop` entry on Unix desktops, a transient
/// VBS run through `cscript` on Windows (deleted immediately after use).
pub struct NativeShortcutCreator {
    renderer: ScriptRenderer,
}

impl NativeShortcutCreator {
    pub fn new() -> Result<Self, InstallError> {
        Ok(Self {
            renderer: ScriptRenderer::from_embedded()?,
        })
    }

    fn desktop_dir() -> Result<PathBuf, InstallError> {
        dirs::desktop_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
            .ok_or_else(|| InstallError::Scripts("cannot resolve desktop directory".to_string()))
    }
}

impl ShortcutCreator for NativeShortcutCreator {
    #[cfg(not(windows))]
    fn create_shortcut(
        &self,
        start_script: &Path,
        workdir: &Path,
        params: &ScriptParams,
    ) -> Result<PathBuf, InstallError> {
        let mut context = Context::new();
        context.insert("project_name", &params.project_name);
        context.insert("description", &format!("Start {}", params.project_name));
        context.insert("start_script", &start_script.display().to_string());
        context.insert("install_dir", &workdir.display().to_string());

        let shortcut_path =
            Self::desktop_dir()?.join(format!("{}.desktop", params.project_name.replace(' ', "-")));
        let content = self.renderer.render("shortcut.desktop", &context)?;
        std::fs::write(&shortcut_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&shortcut_path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&shortcut_path, perms)?;
        }

        tracing::info!(
            "[Scripts] Desktop shortcut created at {}",
            shortcut_path.display()
        );
        Ok(shortcut_path)
    }

    #[cfg(windows)]
    fn create_shortcut(
        &self,
        start_script: &Path,
        workdir: &Path,
        params: &ScriptParams,
    ) -> Result<PathBuf, InstallError> {
        let shortcut_path = Self::desktop_dir()?.join(format!("{}.lnk", params.project_name));

        let mut context = Context::new();
        context.insert("project_name", &params.project_name);
        context.insert("description", &format!("Start {}", params.project_name));
        context.insert("start_script", &start_script.display().to_string());
        context.insert("install_dir", &workdir.display().to_string());
        context.insert("shortcut_path", &shortcut_path.display().to_string());

        let content = self.renderer.render("shortcut.vbs", &context)?;

        // Transient automation script, removed as soon as cscript returns.
        let scratch = tempfile::tempdir()?;
        let vbs_path = scratch.path().join("create_shortcut.vbs");
        std::fs::write(&vbs_path, content)?;

        let result = crate::run::run_captured(
            "cscript",
            &["/nologo".to_string(), vbs_path.display().to_string()],
            None,
        )?;
        if !result.success() {
            return Err(InstallError::Scripts(format!(
                "shortcut creation failed (exit {}): {}",
                result.exit_code,
                result.last_diagnostic_line()
            )));
        }

        tracing::info!(
            "[Scripts] Desktop shortcut created at {}",
            shortcut_path.display()
        );
        Ok(shortcut_path)
    }
}
