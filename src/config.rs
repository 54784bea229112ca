//! Installer configuration.
//! Loaded from installer.toml, with built-in defaults matching the hosted
//! Code Execution API artifacts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::probe::ProbeMethod;

/// Top-level installer configuration.
/// Loaded from installer.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerConfig {
    /// Installation target directory. Exactly one per machine; re-running the
    /// workflow against a stale target is safe.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    /// External prerequisites probed (and remediated) before materialization.
    #[serde(default = "default_prerequisites", rename = "prerequisite")]
    pub prerequisites: Vec<PrerequisiteConfig>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            project: ProjectConfig::default(),
            environment: EnvironmentConfig::default(),
            service: ServiceConfig::default(),
            prerequisites: default_prerequisites(),
        }
    }
}

impl InstallerConfig {
    /// Load configuration from file.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, InstallError> {
        let mut config_paths: Vec<PathBuf> = Vec::new();
        if let Some(path) = explicit_path {
            config_paths.push(path.to_path_buf());
        }
        config_paths.push(PathBuf::from("installer.toml"));
        if let Some(home) = dirs::config_dir() {
            config_paths.push(home.join("codexec-installer/installer.toml"));
        }

        for path in config_paths {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    InstallError::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;

                let config: InstallerConfig = toml::from_str(&content).map_err(|e| {
                    InstallError::Config(format!("Failed to parse config file {:?}: {}", path, e))
                })?;

                tracing::info!("Loaded installer config from {:?}", path);
                return Ok(config);
            }
        }

        tracing::warn!("No installer.toml found, using defaults");
        Ok(Self::default())
    }
}

/// Project snapshot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Display name of the installed product.
    pub name: String,

    /// URL of the project snapshot archive. The archive's entries share a
    /// single top-level root folder.
    pub archive_url: String,

    /// Expected SHA-256 of the archive (hex). Verified when present.
    pub sha256: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Code Execution API".to_string(),
            archive_url:
                "https://github.com/SohamMhatre09/Code-Execution-API/archive/refs/heads/main.tar.gz"
                    .to_string(),
            sha256: None,
        }
    }
}

/// Isolated runtime environment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment name (create-if-absent, update-if-present).
    pub name: String,

    /// Pinned runtime version used when the environment is created.
    pub runtime_version: String,

    /// Dependency manifest file name, relative to the install dir.
    pub manifest_file: String,

    /// Name of the prerequisite that provides the environment manager. A
    /// program path resolved during that prerequisite's remediation is used
    /// for all environment calls.
    #[serde(default = "default_manager_prerequisite")]
    pub manager_prerequisite: String,
}

fn default_manager_prerequisite() -> String {
    "Miniconda".to_string()
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: "code_execution_api".to_string(),
            runtime_version: "3.11".to_string(),
            manifest_file: "requirements.txt".to_string(),
            manager_prerequisite: default_manager_prerequisite(),
        }
    }
}

/// Running service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Well-known URL the service listens on once started.
    pub url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
        }
    }
}

/// A single external prerequisite: how to detect it and how to install it
/// unattended when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrerequisiteConfig {
    pub name: String,

    /// Detection method.
    pub probe: ProbeMethod,

    /// URL of the unattended installer artifact.
    pub installer_url: String,

    /// Expected SHA-256 of the installer (hex). Verified when present.
    pub installer_sha256: Option<String>,

    /// Arguments passed to the installer for a silent install.
    #[serde(default)]
    pub silent_args: Vec<String>,

    /// Where the operator is pointed when unattended install fails.
    pub manual_url: String,

    /// Program path valid after a successful unattended install, relative to
    /// the user's home dir. Threaded to later calls instead of mutating PATH.
    pub installed_program: Option<PathBuf>,
}

fn default_install_dir() -> PathBuf {
    #[cfg(windows)]
    {
        let program_data =
            std::env::var("PROGRAMDATA").unwrap_or_else(|_| "C:\\ProgramData".to_string());
        PathBuf::from(program_data).join("CodeExecutionAPI")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/opt/code-execution-api")
    }
}

fn default_prerequisites() -> Vec<PrerequisiteConfig> {
    vec![
        PrerequisiteConfig {
            name: "Docker Desktop".to_string(),
            probe: ProbeMethod::ProductRegistration {
                key: "SOFTWARE\\Docker Inc.\\Docker Desktop".to_string(),
                markers: vec![
                    PathBuf::from("/usr/bin/docker"),
                    PathBuf::from("/usr/local/bin/docker"),
                    PathBuf::from("/Applications/Docker.app"),
                ],
            },
            installer_url:
                "https://desktop.docker.com/win/stable/Docker%20Desktop%20Installer.exe"
                    .to_string(),
            installer_sha256: None,
            silent_args: vec!["install".to_string(), "--quiet".to_string()],
            manual_url: "https://www.docker.com/products/docker-desktop".to_string(),
            installed_program: None,
        },
        PrerequisiteConfig {
            name: "Miniconda".to_string(),
            probe: ProbeMethod::CommandVersion {
                program: "conda".to_string(),
                args: vec!["--version".to_string()],
            },
            installer_url:
                "https://repo.anaconda.com/miniconda/Miniconda3-latest-Windows-x86_64.exe"
                    .to_string(),
            installer_sha256: None,
            silent_args: vec![
                "/InstallationType=JustMe".to_string(),
                "/RegisterPython=0".to_string(),
                "/S".to_string(),
            ],
            manual_url: "https://docs.conda.io/en/latest/miniconda.html".to_string(),
            installed_program: Some(PathBuf::from("Miniconda3/Scripts/conda")),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_two_prerequisites() {
        let config = InstallerConfig::default();
        assert_eq!(config.prerequisites.len(), 2);
        assert_eq!(config.prerequisites[0].name, "Docker Desktop");
        assert_eq!(config.prerequisites[1].name, "Miniconda");
    }

    #[test]
    fn config_parses_from_toml() {
        let toml_str = r#"
install_dir = "/tmp/codexec"

[project]
name = "Code Execution API"
archive_url = "https://example.com/snapshot.tar.gz"
sha256 = "abc123"

[environment]
name = "code_execution_api"
runtime_version = "3.11"
manifest_file = "requirements.txt"

[service]
url = "http://localhost:8000"

[[prerequisite]]
name = "Docker Desktop"
installer_url = "https://example.com/docker.exe"
silent_args = ["install", "--quiet"]
manual_url = "https://www.docker.com/products/docker-desktop"

[prerequisite.probe]
kind = "product-registration"
key = "SOFTWARE\\Docker Inc.\\Docker Desktop"
markers = ["/usr/bin/docker"]
"#;
        let config: InstallerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.install_dir, PathBuf::from("/tmp/codexec"));
        assert_eq!(config.project.sha256.as_deref(), Some("abc123"));
        assert_eq!(config.prerequisites.len(), 1);
    }

    #[test]
    fn invalid_config_file_is_a_config_error() {
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().join("installer.toml");
        std::fs::write(&path, "install_dir = [broken").unwrap();

        let result = InstallerConfig::load(Some(&path));
        assert!(matches!(result, Err(InstallError::Config(_))));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = InstallerConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: InstallerConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.environment.name, config.environment.name);
        assert_eq!(parsed.prerequisites.len(), config.prerequisites.len());
    }
}
