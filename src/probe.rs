//! Prerequisite probes: decide installed / not-installed for each external
//! dependency before the workflow remediates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;

use crate::config::PrerequisiteConfig;

/// How a prerequisite is detected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProbeMethod {
    /// OS product-registration marker: a registry key on Windows, well-known
    /// install marker paths elsewhere.
    ProductRegistration { key: String, markers: Vec<PathBuf> },

    /// Invoke the tool with a version-query argument; non-zero exit or spawn
    /// failure means not installed.
    CommandVersion { program: String, args: Vec<String> },
}

/// A prerequisite as consumed by the workflow: the static config plus the
/// explicitly-resolved program path once remediation has installed it.
#[derive(Debug, Clone)]
pub struct PrerequisiteSpec {
    pub name: String,
    pub probe: ProbeMethod,
    pub installer_url: String,
    pub installer_sha256: Option<String>,
    pub silent_args: Vec<String>,
    pub manual_url: String,

    /// Program path valid after a successful unattended install, resolved
    /// against the user's home dir.
    pub installed_program: Option<PathBuf>,

    /// Explicit program path threaded through later calls instead of
    /// process-wide PATH mutation.
    pub resolved_program: Option<PathBuf>,
}

impl From<&PrerequisiteConfig> for PrerequisiteSpec {
    fn from(config: &PrerequisiteConfig) -> Self {
        let installed_program = config.installed_program.as_ref().map(|rel| {
            if rel.is_absolute() {
                rel.clone()
            } else {
                dirs::home_dir().unwrap_or_default().join(rel)
            }
        });
        Self {
            name: config.name.clone(),
            probe: config.probe.clone(),
            installer_url: config.installer_url.clone(),
            installer_sha256: config.installer_sha256.clone(),
            silent_args: config.silent_args.clone(),
            manual_url: config.manual_url.clone(),
            installed_program,
            resolved_program: None,
        }
    }
}

/// Product-registration lookup seam. `Err` means the lookup mechanism itself
/// failed, not that the product is absent.
pub trait ProductRegistry: Send + Sync {
    fn is_registered(&self, key: &str, markers: &[PathBuf]) -> Result<bool, std::io::Error>;
}

/// Native lookup: `reg query` on Windows, marker paths elsewhere.
pub struct NativeProductRegistry;

impl ProductRegistry for NativeProductRegistry {
    #[cfg(windows)]
    fn is_registered(&self, key: &str, _markers: &[PathBuf]) -> Result<bool, std::io::Error> {
        let output = Command::new("reg")
            .arg("query")
            .arg(format!("HKLM\\{}", key))
            .output()?;
        Ok(output.status.success())
    }

    #[cfg(not(windows))]
    fn is_registered(&self, _key: &str, markers: &[PathBuf]) -> Result<bool, std::io::Error> {
        Ok(markers.iter().any(|marker| marker.exists()))
    }
}

/// Probe a prerequisite. Fail-closed: any lookup or invocation failure is
/// treated as "not installed", never propagated.
pub fn is_installed(spec: &PrerequisiteSpec, registry: &dyn ProductRegistry) -> bool {
    match &spec.probe {
        ProbeMethod::ProductRegistration { key, markers } => {
            match registry.is_registered(key, markers) {
                Ok(registered) => registered,
                Err(e) => {
                    tracing::debug!(
                        "[Probe] Registration lookup for {} failed ({}), treating as not installed",
                        spec.name,
                        e
                    );
                    false
                }
            }
        }
        ProbeMethod::CommandVersion { program, args } => {
            let program = spec
                .resolved_program
                .as_ref()
                .map(|p| p.as_os_str().to_os_string())
                .unwrap_or_else(|| program.into());
            match Command::new(&program).args(args).output() {
                Ok(output) => output.status.success(),
                Err(e) => {
                    tracing::debug!(
                        "[Probe] Could not invoke {:?} for {} ({}), treating as not installed",
                        program,
                        spec.name,
                        e
                    );
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_probe(probe: ProbeMethod) -> PrerequisiteSpec {
        PrerequisiteSpec {
            name: "test".to_string(),
            probe,
            installer_url: String::new(),
            installer_sha256: None,
            silent_args: Vec::new(),
            manual_url: String::new(),
            installed_program: None,
            resolved_program: None,
        }
    }

    struct ErroringRegistry;

    impl ProductRegistry for ErroringRegistry {
        fn is_registered(&self, _key: &str, _markers: &[PathBuf]) -> Result<bool, std::io::Error> {
            Err(std::io::Error::other("lookup mechanism broken"))
        }
    }

    struct FixedRegistry(bool);

    impl ProductRegistry for FixedRegistry {
        fn is_registered(&self, _key: &str, _markers: &[PathBuf]) -> Result<bool, std::io::Error> {
            Ok(self.0)
        }
    }

    #[test]
    fn registration_lookup_error_is_fail_closed() {
        let spec = spec_with_probe(ProbeMethod::ProductRegistration {
            key: "SOFTWARE\\Docker Inc.\\Docker Desktop".to_string(),
            markers: vec![],
        });
        assert!(!is_installed(&spec, &ErroringRegistry));
    }

    #[test]
    fn registration_lookup_reports_presence() {
        let spec = spec_with_probe(ProbeMethod::ProductRegistration {
            key: "SOFTWARE\\Docker Inc.\\Docker Desktop".to_string(),
            markers: vec![],
        });
        assert!(is_installed(&spec, &FixedRegistry(true)));
        assert!(!is_installed(&spec, &FixedRegistry(false)));
    }

    #[test]
    fn missing_command_means_not_installed() {
        let spec = spec_with_probe(ProbeMethod::CommandVersion {
            program: "definitely-not-a-real-program-xyz".to_string(),
            args: vec!["--version".to_string()],
        });
        assert!(!is_installed(&spec, &NativeProductRegistry));
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_version_query_means_installed() {
        let spec = spec_with_probe(ProbeMethod::CommandVersion {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 0".to_string()],
        });
        assert!(is_installed(&spec, &NativeProductRegistry));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_version_query_means_not_installed() {
        let spec = spec_with_probe(ProbeMethod::CommandVersion {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string()],
        });
        assert!(!is_installed(&spec, &NativeProductRegistry));
    }

    #[cfg(unix)]
    #[test]
    fn resolved_program_overrides_probe_program() {
        let mut spec = spec_with_probe(ProbeMethod::CommandVersion {
            program: "definitely-not-a-real-program-xyz".to_string(),
            args: vec!["-c".to_string(), "exit 0".to_string()],
        });
        spec.resolved_program = Some(PathBuf::from("/bin/sh"));
        assert!(is_installed(&spec, &NativeProductRegistry));
    }
}
