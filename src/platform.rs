//! Platform capabilities: privilege gate and browser integration. The
//! orchestrator depends only on the traits here.

/// Privilege gate. If the process is not elevated, the workflow re-invokes
/// itself elevated and the unprivileged instance exits.
pub trait PrivilegeProvider: Send + Sync {
    fn is_elevated(&self) -> bool;

    /// Replace or outlive this process with an elevated re-invocation of the
    /// same executable and arguments. Only returns on failure, `exec`-style;
    /// a successful elevation never comes back here.
    fn elevate_and_relaunch(&self) -> std::io::Error;
}

/// Native privilege provider: euid check and `sudo` re-exec on Unix,
/// a `RunAs` relaunch on Windows.
pub struct NativePrivilegeProvider;

impl PrivilegeProvider for NativePrivilegeProvider {
    #[cfg(unix)]
    fn is_elevated(&self) -> bool {
        nix::unistd::Uid::effective().is_root()
    }

    #[cfg(windows)]
    fn is_elevated(&self) -> bool {
        // `net session` succeeds only from an elevated shell.
        std::process::Command::new("net")
            .arg("session")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[cfg(unix)]
    fn elevate_and_relaunch(&self) -> std::io::Error {
        use std::os::unix::process::CommandExt;

        let exe = match std::env::current_exe() {
            Ok(path) => path,
            Err(e) => return e,
        };
        let args: Vec<String> = std::env::args().skip(1).collect();

        tracing::info!("[Privilege] Re-launching elevated via sudo");
        std::process::Command::new("sudo").arg(exe).args(args).exec()
    }

    #[cfg(windows)]
    fn elevate_and_relaunch(&self) -> std::io::Error {
        let exe = match std::env::current_exe() {
            Ok(path) => path,
            Err(e) => return e,
        };
        let args: Vec<String> = std::env::args().skip(1).collect();
        let arg_list = args
            .iter()
            .map(|a| format!("'{}'", a.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(",");

        tracing::info!("[Privilege] Re-launching elevated via RunAs");
        let mut command = std::process::Command::new("powershell");
        command.arg("-NoProfile").arg("-Command").arg(format!(
            "Start-Process -FilePath '{}' {} -Verb RunAs",
            exe.display(),
            if args.is_empty() {
                String::new()
            } else {
                format!("-ArgumentList {}", arg_list)
            }
        ));
        match command.status() {
            Ok(status) if status.success() => {
                // The elevated instance owns the workflow from here.
                std::process::exit(0);
            }
            Ok(status) => std::io::Error::other(format!(
                "elevated relaunch exited with status {}",
                status
            )),
            Err(e) => e,
        }
    }
}

/// Open `url` in the operator's default browser. Fire-and-forget.
pub fn open_in_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(url).spawn();
    #[cfg(windows)]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", url])
        .spawn();
    #[cfg(all(unix, not(target_os = "macos")))]
    let result = std::process::Command::new("xdg-open").arg(url).spawn();

    if let Err(e) = result {
        tracing::warn!("[Platform] Could not open browser for {}: {}", url, e);
    }
}
