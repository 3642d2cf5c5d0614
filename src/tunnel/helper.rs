//! Forwarding helper (adb) invocation

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command;

use crate::errors::{LinkError, Result};

/// Install location of the adb bundled with the Arduino board package
const ARDUINO_ADB_REL_PATH: &str = "packages/arduino/tools/adb/32.0.0/adb";

/// Installs and removes local-to-remote TCP forwards for one device
#[async_trait]
pub trait ForwardHelper: Send + Sync {
    /// Forward `tcp:<local_port>` on the host to `tcp:<remote_port>` on the device
    async fn forward(&self, hardware_id: &str, local_port: u16, remote_port: u16) -> Result<()>;

    /// Remove every forward rule installed for the device
    async fn remove_all(&self, hardware_id: &str) -> Result<()>;

    /// Resolved helper executable, if the helper is an external program
    fn executable(&self) -> Option<PathBuf> {
        None
    }
}

/// Helper backed by the `adb` executable
#[derive(Debug, Default)]
pub struct AdbHelper {
    explicit_path: Option<PathBuf>,
    located: OnceLock<Option<PathBuf>>,
}

impl AdbHelper {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self {
            explicit_path,
            located: OnceLock::new(),
        }
    }

    /// Resolve the adb executable. Computed once; the result never changes afterwards.
    pub fn locate(&self) -> Option<&Path> {
        self.located
            .get_or_init(|| match &self.explicit_path {
                Some(path) => Some(path.clone()),
                None => search_adb(),
            })
            .as_deref()
    }

    async fn run(&self, args: &[String]) -> Result<()> {
        let adb = self.locate().ok_or(LinkError::HelperNotFound)?;
        log::debug!("Running: {} {}", adb.display(), args.join(" "));

        let output = Command::new(adb)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    LinkError::HelperNotFound
                } else {
                    LinkError::Tunnel {
                        message: format!("failed to run {}: {}", adb.display(), e),
                        source: Some(e),
                    }
                }
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LinkError::tunnel(format!(
                "adb {} failed with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

#[async_trait]
impl ForwardHelper for AdbHelper {
    async fn forward(&self, hardware_id: &str, local_port: u16, remote_port: u16) -> Result<()> {
        self.run(&forward_args(hardware_id, local_port, remote_port))
            .await
    }

    async fn remove_all(&self, hardware_id: &str) -> Result<()> {
        self.run(&remove_all_args(hardware_id)).await
    }

    fn executable(&self) -> Option<PathBuf> {
        self.locate().map(Path::to_path_buf)
    }
}

pub fn forward_args(hardware_id: &str, local_port: u16, remote_port: u16) -> Vec<String> {
    vec![
        "-s".to_string(),
        hardware_id.to_string(),
        "forward".to_string(),
        format!("tcp:{}", local_port),
        format!("tcp:{}", remote_port),
    ]
}

pub fn remove_all_args(hardware_id: &str) -> Vec<String> {
    vec![
        "-s".to_string(),
        hardware_id.to_string(),
        "forward".to_string(),
        "--remove-all".to_string(),
    ]
}

/// Well-known adb locations for the current platform, in search order
pub fn well_known_adb_paths(home: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if cfg!(target_os = "macos") {
        paths.push(home.join("Library/Arduino15").join(ARDUINO_ADB_REL_PATH));
    } else if cfg!(target_os = "linux") {
        paths.push(home.join(".arduino15").join(ARDUINO_ADB_REL_PATH));
    } else if cfg!(target_os = "windows") {
        paths.push(
            home.join("AppData/Local/Arduino15")
                .join(format!("{}.exe", ARDUINO_ADB_REL_PATH)),
        );
    }

    paths
}

fn search_adb() -> Option<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        if let Some(found) = well_known_adb_paths(&home).into_iter().find(|p| p.is_file()) {
            log::debug!("Found adb at {}", found.display());
            return Some(found);
        }
    }

    match which::which("adb") {
        Ok(path) => {
            log::debug!("Found adb on PATH at {}", path.display());
            Some(path)
        }
        Err(_) => {
            log::warn!("adb not found in Arduino15 packages or on PATH");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_command_lines() {
        assert_eq!(
            forward_args("abc123", 8800, 8800).join(" "),
            "-s abc123 forward tcp:8800 tcp:8800"
        );
        assert_eq!(
            remove_all_args("abc123").join(" "),
            "-s abc123 forward --remove-all"
        );
    }

    #[test]
    fn test_explicit_path_is_memoized() {
        let helper = AdbHelper::new(Some(PathBuf::from("/opt/adb/adb")));
        assert_eq!(helper.locate(), Some(Path::new("/opt/adb/adb")));
        assert_eq!(helper.executable(), Some(PathBuf::from("/opt/adb/adb")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_well_known_paths_on_linux() {
        let paths = well_known_adb_paths(Path::new("/home/dev"));
        assert_eq!(
            paths,
            vec![PathBuf::from(
                "/home/dev/.arduino15/packages/arduino/tools/adb/32.0.0/adb"
            )]
        );
    }

    #[tokio::test]
    async fn test_missing_executable_reports_helper_not_found() {
        let helper = AdbHelper::new(Some(PathBuf::from("/nonexistent/bin/adb")));
        let err = helper.forward("abc123", 8800, 8800).await.unwrap_err();
        assert!(matches!(err, LinkError::HelperNotFound));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_tunnel_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("adb");
        std::fs::write(&script, "#!/bin/sh\necho 'device not found' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let helper = AdbHelper::new(Some(script));
        let err = helper.forward("abc123", 8800, 8800).await.unwrap_err();
        match err {
            LinkError::Tunnel { message, .. } => assert!(message.contains("device not found")),
            other => panic!("Expected Tunnel error, got: {:?}", other),
        }
    }
}
