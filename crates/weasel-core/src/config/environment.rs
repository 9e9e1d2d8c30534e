//! Host environment probing
//!
//! Under WSL the slow side belongs to a Windows user whose profile directory
//! is the natural home for shared state. Outside WSL, or when that lookup
//! fails, the local home directory is used.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Whether we are running inside WSL.
pub fn is_wsl() -> bool {
    if std::env::var_os("WSL_DISTRO_NAME").is_some() {
        return true;
    }
    fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|release| release.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}

/// Home directory of the user owning the slow side.
pub fn host_home() -> Option<PathBuf> {
    if is_wsl() {
        match windows_profile() {
            Some(profile) => return Some(profile),
            None => tracing::debug!("Windows profile lookup failed, using local home"),
        }
    }
    dirs::home_dir()
}

/// `%USERPROFILE%` translated to a WSL path.
fn windows_profile() -> Option<PathBuf> {
    let mut echo = Command::new("cmd.exe");
    echo.args(["/c", "echo", "%USERPROFILE%"]);
    // cmd.exe complains about UNC working directories
    if Path::new("/mnt/c").is_dir() {
        echo.current_dir("/mnt/c");
    }
    let output = echo.output().ok()?;
    if !output.status.success() {
        return None;
    }
    let profile = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if profile.is_empty() || profile.contains('%') {
        return None;
    }

    let output = Command::new("wslpath").args(["-u", &profile]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then(|| PathBuf::from(path))
}
