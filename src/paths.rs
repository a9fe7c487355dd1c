use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

use crate::error::HostsError;

/// Overrides the data directory (default `~/.hostswap`)
pub const HOME_ENV: &str = "HOSTSWAP_HOME";
/// Overrides the hosts file that swaps are written to
pub const SYSTEM_HOSTS_ENV: &str = "HOSTSWAP_SYSTEM_HOSTS";

/// Directory under the data dir holding one fragment per profile
pub const HOSTS_SUBDIR: &str = "hosts";
/// Extension of profile fragment files
pub const FRAGMENT_EXT: &str = "host";
/// File stem of the global fragment inside the hosts directory
pub const GLOBAL_FRAGMENT_STEM: &str = "global";

/// All computed paths used by hostswap
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.hostswap
    pub base_dir: PathBuf,
    /// ~/.hostswap/hosts
    pub hosts_dir: PathBuf,
    /// ~/.hostswap/hosts/global.host
    pub global_host_file: PathBuf,
    /// ~/.hostswap/registry.json
    pub registry_file: PathBuf,
    /// /etc/hosts
    pub system_host_file: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dir = match std::env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => BaseDirs::new()
                .context("Failed to determine home directory")?
                .home_dir()
                .join(".hostswap"),
        };

        let system_host_file = match std::env::var_os(SYSTEM_HOSTS_ENV) {
            Some(file) => PathBuf::from(file),
            None => default_system_host_file(),
        };

        Ok(Self::with_base(base_dir, system_host_file))
    }

    /// Lay out every path relative to `base_dir`
    pub fn with_base(base_dir: PathBuf, system_host_file: PathBuf) -> Self {
        let hosts_dir = base_dir.join(HOSTS_SUBDIR);
        let global_host_file = hosts_dir.join(format!("{GLOBAL_FRAGMENT_STEM}.{FRAGMENT_EXT}"));
        let registry_file = base_dir.join("registry.json");

        Self {
            base_dir,
            hosts_dir,
            global_host_file,
            registry_file,
            system_host_file,
        }
    }

    /// Registry-relative path of a profile's fragment, e.g. `hosts/dev.host`
    pub fn fragment_relative(&self, name: &str) -> String {
        format!("{HOSTS_SUBDIR}/{name}.{FRAGMENT_EXT}")
    }

    /// Resolve a registry path against the data directory.
    ///
    /// Absolute paths (the pseudo-profiles) are returned as-is.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> Result<(), HostsError> {
        std::fs::create_dir_all(&self.hosts_dir).map_err(|e| {
            HostsError::io(
                format!("Failed to create hosts directory: {:?}", self.hosts_dir),
                e,
            )
        })
    }
}

#[cfg(windows)]
fn default_system_host_file() -> PathBuf {
    let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
    PathBuf::from(root).join("System32\\drivers\\etc\\hosts")
}

#[cfg(not(windows))]
fn default_system_host_file() -> PathBuf {
    PathBuf::from("/etc/hosts")
}

#[cfg(test)]
mod tests {
    use crate::test_utils::setup_test_paths;
    use tempfile::TempDir;

    #[test]
    fn test_layout_under_base() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        assert!(paths.hosts_dir.starts_with(&paths.base_dir));
        assert!(paths.global_host_file.ends_with("hosts/global.host"));
        assert!(paths.registry_file.ends_with("registry.json"));
    }

    #[test]
    fn test_fragment_relative_resolves_into_hosts_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let relative = paths.fragment_relative("dev");
        assert_eq!(relative, "hosts/dev.host");
        assert_eq!(paths.resolve(&relative), paths.hosts_dir.join("dev.host"));
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let absolute = paths.global_host_file.clone();
        assert_eq!(paths.resolve(&absolute), absolute);
    }

    #[test]
    fn test_ensure_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        paths.ensure_dirs().unwrap();
        assert!(paths.hosts_dir.is_dir());
    }
}
