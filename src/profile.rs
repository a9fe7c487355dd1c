use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fs_utils::read_lossy;
use crate::paths::Paths;

/// Name addressing the global fragment that prefixes every swap
pub const GLOBAL_PROFILE_NAME: &str = "Global Host File";
/// Name addressing the active system hosts file itself
pub const SYSTEM_PROFILE_NAME: &str = "System Host File";

/// Returned by text lookups when no such profile exists
pub const NOT_FOUND_SENTINEL: &str = "#N/A#";

/// One named hosts file variant, as stored in `registry.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    /// Fragment location relative to the data directory
    pub path: PathBuf,

    /// Short glyph shown next to the name
    #[serde(default)]
    pub marker: String,

    /// Whether the surrounding session should revert the swap when it ends
    #[serde(default)]
    pub auto_revert: bool,

    /// Soft-delete tombstone
    #[serde(default)]
    pub deleted: bool,

    #[serde(skip)]
    pub absolute_path: PathBuf,

    /// Fragment text, `None` when the fragment file is missing
    #[serde(skip)]
    pub content: Option<String>,
}

impl Profile {
    pub fn new(paths: &Paths, name: &str, marker: &str, auto_revert: bool) -> Self {
        let path = PathBuf::from(paths.fragment_relative(name));
        Self {
            name: name.to_string(),
            absolute_path: paths.resolve(&path),
            path,
            marker: marker.to_string(),
            auto_revert,
            deleted: false,
            content: None,
        }
    }

    /// The global fragment, addressed as a profile with a fixed absolute path
    pub fn global(paths: &Paths) -> Self {
        Self {
            name: GLOBAL_PROFILE_NAME.to_string(),
            path: paths.global_host_file.clone(),
            marker: String::new(),
            auto_revert: false,
            deleted: false,
            absolute_path: paths.global_host_file.clone(),
            content: None,
        }
    }

    pub fn is_global(&self, paths: &Paths) -> bool {
        self.absolute_path == paths.global_host_file
    }

    /// Fill in the derived fields from disk
    ///
    /// An unreadable fragment leaves `content` as `None` and is only logged.
    pub fn hydrate(&mut self, paths: &Paths) {
        self.absolute_path = paths.resolve(&self.path);
        self.content = match read_lossy(&self.absolute_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(name = %self.name, error = %e, "could not read fragment");
                None
            }
        };
    }

    /// Point the profile at a new name and the matching fragment path
    pub fn rename_to(&mut self, paths: &Paths, new_name: &str) {
        self.name = new_name.to_string();
        self.path = PathBuf::from(paths.fragment_relative(new_name));
        self.absolute_path = paths.resolve(&self.path);
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// True for the two names that address fixed files rather than registry entries
pub fn is_pseudo_name(name: &str) -> bool {
    name == GLOBAL_PROFILE_NAME || name == SYSTEM_PROFILE_NAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_paths;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_profile_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let profile = Profile::new(&paths, "dev", "D", true);

        assert_eq!(profile.path, PathBuf::from("hosts/dev.host"));
        assert_eq!(profile.absolute_path, paths.hosts_dir.join("dev.host"));
        assert!(!profile.deleted);
        assert!(!profile.is_global(&paths));
    }

    #[test]
    fn test_global_profile() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        assert!(Profile::global(&paths).is_global(&paths));
    }

    #[test]
    fn test_hydrate_missing_fragment() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut profile = Profile::new(&paths, "qa", "Q", false);
        profile.absolute_path = PathBuf::new();

        profile.hydrate(&paths);
        assert_eq!(profile.absolute_path, paths.hosts_dir.join("qa.host"));
        assert!(profile.content.is_none());

        fs::create_dir_all(&paths.hosts_dir).unwrap();
        fs::write(&profile.absolute_path, "10.0.0.1 qa").unwrap();
        profile.hydrate(&paths);
        assert_eq!(profile.content.as_deref(), Some("10.0.0.1 qa"));
    }

    #[test]
    fn test_name_matches_ignores_case() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let profile = Profile::new(&paths, "Staging", "S", false);
        assert!(profile.name_matches("staging"));
        assert!(profile.name_matches("STAGING"));
        assert!(!profile.name_matches("stage"));
    }

    #[test]
    fn test_derived_fields_not_serialized() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut profile = Profile::new(&paths, "dev", "D", false);
        profile.content = Some("secret".to_string());

        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("absolute_path"));
    }

    #[test]
    fn test_pseudo_names() {
        assert!(is_pseudo_name(GLOBAL_PROFILE_NAME));
        assert!(is_pseudo_name(SYSTEM_PROFILE_NAME));
        assert!(!is_pseudo_name("global"));
    }
}
