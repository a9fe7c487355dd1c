//! Typed errors for the profile store, codec and packager.
//!
//! Data-integrity problems (a registry that will not parse, a package whose
//! header disagrees with its payload) are hard errors. "Not found" conditions
//! are reported as `Option`/no-ops by the store instead, so the variant for it
//! only appears where a caller asks for a profile explicitly.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostsError {
    /// The registry file exists but is not a valid profile list.
    #[error("Profile registry is corrupt: {path}: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An export package could not be decoded.
    #[error("Package is corrupt: {0}")]
    PackageCorrupt(String),

    /// A profile field would break the package grammar.
    #[error("Cannot export profile '{name}': {reason}")]
    Unexportable { name: String, reason: String },

    #[error("Profile '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid profile name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Profile '{0}' does not exist")]
    ProfileNotFound(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl HostsError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = HostsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_includes_context() {
        let err = HostsError::io(
            "Failed to read fragment",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "Failed to read fragment: gone");
    }

    #[test]
    fn test_duplicate_name_message() {
        let err = HostsError::DuplicateName("dev".to_string());
        assert_eq!(err.to_string(), "Profile 'dev' already exists");
    }
}
