//! Filesystem utility functions
//!
//! Whole-file replacement helpers shared by the registry, fragment and system
//! hosts writers.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HostsError, Result};

/// Write `contents` to `path` atomically
///
/// The data is written to a sibling temp file which is then renamed over the
/// target, so a crash leaves either the old file or the new one, never a
/// truncated mix. Missing parent directories are created.
pub fn atomic_write(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| HostsError::io(format!("Failed to create directory: {:?}", parent), e))?;
    }

    let temp_path = temp_sibling(path);
    fs::write(&temp_path, contents)
        .map_err(|e| HostsError::io(format!("Failed to write temp file: {:?}", temp_path), e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        // Best effort; the rename error is the one worth reporting
        let _ = fs::remove_file(&temp_path);
        HostsError::io(
            format!("Failed to rename {:?} -> {:?}", temp_path, path),
            e,
        )
    })
}

/// Move a file by copying it to `dst` and then deleting `src`
///
/// `dst` is overwritten if it exists. When the two paths differ only by case
/// they may be the same file on this filesystem, so a plain rename is used.
pub fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    if src.as_os_str().eq_ignore_ascii_case(dst.as_os_str()) {
        return fs::rename(src, dst)
            .map_err(|e| HostsError::io(format!("Failed to rename {:?} -> {:?}", src, dst), e));
    }

    fs::copy(src, dst)
        .map_err(|e| HostsError::io(format!("Failed to copy {:?} -> {:?}", src, dst), e))?;
    fs::remove_file(src).map_err(|e| HostsError::io(format!("Failed to remove {:?}", src), e))
}

/// Read a file, mapping "not found" to `None`
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HostsError::io(format!("Failed to read {:?}", path), e)),
    }
}

/// Read a file as text, replacing invalid UTF-8 with U+FFFD
///
/// "Not found" maps to `None`.
pub fn read_lossy(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), "file is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HostsError::io(format!("Failed to read {:?}", path), e)),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parents_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested/dir/file.json");

        atomic_write(&target, "[]").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "[]");
        assert!(!temp_dir.path().join("nested/dir/file.json.tmp").exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("hosts");
        fs::write(&target, "old content that is longer").unwrap();

        atomic_write(&target, "new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_copy_then_remove() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.host");
        let dst = temp_dir.path().join("b.host");
        fs::write(&src, "127.0.0.1 a").unwrap();

        copy_then_remove(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "127.0.0.1 a");
    }

    #[test]
    fn test_read_lossy_replaces_invalid_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.host");
        fs::write(&path, b"# caf\xe9\n127.0.0.1 a\n").unwrap();

        let text = read_lossy(&path).unwrap().unwrap();
        assert_eq!(text, "# caf\u{FFFD}\n127.0.0.1 a\n");
        assert!(read_lossy(&temp_dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn test_read_optional_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_optional(&temp_dir.path().join("nope")).unwrap().is_none());
    }
}
