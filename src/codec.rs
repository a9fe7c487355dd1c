//! Serialization codec.
//!
//! Two formats live here:
//! - the registry, a pretty-printed JSON array of [`Profile`] records;
//! - the export package, `[u32 LE uncompressed length][gzip stream]`.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{HostsError, Result};
use crate::fs_utils::{atomic_write, read_optional};
use crate::profile::Profile;

const LENGTH_HEADER: usize = 4;
/// Upper bound on what an untrusted length header may pre-allocate
const MAX_PREALLOC: usize = 1 << 20;

/// Load the profile list, returning an empty list if the file doesn't exist
pub fn load_registry(path: &Path) -> Result<Vec<Profile>> {
    let Some(content) = read_optional(path)? else {
        return Ok(Vec::new());
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|source| HostsError::CorruptStore {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the profile list atomically
pub fn save_registry(profiles: &[Profile], path: &Path) -> Result<()> {
    let content =
        serde_json::to_string_pretty(profiles).map_err(|source| HostsError::CorruptStore {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), count = profiles.len(), "saving registry");
    atomic_write(path, content)
}

/// Compress `text`, prefixed with its uncompressed byte length
pub fn encode_package(text: &str) -> Result<Vec<u8>> {
    let raw = text.as_bytes();
    let length = u32::try_from(raw.len())
        .map_err(|_| HostsError::PackageCorrupt(format!("payload too large: {} bytes", raw.len())))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .map_err(|e| HostsError::io("Failed to compress package", e))?;
    let compressed = encoder
        .finish()
        .map_err(|e| HostsError::io("Failed to compress package", e))?;

    let mut out = Vec::with_capacity(LENGTH_HEADER + compressed.len());
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Inverse of [`encode_package`]
pub fn decode_package(bytes: &[u8]) -> Result<String> {
    if bytes.len() < LENGTH_HEADER {
        return Err(HostsError::PackageCorrupt(format!(
            "expected at least {LENGTH_HEADER} header bytes, got {}",
            bytes.len()
        )));
    }

    let (header, body) = bytes.split_at(LENGTH_HEADER);
    let mut length_bytes = [0u8; LENGTH_HEADER];
    length_bytes.copy_from_slice(header);
    let expected = u32::from_le_bytes(length_bytes) as usize;

    // One byte past the declared length is enough to detect a mismatch
    let mut buffer = Vec::with_capacity(expected.min(MAX_PREALLOC));
    GzDecoder::new(body)
        .take(expected as u64 + 1)
        .read_to_end(&mut buffer)
        .map_err(|e| HostsError::PackageCorrupt(format!("invalid compressed stream: {e}")))?;

    if buffer.len() != expected {
        return Err(HostsError::PackageCorrupt(format!(
            "header declares {expected} bytes but payload has {}",
            buffer.len()
        )));
    }

    String::from_utf8(buffer)
        .map_err(|e| HostsError::PackageCorrupt(format!("payload is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_paths;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_registry_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let profiles = load_registry(&temp_dir.path().join("registry.json")).unwrap();
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_load_registry_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("registry.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_registry(&path).unwrap_err();
        assert!(matches!(err, HostsError::CorruptStore { .. }));
    }

    #[test]
    fn test_save_and_load_registry_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut deleted = Profile::new(&paths, "b", "2", true);
        deleted.deleted = true;
        let profiles = vec![
            Profile::new(&paths, "c", "3", false),
            Profile::new(&paths, "a", "1", false),
            deleted,
        ];

        save_registry(&profiles, &paths.registry_file).unwrap();
        let loaded = load_registry(&paths.registry_file).unwrap();

        let names: Vec<_> = loaded.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert!(loaded[2].deleted);
        assert!(loaded[2].auto_revert);
        assert_eq!(loaded[1].marker, "1");
    }

    #[test]
    fn test_package_round_trip_with_delimiters() {
        for text in ["", "plain", "a~b|c~~||", "127.0.0.1 dev.local\n# café ✓"] {
            let encoded = encode_package(text).unwrap();
            assert_eq!(decode_package(&encoded).unwrap(), text);
        }
    }

    #[test]
    fn test_package_header_is_uncompressed_length() {
        let text = "x".repeat(1000);
        let encoded = encode_package(&text).unwrap();
        assert_eq!(&encoded[..4], &1000u32.to_le_bytes());
        assert!(encoded.len() < 1000);
    }

    #[test]
    fn test_decode_package_length_mismatch() {
        let mut encoded = encode_package("hello").unwrap();
        encoded[..4].copy_from_slice(&6u32.to_le_bytes());

        let err = decode_package(&encoded).unwrap_err();
        assert!(matches!(err, HostsError::PackageCorrupt(_)));
    }

    #[test]
    fn test_decode_package_stops_at_declared_length() {
        let big = "0".repeat(4 << 20);
        let mut encoded = encode_package(&big).unwrap();
        encoded[..4].copy_from_slice(&16u32.to_le_bytes());

        let err = decode_package(&encoded).unwrap_err();
        match err {
            HostsError::PackageCorrupt(msg) => assert!(msg.contains("payload has 17")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_package_too_short() {
        assert!(matches!(
            decode_package(&[1, 0]),
            Err(HostsError::PackageCorrupt(_))
        ));
    }

    #[test]
    fn test_decode_package_garbage_body() {
        let mut bytes = 4u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"not gzip at all");
        assert!(matches!(
            decode_package(&bytes),
            Err(HostsError::PackageCorrupt(_))
        ));
    }
}
