//! Test utilities shared across test modules

use crate::paths::Paths;
use tempfile::TempDir;

/// Create a Paths struct for testing using a temporary directory
///
/// The data directory lives at `<tmp>/.hostswap` and the "system" hosts file
/// at `<tmp>/etc/hosts`, so swaps never touch the real machine.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths::with_base(
        temp_dir.path().join(".hostswap"),
        temp_dir.path().join("etc/hosts"),
    )
}
