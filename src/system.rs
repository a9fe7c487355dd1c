//! Side effects outside the data directory.
//!
//! Flushing the resolver cache, launching an editor and adding the tool to
//! `PATH` all shell out to platform programs. None of them can fail a
//! command: errors are logged and dropped.

use std::path::Path;
use std::process::{Command, Stdio};

/// Outcome of [`register_on_path`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRegistration {
    AlreadyPresent,
    Requested,
    Unsupported,
}

/// Set to any value to skip resolver cache flushes
pub const NO_FLUSH_ENV: &str = "HOSTSWAP_NO_FLUSH";

/// Ask the OS to drop its cached name resolutions
pub fn flush_dns() {
    if !flush_enabled() {
        tracing::debug!("DNS flush disabled");
        return;
    }
    for (program, args) in FLUSH_COMMANDS {
        run_quietly(program, args);
    }
}

fn flush_enabled() -> bool {
    !cfg!(test) && std::env::var_os(NO_FLUSH_ENV).is_none()
}

#[cfg(windows)]
const FLUSH_COMMANDS: &[(&str, &[&str])] = &[("ipconfig", &["/flushdns"])];

#[cfg(target_os = "macos")]
const FLUSH_COMMANDS: &[(&str, &[&str])] = &[
    ("dscacheutil", &["-flushcache"]),
    ("killall", &["-HUP", "mDNSResponder"]),
];

#[cfg(not(any(windows, target_os = "macos")))]
const FLUSH_COMMANDS: &[(&str, &[&str])] = &[("resolvectl", &["flush-caches"])];

/// Open a file in the user's editor and wait for it to close
///
/// Uses `$VISUAL` or `$EDITOR`, falling back to the platform's text editor.
pub fn open_in_editor(path: &Path) {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .ok()
        .filter(|e| !e.trim().is_empty());

    let mut command = match editor {
        Some(editor) => Command::new(editor),
        None => default_editor(),
    };
    command.arg(path);

    match command.status() {
        Ok(status) if status.success() => {
            tracing::debug!(path = %path.display(), "editor closed");
        }
        Ok(status) => {
            tracing::warn!(path = %path.display(), %status, "editor exited with non-zero status");
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to launch editor");
        }
    }
}

#[cfg(windows)]
fn default_editor() -> Command {
    Command::new("notepad")
}

#[cfg(target_os = "macos")]
fn default_editor() -> Command {
    let mut command = Command::new("open");
    command.arg("-W").arg("-t");
    command
}

#[cfg(not(any(windows, target_os = "macos")))]
fn default_editor() -> Command {
    Command::new("vi")
}

/// Append `dir` to the persistent user `PATH`
///
/// Only Windows has a persistent, process-external `PATH` to edit; elsewhere
/// the caller is expected to print shell instructions instead.
pub fn register_on_path(dir: &Path) -> PathRegistration {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let present = std::env::split_paths(&current).any(|entry| same_dir(&entry, dir));
    if present {
        return PathRegistration::AlreadyPresent;
    }

    if !cfg!(windows) {
        tracing::debug!(dir = %dir.display(), "persistent PATH changes are not supported here");
        return PathRegistration::Unsupported;
    }

    let mut entries: Vec<_> = std::env::split_paths(&current).collect();
    entries.push(dir.to_path_buf());
    match std::env::join_paths(entries) {
        Ok(joined) => {
            let value = joined.to_string_lossy().into_owned();
            run_quietly("setx", &["PATH", value.as_str()]);
        }
        Err(e) => tracing::warn!(error = %e, "could not build new PATH value"),
    }
    PathRegistration::Requested
}

fn same_dir(a: &Path, b: &Path) -> bool {
    let trim = |p: &Path| {
        p.to_string_lossy()
            .trim_end_matches(['/', '\\'])
            .to_lowercase()
    };
    trim(a) == trim(b)
}

fn run_quietly(program: &str, args: &[&str]) {
    let result = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(status) if status.success() => tracing::debug!(program, "external command succeeded"),
        Ok(status) => tracing::warn!(program, %status, "external command failed"),
        Err(e) => tracing::warn!(program, error = %e, "failed to run external command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_dir_ignores_trailing_separator_and_case() {
        assert!(same_dir(Path::new("/opt/hostswap/"), Path::new("/opt/hostswap")));
        assert!(same_dir(Path::new("C:\\Tools\\"), Path::new("c:\\tools")));
        assert!(!same_dir(Path::new("/opt/a"), Path::new("/opt/b")));
    }

    #[test]
    fn test_flush_disabled_under_test() {
        assert!(!flush_enabled());
        flush_dns();
    }

    #[test]
    fn test_missing_program_is_swallowed() {
        run_quietly("hostswap-definitely-not-a-real-program", &[]);
    }

    #[test]
    fn test_register_on_path_detects_existing_entry() {
        let current = std::env::var_os("PATH").unwrap_or_default();
        if let Some(first) = std::env::split_paths(&current).next() {
            assert_eq!(register_on_path(&first), PathRegistration::AlreadyPresent);
        }
    }
}
