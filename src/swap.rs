//! Profile swapping logic.
//!
//! This module implements the core mechanism of `hostswap`: rewriting the
//! system hosts file from the global fragment plus one selected profile.
//! It handles:
//! - Validating that the profile can be swapped in.
//! - Composing the banner, global entries and profile entries.
//! - Replacing the system hosts file via temp file + rename.
//! - Reading the banner back to tell which profile is active.
//!
//! A swap never returns the crate error type. Every outcome, good or bad,
//! carries a message meant to be printed as-is.

use chrono::Local;
use std::path::PathBuf;
use thiserror::Error;

use crate::error::{HostsError, Result};
use crate::fs_utils::{atomic_write, read_lossy};
use crate::paths::Paths;
use crate::profile::{GLOBAL_PROFILE_NAME, Profile};
use crate::store::ProfileStore;

const BANNER_RULE: &str = "##################################################################";
const ENVIRONMENT_SUFFIX: &str = " Environment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapSuccess {
    /// The global fragment alone was swapped in
    Reset,
    /// A regular profile was swapped in
    Applied,
}

impl SwapSuccess {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Reset => "Hosts file has been reset.",
            Self::Applied => "New hosts settings accepted.",
        }
    }
}

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Hosts file entry not found")]
    NotFound,

    #[error("Hosts file doesn't exist. ({})", .0.display())]
    FragmentMissing(PathBuf),

    #[error("Hosts file is marked as deleted.")]
    MarkedDeleted,

    #[error("{0}")]
    Write(HostsError),
}

/// Result of a swap, displayable regardless of variant
#[derive(Debug)]
pub struct SwapOutcome(pub std::result::Result<SwapSuccess, SwapError>);

impl SwapOutcome {
    pub fn message(&self) -> String {
        match &self.0 {
            Ok(success) => success.message().to_string(),
            Err(e) => e.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.0.is_ok()
    }
}

pub struct SwapEngine {
    paths: Paths,
    points_to_live: bool,
}

impl SwapEngine {
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            points_to_live: false,
        }
    }

    /// Auto-revert request of the last profile a write was attempted for
    ///
    /// Session teardown is left to whoever drives the engine.
    pub fn points_to_live(&self) -> bool {
        self.points_to_live
    }

    /// Write the system hosts file for `profile`
    pub fn swap(&mut self, profile: Option<&Profile>) -> SwapOutcome {
        let Some(profile) = profile else {
            return SwapOutcome(Err(SwapError::NotFound));
        };

        if !profile.absolute_path.exists() {
            return SwapOutcome(Err(SwapError::FragmentMissing(
                profile.absolute_path.clone(),
            )));
        }

        if profile.deleted {
            return SwapOutcome(Err(SwapError::MarkedDeleted));
        }

        let written = self
            .compose(profile)
            .and_then(|content| atomic_write(&self.paths.system_host_file, content));
        self.points_to_live = profile.auto_revert;

        match written {
            Ok(()) => {
                tracing::debug!(
                    profile = %profile.name,
                    target = %self.paths.system_host_file.display(),
                    "swapped hosts file"
                );
                if profile.is_global(&self.paths) {
                    SwapOutcome(Ok(SwapSuccess::Reset))
                } else {
                    SwapOutcome(Ok(SwapSuccess::Applied))
                }
            }
            Err(e) => SwapOutcome(Err(SwapError::Write(e))),
        }
    }

    /// Swap in the global fragment alone
    pub fn reset(&mut self) -> SwapOutcome {
        let global = Profile::global(&self.paths);
        self.swap(Some(&global))
    }

    fn compose(&self, profile: &Profile) -> Result<String> {
        let mut out = String::new();

        out.push_str(BANNER_RULE);
        out.push('\n');
        out.push_str("# This file was automatically generated by hostswap\n");
        out.push_str(&format!("# Date: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
        out.push_str(&format!(
            "# {}{ENVIRONMENT_SUFFIX}\n",
            profile.name.to_uppercase()
        ));
        out.push_str(BANNER_RULE);
        out.push('\n');
        out.push_str("\n\n");

        if let Some(global) = read_lossy(&self.paths.global_host_file)? {
            out.push_str(&global);
        }

        if !profile.is_global(&self.paths) {
            let fragment = read_lossy(&profile.absolute_path)?.ok_or_else(|| {
                HostsError::io(
                    format!("Failed to read fragment: {:?}", profile.absolute_path),
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                )
            })?;

            out.push_str("\n\n");
            out.push_str(BANNER_RULE);
            out.push('\n');
            out.push_str(&format!("# {}\n", profile.name));
            out.push_str(BANNER_RULE);
            out.push('\n');
            out.push_str(&fragment);
        }

        Ok(out)
    }
}

/// Work out which profile the system hosts file was last swapped to
///
/// Reads the environment line of the banner. Returns `None` for a hosts file
/// this tool didn't write or whose profile is gone or tombstoned.
pub fn current_profile(store: &mut ProfileStore) -> Result<Option<Profile>> {
    let paths = store.paths().clone();
    let Some(content) = read_lossy(&paths.system_host_file)? else {
        return Ok(None);
    };

    let Some(environment) = content.lines().nth(3).and_then(parse_environment_line) else {
        return Ok(None);
    };

    if environment == GLOBAL_PROFILE_NAME.to_uppercase() {
        return Ok(Some(Profile::global(&paths)));
    }

    Ok(store
        .list()?
        .iter()
        .find(|p| !p.deleted && p.name.to_uppercase() == environment)
        .cloned())
}

fn parse_environment_line(line: &str) -> Option<&str> {
    line.trim_end()
        .strip_prefix("# ")?
        .strip_suffix(ENVIRONMENT_SUFFIX)
}
