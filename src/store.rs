//! Profile store.
//!
//! Owns the registry of profiles for one process run:
//! - lazily loads `registry.json` on first access
//! - hydrates each profile with its fragment content
//! - persists after every mutation and then reloads from disk, so the
//!   in-memory list never drifts from what another writer left behind
//!
//! There is no locking around the registry or the fragment files. Two
//! invocations mutating the store at the same time can lose each other's
//! writes; the last save wins.

use std::fs;
use std::path::Path;

use crate::codec::{load_registry, save_registry};
use crate::error::{HostsError, Result};
use crate::fs_utils::{atomic_write, copy_then_remove};
use crate::paths::Paths;
use crate::profile::{NOT_FOUND_SENTINEL, Profile, is_pseudo_name};

pub struct ProfileStore {
    paths: Paths,
    profiles: Option<Vec<Profile>>,
}

impl ProfileStore {
    /// Open the store, creating the data layout on first run
    ///
    /// The registry itself is not read until something asks for it.
    pub fn open(paths: Paths) -> Result<Self> {
        paths.ensure_dirs()?;

        if !paths.global_host_file.exists() {
            tracing::debug!(path = %paths.global_host_file.display(), "creating global fragment");
            atomic_write(&paths.global_host_file, "")?;
        }

        if !paths.registry_file.exists() {
            tracing::debug!(path = %paths.registry_file.display(), "creating empty registry");
            save_registry(&[], &paths.registry_file)?;
        }

        Ok(Self {
            paths,
            profiles: None,
        })
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// All profiles in registry order, tombstoned ones included
    pub fn list(&mut self) -> Result<&[Profile]> {
        Ok(self.loaded()?.as_slice())
    }

    /// Case-insensitive lookup by name
    pub fn find(&mut self, name: &str) -> Result<Option<&Profile>> {
        Ok(self.loaded()?.iter().find(|p| p.name_matches(name)))
    }

    /// Create a profile and write its fragment
    pub fn create(
        &mut self,
        name: &str,
        marker: &str,
        auto_revert: bool,
        content: &str,
    ) -> Result<()> {
        validate_profile_name(name)?;

        if self.find(name)?.is_some() {
            return Err(HostsError::DuplicateName(name.to_string()));
        }

        let mut profile = Profile::new(&self.paths, name, marker, auto_revert);
        atomic_write(&profile.absolute_path, content)?;
        profile.content = Some(content.to_string());

        tracing::debug!(name, path = %profile.path.display(), "created profile");
        self.loaded()?.push(profile);
        self.persist()
    }

    /// Update a profile's name, marker, auto-revert flag and content
    ///
    /// An empty `marker` keeps the current marker and auto-revert flag. The
    /// pseudo-profile names bypass the registry and write straight to the
    /// global fragment or, for names starting with `System`, the system hosts
    /// file. A profile whose fragment has vanished from disk is dropped from
    /// the registry instead of being updated.
    pub fn edit(
        &mut self,
        old_name: &str,
        new_name: &str,
        marker: &str,
        auto_revert: bool,
        content: &str,
    ) -> Result<()> {
        if is_pseudo_name(old_name) || is_pseudo_name(new_name) {
            let target = if new_name.starts_with("System") {
                &self.paths.system_host_file
            } else {
                &self.paths.global_host_file
            };
            tracing::debug!(path = %target.display(), "writing fixed hosts file");
            return atomic_write(target, content);
        }

        validate_profile_name(new_name)?;

        let paths = self.paths.clone();
        let profiles = self.loaded()?;
        let Some(index) = profiles.iter().position(|p| p.name_matches(old_name)) else {
            tracing::debug!(old_name, "edit of unknown profile ignored");
            return Ok(());
        };

        let old_file = profiles[index].absolute_path.clone();
        if !old_file.exists() {
            tracing::warn!(
                name = %profiles[index].name,
                path = %old_file.display(),
                "fragment missing on disk, dropping profile from registry"
            );
            profiles.remove(index);
            return self.persist();
        }

        let profile = &mut profiles[index];
        profile.rename_to(&paths, new_name);
        if !marker.is_empty() {
            profile.marker = marker.to_string();
            profile.auto_revert = auto_revert;
        }
        profile.content = Some(content.to_string());

        let new_file = profile.absolute_path.clone();
        if new_file != old_file {
            copy_then_remove(&old_file, &new_file)?;
        }
        atomic_write(&new_file, content)?;

        self.persist()
    }

    /// Rename a profile, keeping its marker, flag and content
    ///
    /// Uniqueness of `new_name` is not checked here.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        validate_profile_name(new_name)?;

        let Some(profile) = self.find(old_name)? else {
            return Err(HostsError::ProfileNotFound(old_name.to_string()));
        };
        let current_name = profile.name.clone();
        let content = profile.content.clone().unwrap_or_default();

        self.edit(&current_name, new_name, "", false, &content)
    }

    /// Set or clear the soft-delete tombstone
    ///
    /// Returns whether a record changed.
    pub fn soft_delete(&mut self, name: &str, flag: bool) -> Result<bool> {
        let profiles = self.loaded()?;
        let Some(profile) = profiles
            .iter_mut()
            .find(|p| p.name_matches(name) && p.deleted != flag)
        else {
            return Ok(false);
        };

        profile.deleted = flag;
        tracing::debug!(name, deleted = flag, "updated tombstone");
        self.persist()?;
        Ok(true)
    }

    /// Permanently remove a profile that was already soft-deleted
    ///
    /// Live profiles are left alone. Returns whether a record was removed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let profiles = self.loaded()?;
        let Some(index) = profiles
            .iter()
            .position(|p| p.name_matches(name) && p.deleted)
        else {
            return Ok(false);
        };

        let path = profiles[index].absolute_path.clone();
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| HostsError::io(format!("Failed to remove fragment: {:?}", path), e))?;
        }
        profiles.remove(index);

        tracing::debug!(name, "deleted profile");
        self.persist()?;
        Ok(true)
    }

    /// Fragment text of a profile, `None` if there is no such profile or its
    /// fragment is missing
    pub fn get_content(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.find(name)?.and_then(|p| p.content.clone()))
    }

    /// [`get_content`](Self::get_content) with the `#N/A#` sentinel in place of `None`
    pub fn content_or_sentinel(&mut self, name: &str) -> Result<String> {
        Ok(self
            .get_content(name)?
            .unwrap_or_else(|| NOT_FOUND_SENTINEL.to_string()))
    }

    /// Whether any record's fragment lives at `relative`
    pub(crate) fn claims_path(&mut self, relative: &Path) -> Result<bool> {
        Ok(self.loaded()?.iter().any(|p| p.path == relative))
    }

    /// Append a record without persisting
    pub(crate) fn push(&mut self, profile: Profile) -> Result<()> {
        self.loaded()?.push(profile);
        Ok(())
    }

    /// Save the in-memory list, then replace it with a fresh load
    pub(crate) fn persist(&mut self) -> Result<()> {
        if let Some(profiles) = &self.profiles {
            save_registry(profiles, &self.paths.registry_file)?;
        }
        self.profiles = Some(self.load()?);
        Ok(())
    }

    fn loaded(&mut self) -> Result<&mut Vec<Profile>> {
        if self.profiles.is_none() {
            self.profiles = Some(self.load()?);
        }
        Ok(self.profiles.get_or_insert_with(Vec::new))
    }

    fn load(&self) -> Result<Vec<Profile>> {
        let mut profiles = load_registry(&self.paths.registry_file)?;
        for profile in &mut profiles {
            profile.hydrate(&self.paths);
        }
        Ok(profiles)
    }
}

/// Validate profile name
///
/// The name doubles as the fragment file name, so it can't be empty or carry
/// path separators or `..`. `global` and the pseudo-profile names are taken.
pub fn validate_profile_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(HostsError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.trim().is_empty() {
        return invalid("name cannot be empty");
    }

    if name.contains(['/', '\\']) {
        return invalid("name cannot contain path separators");
    }

    if name.contains("..") {
        return invalid("name cannot contain '..'");
    }

    if name.eq_ignore_ascii_case("global") || is_pseudo_name(name) {
        return invalid("name is reserved");
    }

    Ok(())
}
