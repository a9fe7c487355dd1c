//! Import/export of profile packages.
//!
//! A package is the [`encode_package`] form of
//! `record ("|" record)*` where each record is
//! `name~marker~relpath~autorevert~base64(content)`. Content is base64
//! encoded so delimiters inside hosts entries cannot break the grammar.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::codec::{decode_package, encode_package};
use crate::error::{HostsError, Result};
use crate::fs_utils::atomic_write;
use crate::paths::{FRAGMENT_EXT, GLOBAL_FRAGMENT_STEM, HOSTS_SUBDIR};
use crate::profile::Profile;
use crate::store::{ProfileStore, validate_profile_name};

const RECORD_SEPARATOR: &str = "|";
const FIELD_SEPARATOR: &str = "~";
const FIELD_COUNT: usize = 5;
const DEFAULT_MARKER: &str = "?";

/// Counts reported back by [`import`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records read across all packages
    pub records: usize,
    /// Records appended to the registry
    pub added: usize,
}

/// Bundle the named profiles into `out_file`
///
/// Unknown names are skipped. Returns how many profiles were written.
pub fn export<S: AsRef<str>>(store: &mut ProfileStore, names: &[S], out_file: &Path) -> Result<usize> {
    let mut records = Vec::new();

    for name in names {
        let name = name.as_ref();
        let Some(profile) = store.find(name)? else {
            tracing::debug!(name, "skipping unknown profile during export");
            continue;
        };
        records.push(encode_record(profile)?);
    }

    let package = encode_package(&records.join(RECORD_SEPARATOR))?;
    atomic_write(out_file, package)?;

    tracing::debug!(path = %out_file.display(), count = records.len(), "exported package");
    Ok(records.len())
}

/// Restore profiles from one or more package files
///
/// A record is added to the registry only when its fragment file already
/// exists and no record claims that path. The fragment content is written in
/// every case. The registry is saved once at the end; the first bad package
/// aborts the whole batch.
pub fn import<P: AsRef<Path>>(store: &mut ProfileStore, files: &[P]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for file in files {
        let file = file.as_ref();
        let bytes = fs::read(file)
            .map_err(|e| HostsError::io(format!("Failed to read package: {:?}", file), e))?;
        let text = decode_package(&bytes)?;

        if text.is_empty() {
            tracing::debug!(path = %file.display(), "empty package");
            continue;
        }

        for record in text.split(RECORD_SEPARATOR) {
            let record = decode_record(record)?;
            let target = store.paths().resolve(&record.path);
            summary.records += 1;

            if target.exists() && !store.claims_path(&record.path)? {
                tracing::debug!(name = %record.name, path = %record.path.display(), "registering imported profile");
                store.push(Profile {
                    name: record.name,
                    path: record.path,
                    marker: record.marker,
                    auto_revert: record.auto_revert,
                    deleted: false,
                    absolute_path: target.clone(),
                    content: Some(record.content.clone()),
                })?;
                summary.added += 1;
            }

            atomic_write(&target, &record.content)?;
        }
    }

    store.persist()?;
    Ok(summary)
}

fn encode_record(profile: &Profile) -> Result<String> {
    let path = profile.path.to_string_lossy().replace('\\', "/");
    for (field, value) in [("name", profile.name.as_str()), ("marker", profile.marker.as_str()), ("path", path.as_str())] {
        if value.contains(FIELD_SEPARATOR) || value.contains(RECORD_SEPARATOR) {
            return Err(HostsError::Unexportable {
                name: profile.name.clone(),
                reason: format!("{field} contains '{FIELD_SEPARATOR}' or '{RECORD_SEPARATOR}'"),
            });
        }
    }

    let content = match &profile.content {
        Some(content) => content.clone(),
        None => fs::read_to_string(&profile.absolute_path).map_err(|e| {
            HostsError::io(format!("Failed to read fragment: {:?}", profile.absolute_path), e)
        })?,
    };

    Ok([
        profile.name.clone(),
        profile.marker.clone(),
        path,
        profile.auto_revert.to_string(),
        BASE64.encode(content),
    ]
    .join(FIELD_SEPARATOR))
}

struct PackageRecord {
    name: String,
    marker: String,
    path: PathBuf,
    auto_revert: bool,
    content: String,
}

fn decode_record(record: &str) -> Result<PackageRecord> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    let &[name, marker, path, auto_revert, content] = fields.as_slice() else {
        return Err(HostsError::PackageCorrupt(format!(
            "expected {FIELD_COUNT} fields per record, found {}",
            fields.len()
        )));
    };
    validate_profile_name(name)?;

    let marker = match marker.trim() {
        "" => DEFAULT_MARKER,
        trimmed => trimmed,
    };

    let content = BASE64
        .decode(content)
        .map_err(|e| HostsError::PackageCorrupt(format!("content of '{name}' is not base64: {e}")))?;
    let content = String::from_utf8(content)
        .map_err(|e| HostsError::PackageCorrupt(format!("content of '{name}' is not UTF-8: {e}")))?;

    Ok(PackageRecord {
        name: name.to_string(),
        marker: marker.to_string(),
        path: relative_fragment_path(path)?,
        auto_revert: parse_flag(auto_revert)?,
        content,
    })
}

/// Accept only `hosts/<file>.host`, never the global fragment
fn relative_fragment_path(raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    let components: Vec<Component> = path.components().collect();

    let file_name = match components.as_slice() {
        [Component::Normal(dir), Component::Normal(file)] if dir.to_str() == Some(HOSTS_SUBDIR) => {
            Path::new(*file)
        }
        _ => {
            return Err(HostsError::PackageCorrupt(format!(
                "fragment path '{raw}' must be {HOSTS_SUBDIR}/<name>.{FRAGMENT_EXT}"
            )));
        }
    };

    let is_fragment = file_name
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAGMENT_EXT));
    let is_global = file_name
        .file_stem()
        .is_some_and(|stem| stem.eq_ignore_ascii_case(GLOBAL_FRAGMENT_STEM));

    if !is_fragment || is_global {
        return Err(HostsError::PackageCorrupt(format!(
            "fragment path '{raw}' does not name a profile fragment"
        )));
    }
    Ok(PathBuf::from(raw))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim() {
        "" => Ok(false),
        s if s.eq_ignore_ascii_case("true") => Ok(true),
        s if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(HostsError::PackageCorrupt(format!(
            "auto-revert flag '{other}' is not a boolean"
        ))),
    }
}
