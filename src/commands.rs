//! High-level command orchestration for the CLI.
//!
//! Each function here corresponds to a subcommand in `main.rs`. Handlers take
//! the process's single [`ProfileStore`] by `&mut` and coordinate:
//! - `crate::store` for profile CRUD
//! - `crate::swap` for activation
//! - `crate::package` for import/export
//! - `crate::system` for editor, DNS flush and PATH side effects
//! - `crate::ui` for output

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use comfy_table::Color;
use std::path::{Path, PathBuf};

use crate::package;
use crate::store::ProfileStore;
use crate::swap::{SwapEngine, current_profile};
use crate::system::{self, PathRegistration};
use crate::ui::Ui;

const LIST_HINT: &str = "Hint: Use 'hostswap list' to see available hosts files.";

/// What `info` prints beyond the active profile's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InfoDetail {
    /// Also print the active profile's entries
    All,
    /// Print the system hosts file as written
    Sys,
}

/// Show which hosts file is active
pub fn info(store: &mut ProfileStore, ui: &Ui, detail: Option<InfoDetail>) -> Result<()> {
    if detail == Some(InfoDetail::Sys) {
        let system = store.paths().system_host_file.clone();
        let content = std::fs::read_to_string(&system)
            .with_context(|| format!("Failed to read system hosts file: {}", system.display()))?;
        ui.section(system.display().to_string());
        ui.println("=".repeat(79));
        ui.println(content);
        return Ok(());
    }

    let current = match current_profile(store) {
        Ok(current) => current,
        Err(e) => {
            tracing::debug!(error = %e, "could not determine active hosts file");
            None
        }
    };

    let Some(profile) = current else {
        ui.warn("Unknown hosts file.");
        return Ok(());
    };

    ui.println(format!("Current hosts file is {}.", ui.bold(&profile.name)));

    if detail == Some(InfoDetail::All) {
        let content = std::fs::read_to_string(&profile.absolute_path).with_context(|| {
            format!("Failed to read hosts file: {}", profile.absolute_path.display())
        })?;
        ui.println("=".repeat(79));
        ui.println(content);
    }

    Ok(())
}

/// Add the executable's directory to the persistent PATH
pub fn setenv(ui: &Ui) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate the hostswap executable")?;
    let Some(dir) = exe.parent() else {
        bail!("Executable path has no parent directory: {}", exe.display());
    };

    match system::register_on_path(dir) {
        PathRegistration::AlreadyPresent => ui.ok(format!("{} is already on PATH.", dir.display())),
        PathRegistration::Requested => ui.ok("Environment path has been set."),
        PathRegistration::Unsupported => {
            ui.info("Add this line to your shell profile:");
            ui.println(format!("  export PATH=\"$PATH:{}\"", dir.display()));
        }
    }
    Ok(())
}

pub fn flush(ui: &Ui) -> Result<()> {
    system::flush_dns();
    ui.ok("Flush DNS completed.");
    Ok(())
}

/// List all hosts files, tombstoned ones included
pub fn list(store: &mut ProfileStore, ui: &Ui) -> Result<()> {
    let active = current_profile(store).ok().flatten().map(|p| p.name);
    let profiles = store.list()?;

    if profiles.is_empty() {
        ui.warn("No hosts files found.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {} new <name>", ui.bold("hostswap")));
        return Ok(());
    }

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Hosts File"),
        ui.header_cell("Marker"),
        ui.header_cell("Auto-revert"),
        ui.header_cell("Status"),
    ]);

    for profile in profiles {
        let is_active = active.as_deref() == Some(profile.name.as_str());
        let status = if profile.deleted {
            ui.colored_cell("[deleted]", Color::Red)
        } else if profile.content.is_none() {
            ui.colored_cell("missing", Color::Yellow)
        } else if is_active {
            ui.colored_cell("active", Color::Green)
        } else {
            ui.cell("-")
        };

        table.add_row(vec![
            ui.cell(if is_active { ui.icon_ok() } else { " " }),
            ui.cell(&profile.name),
            ui.cell(&profile.marker),
            ui.cell(if profile.auto_revert { "yes" } else { "no" }),
            status,
        ]);
    }

    ui.section("Hosts Files");
    ui.println(table.to_string());
    Ok(())
}

/// Swap the global fragment alone into the system hosts file
pub fn reset(store: &mut ProfileStore, ui: &Ui) -> Result<()> {
    let mut engine = SwapEngine::new(store.paths().clone());
    let spinner = ui.spinner("Resetting hosts file...");
    let outcome = engine.reset();
    finish_swap(ui, &spinner, outcome.0)
}

/// Swap a profile into the system hosts file
pub fn change(store: &mut ProfileStore, ui: &Ui, name: &str) -> Result<()> {
    let mut engine = SwapEngine::new(store.paths().clone());
    let spinner = ui.spinner(format!("Switching to '{}'...", name));
    let outcome = engine.swap(store.find(name)?);
    finish_swap(ui, &spinner, outcome.0)?;

    if engine.points_to_live() {
        ui.info(format!(
            "'{}' asks to be reverted when the session ends; run 'hostswap reset' when done.",
            name
        ));
    }
    Ok(())
}

fn finish_swap(
    ui: &Ui,
    spinner: &indicatif::ProgressBar,
    result: std::result::Result<crate::swap::SwapSuccess, crate::swap::SwapError>,
) -> Result<()> {
    match result {
        Ok(success) => {
            system::flush_dns();
            ui.spinner_finish(spinner, success.message());
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e.into())
        }
    }
}

/// Create a hosts file, prompting for whatever wasn't given on the command line
pub fn new(
    store: &mut ProfileStore,
    ui: &Ui,
    name: &str,
    marker: Option<String>,
    auto_revert: bool,
    open_editor: bool,
) -> Result<()> {
    let (marker, auto_revert) = match marker {
        Some(marker) => (marker, auto_revert),
        None => prompt_settings()?,
    };

    store
        .create(name, marker.trim(), auto_revert, "")
        .with_context(|| format!("Failed to create hosts file '{}'", name))?;
    ui.ok(format!("New hosts file [{}] created.", name));

    if open_editor {
        let path = match store.find(name)? {
            Some(profile) => profile.absolute_path.clone(),
            None => bail!("Hosts file '{}' was not saved", name),
        };
        system::open_in_editor(&path);
    }
    Ok(())
}

fn prompt_settings() -> Result<(String, bool)> {
    let marker = inquire::Text::new("Display marker:")
        .with_help_message("A short glyph shown next to the name")
        .prompt()
        .context("Prompt cancelled")?;

    let auto_revert = inquire::Confirm::new("Reset automatically when the session ends?")
        .with_default(false)
        .prompt()
        .context("Prompt cancelled")?;

    Ok((marker, auto_revert))
}

/// Open a hosts file in the editor; `global` and `temp` address the global
/// fragment and the system hosts file
pub fn edit(store: &mut ProfileStore, ui: &Ui, target: &str) -> Result<()> {
    let path: PathBuf = match target.to_lowercase().as_str() {
        "global" => store.paths().global_host_file.clone(),
        "temp" => store.paths().system_host_file.clone(),
        _ => match store.find(target)? {
            Some(profile) => profile.absolute_path.clone(),
            None => bail!("Hosts file '{}' doesn't exist.\n{}", target, LIST_HINT),
        },
    };

    system::open_in_editor(&path);
    ui.ok(format!("Opened {} in editor", path.display()));
    Ok(())
}

/// Permanently delete a hosts file that was removed first
pub fn delete(store: &mut ProfileStore, ui: &Ui, name: &str, force: bool) -> Result<()> {
    let Some(profile) = store.find(name)? else {
        bail!("Hosts file '{}' doesn't exist.\n{}", name, LIST_HINT);
    };
    let name = profile.name.clone();

    if !profile.deleted {
        bail!(
            "Hosts file '{}' must be removed before it can be deleted.\nHint: Run 'hostswap remove {}' first.",
            name,
            name
        );
    }

    if !force {
        let confirm = inquire::Confirm::new(&format!("Permanently delete '{}'?", name))
            .with_default(false)
            .with_help_message("The hosts file and its entries will be gone for good")
            .prompt()
            .context("Confirmation cancelled")?;

        if !confirm {
            ui.warn("Deletion cancelled.");
            return Ok(());
        }
    }

    store.delete(&name)?;
    ui.ok(format!("Deleted hosts file '{}'", name));
    Ok(())
}

/// Mark a hosts file as removed so it can't be swapped in
pub fn remove(store: &mut ProfileStore, ui: &Ui, name: &str) -> Result<()> {
    set_removed(store, ui, name, true)
}

/// Clear the removed mark
pub fn restore(store: &mut ProfileStore, ui: &Ui, name: &str) -> Result<()> {
    set_removed(store, ui, name, false)
}

fn set_removed(store: &mut ProfileStore, ui: &Ui, name: &str, removed: bool) -> Result<()> {
    let Some(profile) = store.find(name)? else {
        bail!("Hosts file '{}' doesn't exist.\n{}", name, LIST_HINT);
    };
    let name = profile.name.clone();

    let changed = store.soft_delete(&name, removed)?;
    match (changed, removed) {
        (true, true) => ui.ok(format!("Hosts file '{}' marked as removed.", name)),
        (true, false) => ui.ok(format!("Hosts file '{}' restored.", name)),
        (false, true) => ui.info(format!("Hosts file '{}' is already removed.", name)),
        (false, false) => ui.info(format!("Hosts file '{}' is not removed.", name)),
    }
    Ok(())
}

pub fn rename(store: &mut ProfileStore, ui: &Ui, old_name: &str, new_name: &str) -> Result<()> {
    let Some(profile) = store.find(old_name)? else {
        bail!("Hosts file '{}' doesn't exist.\n{}", old_name, LIST_HINT);
    };
    let old_name = profile.name.clone();

    if !old_name.eq_ignore_ascii_case(new_name) && store.find(new_name)?.is_some() {
        bail!(
            "Hosts file '{}' already exists.\nHint: Choose a different name or delete the existing one first.",
            new_name
        );
    }

    store.rename(&old_name, new_name)?;
    ui.ok(format!("Renamed hosts file '{}' to '{}'", old_name, new_name));
    Ok(())
}

pub fn export(store: &mut ProfileStore, ui: &Ui, file: &Path, names: &[String]) -> Result<()> {
    let count = package::export(store, names, file)
        .with_context(|| format!("Failed to export to {}", file.display()))?;

    if count == 0 {
        ui.warn(format!(
            "None of the named hosts files exist; wrote an empty package to {}",
            file.display()
        ));
    } else {
        ui.ok(format!("Exported {} hosts file(s) to {}", count, file.display()));
    }
    Ok(())
}

pub fn import(store: &mut ProfileStore, ui: &Ui, files: &[PathBuf]) -> Result<()> {
    let summary = package::import(store, files).context("Failed to import packages")?;
    ui.ok(format!(
        "Imported {} hosts file(s), {} new.",
        summary.records, summary.added
    ));
    Ok(())
}
