//! core/mod.rs
//!
//! Everything below the CLI:
//! - `codec`: the playtag mini-language
//! - `sniff` + `tags`: find the container family, open its handler
//! - `player`: options -> VLC arguments, launching VLC
//!
//! The three file operations the CLI exposes live here. They own the
//! user-facing diagnostics (`No playtag tag found`, backups); the handlers
//! only know how to touch one container format.

pub mod codec;
pub mod config;
pub mod error;
pub mod player;
pub mod sniff;
pub mod tags;
pub mod types;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use config::Config;
use error::{PlaytagError, Result};
use tags::Dispatcher;

/// Read the playtag stored in `path`.
///
/// `Ok(None)` means the file was readable but carries no playtag.
pub fn read_tag(path: &Path, config: &Config) -> Result<Option<String>> {
    read_with(&Dispatcher::new(config), path)
}

/// Store `value` in `path`, replacing any previous playtag.
/// A blank value clears instead.
pub fn write_tag(path: &Path, value: &str, config: &Config) -> Result<bool> {
    write_with(&Dispatcher::new(config), path, value)
}

/// Remove the playtag from `path`. Succeeds when there is none.
pub fn clear_tag(path: &Path, config: &Config) -> Result<bool> {
    clear_with(&Dispatcher::new(config), path)
}

pub fn read_with(dispatcher: &Dispatcher<'_>, path: &Path) -> Result<Option<String>> {
    let value = dispatcher.with_handler(path, |h| h.read())?;
    if value.is_none() {
        tracing::info!("No playtag tag found");
    }
    Ok(value)
}

pub fn write_with(dispatcher: &Dispatcher<'_>, path: &Path, value: &str) -> Result<bool> {
    let backup = dispatcher.config().backup;
    dispatcher.with_handler(path, |h| -> Result<bool> {
        if backup {
            make_backup(path)?;
        }
        Ok(h.write(Some(value)))
    })?
}

pub fn clear_with(dispatcher: &Dispatcher<'_>, path: &Path) -> Result<bool> {
    let backup = dispatcher.config().backup;
    dispatcher.with_handler(path, |h| -> Result<bool> {
        if backup {
            make_backup(path)?;
        }
        Ok(h.clear())
    })?
}

/// `song.mp3` -> `song.mp3.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

fn make_backup(path: &Path) -> Result<()> {
    let dest = backup_path(path);
    std::fs::copy(path, &dest).map_err(|e| PlaytagError::io(&dest, e))?;
    tracing::debug!("Backed up {} to {}", path.display(), dest.display());
    Ok(())
}
