//! Runtime configuration.
//!
//! Everything the environment used to toggle (debug output, backups) lives
//! here and is passed explicitly to the dispatcher, the handlers and the
//! player launcher.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{PlaytagError, Result};

/// Set of option names that may appear in a playtag without `=value`.
pub type FlagVocabulary = BTreeSet<String>;

/// Playtag configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Let external tools write to the terminal.
    pub debug: bool,

    /// Copy `FILE` to `FILE.bak` before modifying it.
    pub backup: bool,

    /// Boolean flag vocabulary accepted by the parser.
    pub flags: FlagVocabulary,

    /// Player executable (None = auto-detect VLC).
    pub player: Option<PathBuf>,

    /// Extra player arguments placed before the user's own.
    pub player_args: Vec<String>,

    /// `mkvextract` binary name or path.
    pub mkvextract: PathBuf,

    /// `mkvpropedit` binary name or path.
    pub mkvpropedit: PathBuf,
}

pub fn default_flags() -> FlagVocabulary {
    ["mirror"].into_iter().map(str::to_string).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            backup: false,
            flags: default_flags(),
            player: None,
            player_args: Vec::new(),
            mkvextract: PathBuf::from("mkvextract"),
            mkvpropedit: PathBuf::from("mkvpropedit"),
        }
    }
}

impl Config {
    /// Parse a TOML config document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PlaytagError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PlaytagError::io(path, e))?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_know_mirror_only() {
        let cfg = Config::default();
        assert!(cfg.flags.contains("mirror"));
        assert_eq!(cfg.flags.len(), 1);
        assert!(!cfg.backup);
        assert_eq!(cfg.mkvpropedit, PathBuf::from("mkvpropedit"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml(
            r#"
            backup = true
            flags = ["mirror", "flip"]
            player = "/opt/vlc/vlc"
            "#,
        )
        .unwrap();

        assert!(cfg.backup);
        assert!(cfg.flags.contains("flip"));
        assert_eq!(cfg.player.as_deref(), Some(Path::new("/opt/vlc/vlc")));
        assert_eq!(cfg.mkvextract, PathBuf::from("mkvextract"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml("volume = 3").unwrap_err();
        assert!(matches!(err, PlaytagError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playtag.toml");
        std::fs::write(&path, "debug = true\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert!(cfg.debug);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PlaytagError::Io { .. }));
    }
}
