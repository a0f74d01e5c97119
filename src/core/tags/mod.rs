//! core/tags/mod.rs
//!
//! Playtag storage inside container metadata.
//! Public API:
//! - [`MetadataHandler`]: read/write/clear of the one playtag field, per container family.
//! - [`Dispatcher::with_handler`]: sniff a file, open the right handler, run an operation on it.
//!
//! Handlers report failure as `false`/`None` plus a logged diagnostic.
//! Only opening a handler returns errors.

mod id3v2;
mod mkv;
mod mp4;
mod vorbis;
mod xml;

use std::path::Path;

use super::config::Config;
use super::error::{PlaytagError, Result};
use super::sniff;
use super::types::ContainerFamily;

pub use id3v2::FrameListHandler;
pub use mkv::{ExternalToolHandler, Mkvtoolnix, TagTool};
pub use mp4::AtomMapHandler;
pub use vorbis::VorbisCommentHandler;

/// Field name used by every container (or its native spelling).
pub const PLAYTAG_KEY: &str = "PLAYTAG";

/// Read/write/clear access to the playtag field of one open file.
pub trait MetadataHandler {
    fn family(&self) -> ContainerFamily;

    /// Current playtag, or `None` if there is none (or it could not be read).
    /// Never modifies the file.
    fn read(&self) -> Option<String>;

    /// Store `value`, replacing whatever was there before.
    fn replace(&mut self, value: &str) -> bool;

    /// Remove the playtag. Succeeds if there was nothing to remove.
    fn clear(&mut self) -> bool;

    /// Store `value`; an absent or blank value clears instead.
    fn write(&mut self, value: Option<&str>) -> bool {
        match value {
            Some(v) if !v.trim().is_empty() => self.replace(v),
            _ => self.clear(),
        }
    }
}

/// Picks and opens handlers.
///
/// Owns the external tag tool so Matroska handlers can borrow it.
pub struct Dispatcher<'c> {
    config: &'c Config,
    tool: Box<dyn TagTool + 'c>,
}

impl<'c> Dispatcher<'c> {
    /// Dispatcher using the real mkvtoolnix binaries from `config`.
    pub fn new(config: &'c Config) -> Self {
        Self::with_tool(config, Box::new(Mkvtoolnix::from_config(config)))
    }

    /// Dispatcher with a custom tag tool for the Matroska family.
    pub fn with_tool(config: &'c Config, tool: Box<dyn TagTool + 'c>) -> Self {
        Self { config, tool }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Run `op` against the handler for `path`.
    ///
    /// - missing file -> `FileNotFound`
    /// - unsupported container -> `UnsupportedContainer`, `op` never runs
    /// - the native handle lives only inside this call and is dropped on
    ///   every exit path, including a panic inside `op`
    pub fn with_handler<T>(
        &self,
        path: &Path,
        op: impl FnOnce(&mut dyn MetadataHandler) -> T,
    ) -> Result<T> {
        if !path.exists() {
            return Err(PlaytagError::FileNotFound(path.to_path_buf()));
        }

        let family = sniff::detect(path)?;
        tracing::debug!("Container family for {}: {family}", path.display());

        let mut handler = self.open(path, family)?;
        let out = op(handler.as_mut());
        drop(handler);

        Ok(out)
    }

    fn open<'d>(
        &'d self,
        path: &Path,
        family: ContainerFamily,
    ) -> Result<Box<dyn MetadataHandler + 'd>> {
        let handler: Box<dyn MetadataHandler + 'd> = match family {
            ContainerFamily::AtomBased => Box::new(AtomMapHandler::open(path)?),
            ContainerFamily::FrameBased => Box::new(FrameListHandler::open(path)?),
            ContainerFamily::VorbisComment => Box::new(VorbisCommentHandler::open(path)?),
            ContainerFamily::ExternalToolManaged => {
                Box::new(ExternalToolHandler::new(path, self.tool.as_ref()))
            }
            ContainerFamily::Unsupported => {
                return Err(PlaytagError::UnsupportedContainer {
                    path: path.to_path_buf(),
                });
            }
        };
        Ok(handler)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Tag tool that only counts how often it was asked to do anything.
    struct CountingTool(Rc<Cell<usize>>);

    impl TagTool for CountingTool {
        fn extract_tags(&self, _file: &Path) -> Result<String> {
            self.0.set(self.0.get() + 1);
            Ok(String::new())
        }

        fn apply_tags(&self, _file: &Path, _xml: &Path) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn missing_file_is_reported_before_sniffing() {
        let config = Config::default();
        let dispatcher = Dispatcher::new(&config);
        let err = dispatcher
            .with_handler(Path::new("non_existent_file.mp4"), |h| h.read())
            .unwrap_err();
        assert!(matches!(err, PlaytagError::FileNotFound(_)));
    }

    #[test]
    fn unsupported_files_never_reach_a_handler() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.xyz");
        std::fs::write(&path, b"plain text, no container here").unwrap();

        let calls = Rc::new(Cell::new(0));
        let config = Config::default();
        let dispatcher = Dispatcher::with_tool(&config, Box::new(CountingTool(calls.clone())));

        let mut ran = false;
        let err = dispatcher
            .with_handler(&path, |h| {
                ran = true;
                h.write(Some("v1; vol=+3dB"))
            })
            .unwrap_err();

        assert!(matches!(err, PlaytagError::UnsupportedContainer { .. }));
        assert!(!ran);
        assert_eq!(calls.get(), 0);
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"plain text, no container here"
        );
    }

    #[test]
    fn mp3_goes_to_the_frame_list_handler() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_mp3(dir.path(), "o.mp3");
        let config = Config::default();
        let dispatcher = Dispatcher::new(&config);

        let family = dispatcher.with_handler(&path, |h| h.family()).unwrap();
        assert_eq!(family, ContainerFamily::FrameBased);
    }

    #[test]
    fn write_then_read_through_the_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_mp3(dir.path(), "o.mp3");
        let config = Config::default();
        let dispatcher = Dispatcher::new(&config);

        let ok = dispatcher
            .with_handler(&path, |h| h.write(Some("v1; t=10-20; vol=+3dB")))
            .unwrap();
        assert!(ok);

        let value = dispatcher.with_handler(&path, |h| h.read()).unwrap();
        assert_eq!(value.as_deref(), Some("v1; t=10-20; vol=+3dB"));
    }

    #[test]
    fn matroska_uses_the_configured_tool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.mkv");
        let mut bytes = vec![0x1A, 0x45, 0xDF, 0xA3];
        bytes.resize(64, 0);
        std::fs::write(&path, bytes).unwrap();

        let calls = Rc::new(Cell::new(0));
        let config = Config::default();
        let dispatcher = Dispatcher::with_tool(&config, Box::new(CountingTool(calls.clone())));

        let value = dispatcher.with_handler(&path, |h| h.read()).unwrap();
        assert_eq!(value, None);
        assert_eq!(calls.get(), 1);
    }
}
