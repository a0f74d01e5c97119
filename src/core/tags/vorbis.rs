//! core/tags/vorbis.rs
//! Playtag in FLAC and Ogg files: a `PLAYTAG` Vorbis comment field.
//!
//! Vorbis comments are a case-insensitive multimap, so a write removes every
//! field named `PLAYTAG` (any case) before pushing exactly one new field.
//!
//! The whole lofty file is kept and saved, not just its comment block:
//! FLAC pictures live on the `FlacFile`, and saving the comments alone would
//! drop them.

use std::fs::File;
use std::path::{Path, PathBuf};

use lofty::config::{ParseOptions, WriteOptions};
use lofty::error::LoftyError;
use lofty::file::{AudioFile, FileType};
use lofty::flac::FlacFile;
use lofty::ogg::{OpusFile, SpeexFile, VorbisComments, VorbisFile};
use lofty::probe::Probe;

use super::{MetadataHandler, PLAYTAG_KEY};
use crate::core::error::{PlaytagError, Result};
use crate::core::types::ContainerFamily;

/// The lofty file the comments were read from.
enum CommentFile {
    Flac(FlacFile),
    Vorbis(VorbisFile),
    Opus(OpusFile),
    Speex(SpeexFile),
}

impl CommentFile {
    fn comments(&self) -> VorbisComments {
        match self {
            CommentFile::Flac(f) => f.vorbis_comments().cloned().unwrap_or_default(),
            CommentFile::Vorbis(f) => f.vorbis_comments().clone(),
            CommentFile::Opus(f) => f.vorbis_comments().clone(),
            CommentFile::Speex(f) => f.vorbis_comments().clone(),
        }
    }

    fn set_comments(&mut self, comments: VorbisComments) {
        match self {
            CommentFile::Flac(f) => {
                f.set_vorbis_comments(comments);
            }
            CommentFile::Vorbis(f) => *f.vorbis_comments_mut() = comments,
            CommentFile::Opus(f) => *f.vorbis_comments_mut() = comments,
            CommentFile::Speex(f) => *f.vorbis_comments_mut() = comments,
        }
    }

    fn save_to_path(&self, path: &Path) -> std::result::Result<(), LoftyError> {
        let options = WriteOptions::default();
        match self {
            CommentFile::Flac(f) => f.save_to_path(path, options),
            CommentFile::Vorbis(f) => f.save_to_path(path, options),
            CommentFile::Opus(f) => f.save_to_path(path, options),
            CommentFile::Speex(f) => f.save_to_path(path, options),
        }
    }
}

pub struct VorbisCommentHandler {
    path: PathBuf,
    file: CommentFile,
    comments: VorbisComments,
}

impl VorbisCommentHandler {
    pub fn open(path: &Path) -> Result<Self> {
        let native = |e: LoftyError| {
            PlaytagError::native(path, ContainerFamily::VorbisComment, e)
        };

        let file_type = Probe::open(path)
            .and_then(|p| p.guess_file_type().map_err(Into::into))
            .map_err(native)?
            .file_type();

        let mut reader = File::open(path).map_err(|e| PlaytagError::io(path, e))?;
        // stream properties are never needed
        let options = ParseOptions::new().read_properties(false);

        let file = match file_type {
            Some(FileType::Flac) => {
                CommentFile::Flac(FlacFile::read_from(&mut reader, options).map_err(native)?)
            }
            Some(FileType::Vorbis) => {
                CommentFile::Vorbis(VorbisFile::read_from(&mut reader, options).map_err(native)?)
            }
            Some(FileType::Opus) => {
                CommentFile::Opus(OpusFile::read_from(&mut reader, options).map_err(native)?)
            }
            Some(FileType::Speex) => {
                CommentFile::Speex(SpeexFile::read_from(&mut reader, options).map_err(native)?)
            }
            other => {
                return Err(PlaytagError::native(
                    path,
                    ContainerFamily::VorbisComment,
                    format!("not a FLAC/Ogg stream ({other:?})"),
                ));
            }
        };
        let comments = file.comments();

        tracing::debug!(
            "Opened Vorbis comments ({} fields): {}",
            comments.items().count(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            comments,
        })
    }

    fn save(&mut self) -> bool {
        self.file.set_comments(self.comments.clone());
        match self.file.save_to_path(&self.path) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error writing Vorbis comments to {}: {e}", self.path.display());
                false
            }
        }
    }
}

impl MetadataHandler for VorbisCommentHandler {
    fn family(&self) -> ContainerFamily {
        ContainerFamily::VorbisComment
    }

    fn read(&self) -> Option<String> {
        let value = playtag_of(&self.comments);
        tracing::debug!("Vorbis PLAYTAG field: {value:?}");
        value
    }

    fn replace(&mut self, value: &str) -> bool {
        let removed = set_playtag(&mut self.comments, value);
        tracing::debug!("Replaced {removed} existing PLAYTAG fields");
        self.save()
    }

    fn clear(&mut self) -> bool {
        let removed = remove_playtag(&mut self.comments);
        if removed == 0 {
            return true;
        }
        tracing::debug!("Removed {removed} PLAYTAG fields");
        self.save()
    }
}

/// First non-empty `PLAYTAG` value. Field names compare case-insensitively.
pub(crate) fn playtag_of(comments: &VorbisComments) -> Option<String> {
    comments
        .get_all(PLAYTAG_KEY)
        .find(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Returns how many fields were removed.
pub(crate) fn remove_playtag(comments: &mut VorbisComments) -> usize {
    comments.remove(PLAYTAG_KEY).count()
}

/// Drop every `PLAYTAG` field, then push one. Returns how many were dropped.
pub(crate) fn set_playtag(comments: &mut VorbisComments, value: &str) -> usize {
    let removed = remove_playtag(comments);
    comments.push(PLAYTAG_KEY.to_string(), value.to_string());
    removed
}
