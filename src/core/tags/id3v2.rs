//! core/tags/id3v2.rs
//! Playtag in MP3 files: one `TXXX` (user text) frame with description `PLAYTAG`.
//!
//! TXXX is a repeatable frame, so writes scan every TXXX frame and drop the
//! ones carrying our description before adding the new one.

use std::path::{Path, PathBuf};

use id3::frame::{Content, ExtendedText};
use id3::{ErrorKind, Frame, Tag, TagLike, Version};

use super::{MetadataHandler, PLAYTAG_KEY};
use crate::core::error::{PlaytagError, Result};
use crate::core::types::ContainerFamily;

const USER_TEXT_FRAME: &str = "TXXX";

pub struct FrameListHandler {
    path: PathBuf,
    tag: Tag,
}

impl FrameListHandler {
    pub fn open(path: &Path) -> Result<Self> {
        let tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Tag::new(),
            Err(e) => return Err(PlaytagError::native(path, ContainerFamily::FrameBased, e)),
        };

        tracing::debug!(
            "Opened ID3v2 tag ({} frames): {}",
            tag.frames().count(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            tag,
        })
    }

    fn save(&self) -> bool {
        // v2.4 consistently, same as everything else we write
        match self.tag.write_to_path(&self.path, Version::Id3v24) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error writing ID3v2 tags to {}: {e}", self.path.display());
                false
            }
        }
    }
}

impl MetadataHandler for FrameListHandler {
    fn family(&self) -> ContainerFamily {
        ContainerFamily::FrameBased
    }

    fn read(&self) -> Option<String> {
        let value = playtag_of(&self.tag);
        tracing::debug!("ID3v2 PLAYTAG frame: {value:?}");
        value
    }

    fn replace(&mut self, value: &str) -> bool {
        let removed = remove_playtag_frames(&mut self.tag);
        tracing::debug!("Removed {removed} existing PLAYTAG frames");

        self.tag.add_frame(ExtendedText {
            description: PLAYTAG_KEY.to_string(),
            value: value.to_string(),
        });

        self.save()
    }

    fn clear(&mut self) -> bool {
        let removed = remove_playtag_frames(&mut self.tag);
        tracing::debug!("Removed {removed} existing PLAYTAG frames");

        if removed == 0 {
            // nothing stored; don't touch the file (or create a tag) for a no-op
            return true;
        }
        self.save()
    }
}

fn is_playtag_frame(frame: &Frame) -> bool {
    matches!(frame.content(), Content::ExtendedText(et) if et.description == PLAYTAG_KEY)
}

/// Value of the first PLAYTAG user text frame, if non-empty.
pub(crate) fn playtag_of(tag: &Tag) -> Option<String> {
    tag.frames()
        .filter(|f| f.id() == USER_TEXT_FRAME)
        .find_map(|f| match f.content() {
            Content::ExtendedText(et) if et.description == PLAYTAG_KEY => Some(et.value.clone()),
            _ => None,
        })
        .filter(|v| !v.is_empty())
}

/// Remove every PLAYTAG user text frame; other TXXX frames survive.
/// Returns how many were removed.
pub(crate) fn remove_playtag_frames(tag: &mut Tag) -> usize {
    let mut removed = 0;

    for frame in tag.remove(USER_TEXT_FRAME) {
        if is_playtag_frame(&frame) {
            removed += 1;
        } else {
            tag.add_frame(frame);
        }
    }

    removed
}
