//! core/tags/mp4.rs
//! Playtag in MP4 files: the freeform item `----:com.apple.iTunes:PlayTag`
//! in the `ilst` atom. One value, overwritten in place.

use std::path::{Path, PathBuf};

use mp4ameta::{Data, FreeformIdent, Tag};

use super::MetadataHandler;
use crate::core::error::{PlaytagError, Result};
use crate::core::types::ContainerFamily;

const PLAYTAG_MEAN: &str = "com.apple.iTunes";
const PLAYTAG_NAME: &str = "PlayTag";

fn playtag_ident() -> FreeformIdent<'static> {
    FreeformIdent::new(PLAYTAG_MEAN, PLAYTAG_NAME)
}

pub struct AtomMapHandler {
    path: PathBuf,
    tag: Tag,
}

impl AtomMapHandler {
    pub fn open(path: &Path) -> Result<Self> {
        let tag = Tag::read_from_path(path)
            .map_err(|e| PlaytagError::native(path, ContainerFamily::AtomBased, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            tag,
        })
    }

    fn save(&mut self) -> bool {
        match self.tag.write_to_path(&self.path) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save MP4 file {}: {e}", self.path.display());
                false
            }
        }
    }
}

impl MetadataHandler for AtomMapHandler {
    fn family(&self) -> ContainerFamily {
        ContainerFamily::AtomBased
    }

    fn read(&self) -> Option<String> {
        let value = playtag_of(&self.tag);
        tracing::debug!("MP4 PlayTag item: {value:?}");
        value
    }

    fn replace(&mut self, value: &str) -> bool {
        set_playtag(&mut self.tag, value);
        self.save()
    }

    fn clear(&mut self) -> bool {
        if !remove_playtag(&mut self.tag) {
            return true;
        }
        tracing::debug!("Removed existing PlayTag item");
        self.save()
    }
}

pub(crate) fn playtag_of(tag: &Tag) -> Option<String> {
    tag.strings_of(&playtag_ident())
        .find(|v| !v.is_empty())
        .map(str::to_owned)
}

/// `set_data` replaces every existing data atom of the item.
pub(crate) fn set_playtag(tag: &mut Tag, value: &str) {
    tag.set_data(playtag_ident(), Data::Utf8(value.to_owned()));
}

/// Returns false if there was no item to remove.
pub(crate) fn remove_playtag(tag: &mut Tag) -> bool {
    let ident = playtag_ident();
    if tag.data_of(&ident).next().is_none() {
        return false;
    }
    tag.remove_data_of(&ident);
    true
}
