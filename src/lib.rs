//! Playtag
//!
//! Stores a small playback-configuration string (the "playtag") inside the
//! metadata of a media file and turns it back into VLC arguments later.
//!
//! ```text
//! v1; t=1:30-2:45; vol=+3dB; mirror
//! ```
//!
//! Supported containers: MP4/M4A (freeform iTunes item), MP3 (ID3v2 `TXXX`),
//! FLAC/Ogg (Vorbis comment) and Matroska (tag XML via mkvtoolnix).

pub mod core;

pub use crate::core::config::Config;
pub use crate::core::error::{PlaytagError, Result};
pub use crate::core::{clear_tag, read_tag, write_tag};
