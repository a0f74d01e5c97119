//! Core data types shared between the codec, the tag handlers and the CLI.
//!
//! Rule of thumb:
//! - These types should be "boring bags of data"
//! - No filesystem code
//! - No tag container code
//!
//! `OptionMap` is what a playtag string turns into once parsed.

use std::fmt;

/// One parsed option value.
///
/// - `Text` is anything written as `key=value`
/// - `Flag` is a bare key from the boolean flag vocabulary (e.g. `mirror`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    Flag,
}

impl OptionValue {
    /// The text value, or `None` for a flag.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            OptionValue::Flag => None,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, OptionValue::Flag)
    }
}

/// Ordered option map, keyed by case-sensitive option name.
///
/// Keys are unique. Inserting an existing key replaces its value but keeps
/// the position where the key first appeared, so serialization stays stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: Vec<(String, OptionValue)>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) -> Option<OptionValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, OptionValue::Text(value.into()));
    }

    pub fn insert_flag(&mut self, key: impl Into<String>) {
        self.insert(key, OptionValue::Flag);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Shortcut for `get(key)` when only `key=value` entries are interesting.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_text)
    }

    /// True when `key` is present as a bare flag.
    pub fn has_flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(OptionValue::is_flag)
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (K, OptionValue)>>(iter: I) -> Self {
        let mut map = OptionMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A playback window in seconds.
///
/// Either bound may be missing:
/// - `"10"` / `"10-"` -> start only
/// - `"-20"` -> stop only
/// - `"10-20"` -> both
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeSpec {
    pub start: Option<f64>,
    pub stop: Option<f64>,
}

/// The structural category of a file's metadata storage.
///
/// Determined once per file operation by [`crate::core::sniff::detect`];
/// never stored anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFamily {
    /// MP4/M4A/M4V: iTunes-style `ilst` item map.
    AtomBased,
    /// MP3: ID3v2 frame list.
    FrameBased,
    /// FLAC and Ogg: Vorbis comment multimap.
    VorbisComment,
    /// Matroska/WebM: tags go through mkvtoolnix.
    ExternalToolManaged,
    Unsupported,
}

impl fmt::Display for ContainerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerFamily::AtomBased => "MP4 (ilst atoms)",
            ContainerFamily::FrameBased => "MP3 (ID3v2)",
            ContainerFamily::VorbisComment => "FLAC/Ogg (Vorbis comments)",
            ContainerFamily::ExternalToolManaged => "Matroska (mkvtoolnix)",
            ContainerFamily::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut map = OptionMap::new();
        map.insert_text("t", "10-20");
        map.insert_text("vol", "+3dB");
        let prev = map.insert("t", OptionValue::Text("5-15".to_string()));

        assert_eq!(prev, Some(OptionValue::Text("10-20".to_string())));
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["t", "vol"]);
        assert_eq!(map.text("t"), Some("5-15"));
    }

    #[test]
    fn flags_have_no_text() {
        let mut map = OptionMap::new();
        map.insert_flag("mirror");
        assert!(map.has_flag("mirror"));
        assert_eq!(map.text("mirror"), None);
        assert!(!map.has_flag("vol"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut map = OptionMap::new();
        map.insert_text("vol", "+1dB");
        map.insert_text("VOL", "+2dB");
        assert_eq!(map.len(), 2);
        assert_eq!(map.remove("vol"), Some(OptionValue::Text("+1dB".into())));
        assert_eq!(map.len(), 1);
    }
}
