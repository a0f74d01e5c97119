//! core/codec.rs
//! The playtag mini-language.
//!
//! A playtag looks like:
//!
//! ```text
//! v1; t=1:30-2:45; vol=+3dB; mirror
//! ```
//!
//! - the version token (`v` + digits, optionally dotted) comes first
//! - every other segment is `key=value` or a bare boolean flag
//! - segments are separated by `;` and there is no escaping, so values
//!   cannot contain `;`
//!
//! A bad segment is skipped with a warning and the rest of the tag still
//! applies.

use std::sync::LazyLock;

use regex::Regex;

use super::config::FlagVocabulary;
use super::types::{OptionMap, OptionValue, TimeSpec};

/// Version token written in front of every serialized playtag.
pub const VERSION: &str = "v1";

const SEPARATOR: &str = "; ";

static VERSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+(?:\.\d+)*$").expect("static regex"));

static SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("static regex"));

static WHOLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("static regex"));

/// True for `v1`, `v2`, `v1.2`, ...
pub fn is_version_token(segment: &str) -> bool {
    VERSION_TOKEN.is_match(segment)
}

/// Parse a playtag into an [`OptionMap`].
///
/// Never fails:
/// - `None`, `""` or whitespace -> empty map
/// - segments that are neither `key=value` nor a known flag are skipped
/// - a repeated key keeps its last value
pub fn parse(text: Option<&str>, flags: &FlagVocabulary) -> OptionMap {
    let mut options = OptionMap::new();

    let Some(text) = text.map(str::trim) else {
        return options;
    };
    if text.is_empty() {
        return options;
    }

    let mut segments = text
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .peekable();

    if segments.peek().is_some_and(|s| is_version_token(s)) {
        segments.next();
    }

    for segment in segments {
        match segment.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    tracing::warn!("Skipping playtag segment with empty key: {segment}");
                    continue;
                }
                options.insert(key, OptionValue::Text(value.trim().to_string()));
            }
            None if flags.contains(segment) => {
                options.insert(segment, OptionValue::Flag);
            }
            None => {
                tracing::warn!("Skipping invalid playtag segment: {segment}");
            }
        }
    }

    options
}

/// [`parse`] with the built-in flag vocabulary.
pub fn parse_default(text: Option<&str>) -> OptionMap {
    parse(text, &super::config::default_flags())
}

/// Serialize options back into a playtag, always starting with [`VERSION`].
pub fn serialize(options: &OptionMap) -> String {
    let mut out = String::from(VERSION);

    for (key, value) in options.iter() {
        out.push_str(SEPARATOR);
        match value {
            OptionValue::Flag => out.push_str(key),
            OptionValue::Text(v) => {
                out.push_str(key);
                out.push('=');
                out.push_str(v);
            }
        }
    }

    out
}

/// Parse a time like `"90"`, `"1:30"`, `"1:02:03.5"` into seconds.
///
/// Colon fields are read right to left: seconds, minutes, hours.
/// Only the seconds field may carry a fraction.
pub fn parse_time(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if !text.contains(':') {
        return SECONDS.is_match(text).then(|| text.parse().ok()).flatten();
    }

    let fields: Vec<&str> = text.split(':').collect();
    if fields.len() > 3 {
        return None;
    }

    let mut total = 0.0;
    for (i, field) in fields.iter().rev().enumerate() {
        let valid = if i == 0 {
            SECONDS.is_match(field)
        } else {
            WHOLE.is_match(field)
        };
        if !valid {
            return None;
        }
        let value: f64 = field.parse().ok()?;
        total += value * 60f64.powi(i as i32);
    }

    Some(total)
}

impl TimeSpec {
    /// Parse the `t` option: `start-stop`, `start-`, `-stop` or bare `start`.
    ///
    /// Returns `None` if any present bound is not a valid time, or if both
    /// bounds are missing.
    pub fn parse(text: &str) -> Option<TimeSpec> {
        let text = text.trim();

        let (start, stop) = match text.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (text, ""),
        };

        let bound = |s: &str| -> Option<Option<f64>> {
            if s.is_empty() {
                Some(None)
            } else {
                parse_time(s).map(Some)
            }
        };

        let spec = TimeSpec {
            start: bound(start)?,
            stop: bound(stop)?,
        };

        (spec.start.is_some() || spec.stop.is_some()).then_some(spec)
    }
}
