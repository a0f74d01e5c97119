//! core/player.rs
//! Playtag options -> VLC command line, and launching the player.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use super::config::Config;
use super::error::{PlaytagError, Result};
use super::types::{OptionMap, TimeSpec};

const PLAYER_NAME: &str = "vlc";

static GAIN_DB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?\d+(?:\.\d+)?)\s*dB$").expect("static regex"));

static DELAY_SECS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?\d+(?:\.\d+)?)$").expect("static regex"));

/// Translate parsed options into VLC arguments.
///
/// Output order is fixed: gain, start/stop, audio desync, aspect ratio,
/// mirror. Keys VLC has no counterpart for are ignored, as are values that
/// don't match the expected shape.
pub fn to_args(options: &OptionMap) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(db) = options.text("vol").and_then(|v| capture_number(&GAIN_DB, v)) {
        args.push(format!("--gain={}", db / 20.0));
    }

    if let Some(t) = options.text("t") {
        match TimeSpec::parse(t) {
            Some(span) => {
                if let Some(start) = span.start {
                    args.push(format!("--start-time={}", start as i64));
                }
                if let Some(stop) = span.stop {
                    args.push(format!("--stop-time={}", stop as i64));
                }
            }
            None => tracing::warn!("Ignoring unparseable time range: {t}"),
        }
    }

    if let Some(secs) = options
        .text("av-delay")
        .and_then(|v| capture_number(&DELAY_SECS, v))
    {
        args.push(format!("--audio-desync={}", (secs * 1000.0) as i64));
    }

    if let Some(ratio) = options.text("aspect-ratio") {
        args.push(format!("--aspect-ratio={ratio}"));
    }

    if options.has_flag("mirror") {
        args.push("--video-filter=transform{type=hflip}".to_string());
    }

    args
}

fn capture_number(re: &Regex, value: &str) -> Option<f64> {
    re.captures(value.trim())?.get(1)?.as_str().parse().ok()
}

/// Find the VLC executable: configured path, then `PATH`, then common
/// install locations.
pub fn find_player(config: &Config) -> Option<PathBuf> {
    if let Some(path) = &config.player {
        return which::which(path).ok();
    }

    if let Ok(path) = which::which(PLAYER_NAME) {
        return Some(path);
    }

    #[cfg(windows)]
    let common_paths: &[&str] = &[
        r"C:\Program Files\VideoLAN\VLC\vlc.exe",
        r"C:\Program Files (x86)\VideoLAN\VLC\vlc.exe",
    ];

    #[cfg(target_os = "macos")]
    let common_paths: &[&str] = &[
        "/Applications/VLC.app/Contents/MacOS/VLC",
        "/usr/local/bin/vlc",
        "/opt/homebrew/bin/vlc",
    ];

    #[cfg(not(any(windows, target_os = "macos")))]
    let common_paths: &[&str] = &["/usr/bin/vlc", "/usr/local/bin/vlc", "/snap/bin/vlc"];

    common_paths
        .iter()
        .map(|p| PathBuf::from(*p))
        .find(|p| p.is_file())
}

/// Full argument list handed to the player, file last.
pub fn command_line(
    path: &Path,
    passthrough: &[String],
    options: &OptionMap,
    config: &Config,
) -> Vec<String> {
    let mut args: Vec<String> = config.player_args.clone();
    args.extend(passthrough.iter().cloned());
    args.extend(to_args(options));
    args.push(path.to_string_lossy().into_owned());
    args
}

/// Play `path` in VLC with the options stored in its playtag.
///
/// A file without a readable playtag still plays, just without extra
/// options. Blocks until the player exits; returns whether it exited
/// successfully.
pub fn play(path: &Path, passthrough: &[String], config: &Config) -> Result<bool> {
    if !path.exists() {
        return Err(PlaytagError::FileNotFound(path.to_path_buf()));
    }

    let player = find_player(config).ok_or_else(|| {
        PlaytagError::PlayerNotFound(
            config
                .player
                .as_deref()
                .unwrap_or(Path::new(PLAYER_NAME))
                .display()
                .to_string(),
        )
    })?;

    let tag = match super::read_tag(path, config) {
        Ok(tag) => tag,
        Err(e) => {
            tracing::warn!("Playing without playtag options: {e}");
            None
        }
    };
    let options = super::codec::parse(tag.as_deref(), &config.flags);
    let args = command_line(path, passthrough, &options, config);

    tracing::info!("Launching {} {:?}", player.display(), args);

    let status = Command::new(&player)
        .args(&args)
        .status()
        .map_err(|e| PlaytagError::tool(player.display().to_string(), e.to_string()))?;

    if !status.success() {
        tracing::error!("{} exited with {status}", player.display());
    }
    Ok(status.success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec;

    fn opts(tag: &str) -> OptionMap {
        codec::parse_default(Some(tag))
    }

    #[test]
    fn gain_is_db_over_twenty() {
        assert_eq!(to_args(&opts("v1; vol=+3dB")), ["--gain=0.15"]);
        assert_eq!(to_args(&opts("v1; vol=-6 dB")), ["--gain=-0.3"]);
        assert_eq!(to_args(&opts("v1; vol=20dB")), ["--gain=1"]);
    }

    #[test]
    fn volume_without_unit_is_ignored() {
        assert!(to_args(&opts("v1; vol=loud")).is_empty());
        assert!(to_args(&opts("v1; vol=3")).is_empty());
    }

    #[test]
    fn time_range_becomes_start_and_stop() {
        assert_eq!(
            to_args(&opts("v1; t=10-20")),
            ["--start-time=10", "--stop-time=20"]
        );
        assert_eq!(
            to_args(&opts("v1; t=1:30.9-2:45")),
            ["--start-time=90", "--stop-time=165"]
        );
    }

    #[test]
    fn open_ended_ranges() {
        assert_eq!(to_args(&opts("v1; t=30-")), ["--start-time=30"]);
        assert_eq!(to_args(&opts("v1; t=-1:00")), ["--stop-time=60"]);
        assert_eq!(to_args(&opts("v1; t=45")), ["--start-time=45"]);
    }

    #[test]
    fn bad_time_range_is_skipped() {
        assert!(to_args(&opts("v1; t=soon")).is_empty());
    }

    #[test]
    fn av_delay_in_truncated_milliseconds() {
        assert_eq!(to_args(&opts("v1; av-delay=0.25")), ["--audio-desync=250"]);
        assert_eq!(to_args(&opts("v1; av-delay=-1.5")), ["--audio-desync=-1500"]);
        assert_eq!(to_args(&opts("v1; av-delay=0.0007")), ["--audio-desync=0"]);
    }

    #[test]
    fn aspect_ratio_is_verbatim() {
        assert_eq!(
            to_args(&opts("v1; aspect-ratio=16:9")),
            ["--aspect-ratio=16:9"]
        );
    }

    #[test]
    fn mirror_appears_once() {
        let args = to_args(&opts("v1; mirror; mirror"));
        assert_eq!(args, ["--video-filter=transform{type=hflip}"]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert!(to_args(&opts("v1; speed=2; subtitle=en")).is_empty());
    }

    #[test]
    fn order_is_fixed_regardless_of_tag_order() {
        let args = to_args(&opts(
            "v1; mirror; aspect-ratio=4:3; av-delay=0.1; t=5-15; vol=+3dB",
        ));
        assert_eq!(
            args,
            [
                "--gain=0.15",
                "--start-time=5",
                "--stop-time=15",
                "--audio-desync=100",
                "--aspect-ratio=4:3",
                "--video-filter=transform{type=hflip}",
            ]
        );
    }

    #[test]
    fn command_line_puts_file_last() {
        let config = Config {
            player_args: vec!["--no-video-title-show".to_string()],
            ..Config::default()
        };
        let args = command_line(
            Path::new("clip.mkv"),
            &["--fullscreen".to_string()],
            &opts("v1; t=10-20"),
            &config,
        );
        assert_eq!(
            args,
            [
                "--no-video-title-show",
                "--fullscreen",
                "--start-time=10",
                "--stop-time=20",
                "clip.mkv",
            ]
        );
    }

    #[test]
    fn configured_player_that_does_not_exist_is_not_found() {
        let config = Config {
            player: Some(PathBuf::from("/nonexistent/player/vlc")),
            ..Config::default()
        };
        assert_eq!(find_player(&config), None);
    }

    #[test]
    fn play_missing_file_fails_before_looking_for_player() {
        let dir = tempfile::tempdir().unwrap();
        let err = play(&dir.path().join("nope.mp4"), &[], &Config::default()).unwrap_err();
        assert!(matches!(err, PlaytagError::FileNotFound(_)));
    }
}
