//! core/sniff.rs
//! Decide which container family a file belongs to.
//!
//! Content first:
//! - EBML magic -> Matroska/WebM (lofty has no Matroska support, so we check it ourselves)
//! - everything else goes through `lofty`'s magic-byte probe
//!
//! Extension only when the content says nothing useful.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use lofty::file::FileType;
use lofty::probe::Probe;

use super::error::{PlaytagError, Result};
use super::types::ContainerFamily;

/// EBML header ID every Matroska/WebM file starts with.
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Sniff the container family of `path`.
///
/// Unknown content is not an error: it comes back as `Unsupported`.
pub fn detect(path: &Path) -> Result<ContainerFamily> {
    let mut file = File::open(path).map_err(|e| PlaytagError::io(path, e))?;

    let mut magic = [0u8; 4];
    let n = read_prefix(&mut file, &mut magic).map_err(|e| PlaytagError::io(path, e))?;
    if n == magic.len() && magic == EBML_MAGIC {
        tracing::debug!("EBML header found: {}", path.display());
        return Ok(ContainerFamily::ExternalToolManaged);
    }

    file.seek(SeekFrom::Start(0)).map_err(|e| PlaytagError::io(path, e))?;

    // Probe::new has no path, so lofty cannot fall back on the extension here.
    let probe = Probe::new(BufReader::new(file))
        .guess_file_type()
        .map_err(|e| PlaytagError::io(path, e))?;

    let family = match probe.file_type() {
        Some(file_type) => {
            tracing::debug!("Content type detected: {file_type:?}");
            family_for_file_type(file_type)
        }
        None => {
            let by_ext = family_for_extension(path);
            tracing::debug!("Content type inconclusive, extension says: {by_ext:?}");
            by_ext
        }
    };

    Ok(family)
}

fn family_for_file_type(file_type: FileType) -> ContainerFamily {
    match file_type {
        FileType::Mpeg => ContainerFamily::FrameBased,
        FileType::Mp4 => ContainerFamily::AtomBased,
        FileType::Flac | FileType::Vorbis | FileType::Opus | FileType::Speex => {
            ContainerFamily::VorbisComment
        }
        _ => ContainerFamily::Unsupported,
    }
}

fn family_for_extension(path: &Path) -> ContainerFamily {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("mp4" | "m4v") => ContainerFamily::AtomBased,
        Some("flac" | "ogg") => ContainerFamily::VorbisComment,
        _ => ContainerFamily::Unsupported,
    }
}

/// Like `read_exact`, but a short file is fine: returns how much was read.
fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn padded(prefix: &[u8]) -> Vec<u8> {
        let mut bytes = prefix.to_vec();
        bytes.resize(1024, 0);
        bytes
    }

    #[test]
    fn ebml_header_is_matroska_whatever_the_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "clip.bin", &padded(&EBML_MAGIC));
        assert_eq!(detect(&path).unwrap(), ContainerFamily::ExternalToolManaged);
    }

    #[test]
    fn flac_magic_is_vorbis_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "song.dat", &padded(b"fLaC"));
        assert_eq!(detect(&path).unwrap(), ContainerFamily::VorbisComment);
    }

    #[test]
    fn ftyp_box_is_atom_based() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "movie.dat", &padded(b"\x00\x00\x00\x18ftypisom"));
        assert_eq!(detect(&path).unwrap(), ContainerFamily::AtomBased);
    }

    #[test]
    fn mpeg_frame_sync_is_frame_based() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "track.dat", &padded(&[0xFF, 0xFB, 0x90, 0x64]));
        assert_eq!(detect(&path).unwrap(), ContainerFamily::FrameBased);
    }

    #[test]
    fn known_but_unhandled_content_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let mut wav = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
        wav.resize(64, 0);
        // extension must not override conclusive content
        let path = write_temp(&dir, "fake.flac", &wav);
        assert_eq!(detect(&path).unwrap(), ContainerFamily::Unsupported);
    }

    #[test]
    fn extension_fallback_for_unrecognized_content() {
        let dir = tempfile::tempdir().unwrap();
        let junk = b"just some text, nothing magic here".to_vec();

        for (name, expected) in [
            ("a.mp4", ContainerFamily::AtomBased),
            ("a.M4V", ContainerFamily::AtomBased),
            ("a.flac", ContainerFamily::VorbisComment),
            ("a.ogg", ContainerFamily::VorbisComment),
            ("a.txt", ContainerFamily::Unsupported),
            ("noext", ContainerFamily::Unsupported),
        ] {
            let path = write_temp(&dir, name, &junk);
            assert_eq!(detect(&path).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn empty_file_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "empty", b"");
        assert_eq!(detect(&path).unwrap(), ContainerFamily::Unsupported);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = detect(Path::new("/no/such/file.mp3")).unwrap_err();
        assert!(matches!(err, PlaytagError::Io { .. }));
    }
}
