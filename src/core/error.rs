//! Error types for playtag file operations.
//!
//! Malformed tag segments are not represented here: the codec skips them
//! with a warning and keeps going.

use std::path::PathBuf;
use thiserror::Error;

use super::types::ContainerFamily;

/// Errors that abort a single file operation.
#[derive(Debug, Error)]
pub enum PlaytagError {
    /// The target file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// No handler exists for the sniffed container.
    #[error("Unsupported file format: {}", path.display())]
    UnsupportedContainer {
        /// File that could not be mapped to a container family.
        path: PathBuf,
    },

    /// The native metadata library failed to open, parse or save the file.
    #[error("failed to access {family} metadata in '{}': {message}", path.display())]
    NativeLibrary {
        /// File being accessed.
        path: PathBuf,
        /// Container family whose library reported the failure.
        family: ContainerFamily,
        /// Library error text.
        message: String,
    },

    /// An external tool exited non-zero, could not be spawned, or produced
    /// output we could not parse.
    #[error("{tool} failed: {message}")]
    ExternalTool {
        /// Tool binary name.
        tool: String,
        /// What went wrong.
        message: String,
    },

    /// No usable player executable.
    #[error("player executable not found: {0}")]
    PlayerNotFound(String),

    /// Plain I/O failure outside any metadata library.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PlaytagError {
    /// Create a native library error.
    pub fn native(
        path: impl Into<PathBuf>,
        family: ContainerFamily,
        message: impl ToString,
    ) -> Self {
        PlaytagError::NativeLibrary {
            path: path.into(),
            family,
            message: message.to_string(),
        }
    }

    /// Create an external tool error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        PlaytagError::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlaytagError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PlaytagError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn file_not_found_display() {
        let err = PlaytagError::FileNotFound(PathBuf::from("non_existent_file.mp4"));
        assert_eq!(err.to_string(), "File not found: non_existent_file.mp4");
    }

    #[test]
    fn native_factory_keeps_family() {
        let err = PlaytagError::native("/a/b.mp3", ContainerFamily::FrameBased, "bad frame");
        let msg = err.to_string();
        assert!(msg.contains("ID3v2"), "got: {msg}");
        assert!(msg.contains("/a/b.mp3"), "got: {msg}");
        assert!(msg.contains("bad frame"), "got: {msg}");
    }

    #[test]
    fn tool_display() {
        let err = PlaytagError::tool("mkvpropedit", "exit status 2");
        assert_eq!(err.to_string(), "mkvpropedit failed: exit status 2");
    }

    #[test]
    fn io_source_is_some() {
        let err = PlaytagError::io(
            "/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mock"),
        );
        assert!(err.source().is_some());
    }
}
