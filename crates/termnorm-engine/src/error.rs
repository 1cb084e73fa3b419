//! Error types for the normalization engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can cross the engine boundary.
///
/// Only initialization can fail; query operations report "no match" as a
/// normal result and never raise.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The vocabulary source is missing, unreadable, or structurally
    /// invalid.
    #[error("vocabulary initialization failed: {0}")]
    Initialization(#[from] termnorm_vocab::VocabError),

    /// The vocabulary source file could not be inspected.
    #[error("cannot access vocabulary source {path}: {source}")]
    SourceUnavailable {
        /// Path of the source file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised while reading or writing the binary cache artifact.
///
/// These never cross the engine boundary: any cache failure is absorbed
/// into a full rebuild from the vocabulary source.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache file I/O failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// Path of the cache artifact.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cache file does not follow the expected format.
    #[error("invalid cache format: {0}")]
    InvalidFormat(String),

    /// The cache file was written by an incompatible format version.
    #[error("unsupported cache version: {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file header.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// The payload checksum does not match the header.
    #[error("cache checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum recorded in the header (hex).
        expected: String,
        /// Checksum computed from the payload (hex).
        actual: String,
    },

    /// The payload could not be decoded.
    #[error("cache decode error: {0}")]
    Decode(String),

    /// The payload could not be encoded.
    #[error("cache encode error: {0}")]
    Encode(String),
}

impl CacheError {
    /// Creates an I/O error with path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid-format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization_error_display() {
        let err = EngineError::Initialization(termnorm_vocab::VocabError::EmptyVocabulary);
        assert_eq!(
            err.to_string(),
            "vocabulary initialization failed: vocabulary source contains no concept nodes"
        );
    }

    #[test]
    fn test_cache_version_error_display() {
        let err = CacheError::UnsupportedVersion {
            found: 9,
            expected: 1,
        };
        assert_eq!(err.to_string(), "unsupported cache version: 9 (expected 1)");
    }

    #[test]
    fn test_cache_checksum_error_display() {
        let err = CacheError::ChecksumMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(err.to_string().contains("expected aa"));
    }
}
