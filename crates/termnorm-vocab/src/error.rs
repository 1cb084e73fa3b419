//! Error types for vocabulary loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a vocabulary source file.
///
/// Only structural problems with the whole file are errors; individual
/// malformed nodes or edges are skipped during parsing.
#[derive(Error, Debug)]
pub enum VocabError {
    /// The source file could not be read.
    #[error("failed to read vocabulary source {path}: {source}")]
    Io {
        /// Path of the source file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source file is not valid JSON.
    #[error("failed to parse vocabulary source: {0}")]
    Parse(#[from] serde_json::Error),

    /// The source file parsed but contains no usable node collection.
    #[error("vocabulary source contains no concept nodes")]
    EmptyVocabulary,
}

impl VocabError {
    /// Creates an I/O error with path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for vocabulary operations.
pub type VocabResult<T> = std::result::Result<T, VocabError>;
