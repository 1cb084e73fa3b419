//! Binary cache persistence for a loaded vocabulary snapshot.
//!
//! Parsing and indexing a large vocabulary takes far longer than reading
//! it back from disk, so the engine serializes its full in-memory state
//! (concepts plus all four indices) after a cold build and reloads it on
//! the next startup if the source file has not changed since.
//!
//! # File Format
//!
//! The cache file format (`.tnc`) is a versioned binary format:
//!
//! ```text
//! [4 bytes]  Magic: "TNVC"
//! [4 bytes]  Version (u32 LE)
//! [4 bytes]  Metadata JSON length (u32 LE)
//! [var]      Metadata JSON (UTF-8)
//! [32 bytes] SHA-256 hash of payload
//! [8 bytes]  Payload length (u64 LE)
//! [var]      Payload: bincode-encoded concepts + indices
//! ```
//!
//! Any failure while reading (truncation, bad magic, version drift,
//! checksum mismatch, decode error) is reported as a [`CacheError`] that
//! the engine converts into a full rebuild. Corruption can never poison a
//! running engine.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use termnorm_vocab::Concept;
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::index::TermIndex;

/// Magic bytes for cache files.
const CACHE_MAGIC: &[u8; 4] = b"TNVC";

/// Current cache file format version.
const CACHE_VERSION: u32 = 1;

/// Default file name for the cache artifact inside a cache directory.
pub const CACHE_FILE_NAME: &str = "vocabulary.tnc";

/// Human-readable metadata stored in the cache header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Path of the vocabulary source the cache was built from.
    pub source_path: String,
    /// Number of concepts in the payload.
    pub concept_count: u64,
    /// When the cache was written.
    pub compiled_at: DateTime<Utc>,
    /// Version of the tooling that wrote the cache.
    pub tool_version: String,
}

/// The serialized engine state: concepts and all derived indices.
///
/// Persisted and restored as a unit so the indices can never drift out of
/// sync with the concept set.
#[derive(Debug, Serialize, Deserialize)]
pub struct CachePayload {
    /// The full concept map.
    pub concepts: HashMap<String, Concept>,
    /// All four search indices.
    pub index: TermIndex,
}

/// Saves a vocabulary snapshot to the cache file.
pub fn save(
    path: impl AsRef<Path>,
    source_path: &Path,
    concepts: &HashMap<String, Concept>,
    index: &TermIndex,
) -> CacheResult<()> {
    let path = path.as_ref();

    let payload = CachePayload {
        concepts: concepts.clone(),
        index: index.clone(),
    };
    let payload_bytes = bincode::serde::encode_to_vec(&payload, bincode::config::standard())
        .map_err(|e| CacheError::Encode(e.to_string()))?;
    let payload_hash: [u8; 32] = Sha256::digest(&payload_bytes).into();

    let metadata = CacheMetadata {
        source_path: source_path.display().to_string(),
        concept_count: concepts.len() as u64,
        compiled_at: Utc::now(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let metadata_bytes =
        serde_json::to_vec(&metadata).map_err(|e| CacheError::Encode(e.to_string()))?;

    let file = File::create(path).map_err(|e| CacheError::io_error(path, e))?;
    let mut writer = BufWriter::new(file);

    let io = |e| CacheError::io_error(path, e);
    writer.write_all(CACHE_MAGIC).map_err(io)?;
    writer.write_all(&CACHE_VERSION.to_le_bytes()).map_err(io)?;
    writer
        .write_all(&(metadata_bytes.len() as u32).to_le_bytes())
        .map_err(io)?;
    writer.write_all(&metadata_bytes).map_err(io)?;
    writer.write_all(&payload_hash).map_err(io)?;
    writer
        .write_all(&(payload_bytes.len() as u64).to_le_bytes())
        .map_err(io)?;
    writer.write_all(&payload_bytes).map_err(io)?;
    writer.flush().map_err(io)?;

    debug!(
        path = %path.display(),
        concepts = concepts.len(),
        bytes = payload_bytes.len(),
        "wrote vocabulary cache"
    );
    Ok(())
}

/// Loads a vocabulary snapshot from the cache file.
///
/// Verifies magic bytes, format version, and the payload checksum before
/// decoding.
pub fn load(path: impl AsRef<Path>) -> CacheResult<(CacheMetadata, CachePayload)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CacheError::io_error(path, e))?;
    let file_len = file
        .metadata()
        .map_err(|e| CacheError::io_error(path, e))?
        .len();
    let mut reader = BufReader::new(file);

    let io = |e| CacheError::io_error(path, e);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(io)?;
    if &magic != CACHE_MAGIC {
        return Err(CacheError::invalid_format("bad magic bytes"));
    }

    let mut version_bytes = [0u8; 4];
    reader.read_exact(&mut version_bytes).map_err(io)?;
    let version = u32::from_le_bytes(version_bytes);
    if version != CACHE_VERSION {
        return Err(CacheError::UnsupportedVersion {
            found: version,
            expected: CACHE_VERSION,
        });
    }

    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).map_err(io)?;
    let metadata_len = u32::from_le_bytes(len_bytes) as u64;
    if metadata_len > file_len {
        return Err(CacheError::invalid_format(format!(
            "metadata length {metadata_len} exceeds file size {file_len}"
        )));
    }
    let mut metadata_bytes = vec![0u8; metadata_len as usize];
    reader.read_exact(&mut metadata_bytes).map_err(io)?;
    let metadata: CacheMetadata =
        serde_json::from_slice(&metadata_bytes).map_err(|e| CacheError::Decode(e.to_string()))?;

    let mut expected_hash = [0u8; 32];
    reader.read_exact(&mut expected_hash).map_err(io)?;

    let mut payload_len_bytes = [0u8; 8];
    reader.read_exact(&mut payload_len_bytes).map_err(io)?;
    let payload_len = u64::from_le_bytes(payload_len_bytes);
    if payload_len > file_len {
        return Err(CacheError::invalid_format(format!(
            "payload length {payload_len} exceeds file size {file_len}"
        )));
    }
    let mut payload_bytes = vec![0u8; payload_len as usize];
    reader.read_exact(&mut payload_bytes).map_err(io)?;

    let actual_hash: [u8; 32] = Sha256::digest(&payload_bytes).into();
    if actual_hash != expected_hash {
        return Err(CacheError::ChecksumMismatch {
            expected: hex(&expected_hash),
            actual: hex(&actual_hash),
        });
    }

    let (payload, _): (CachePayload, usize) =
        bincode::serde::decode_from_slice(&payload_bytes, bincode::config::standard())
            .map_err(|e| CacheError::Decode(e.to_string()))?;

    if payload.concepts.len() as u64 != metadata.concept_count {
        return Err(CacheError::invalid_format(format!(
            "concept count mismatch: header says {}, payload has {}",
            metadata.concept_count,
            payload.concepts.len()
        )));
    }

    Ok((metadata, payload))
}

/// Reports whether the cache artifact is usable for the given source.
///
/// The cache is fresh when it exists and its modification time is not
/// older than the source file's. Missing timestamps (platforms or
/// filesystems without mtime support) count as stale so the engine falls
/// back to a rebuild.
pub fn is_fresh(cache_path: &Path, source_path: &Path) -> bool {
    let Some(cache_mtime) = mtime(cache_path) else {
        return false;
    };
    let Some(source_mtime) = mtime(source_path) else {
        return false;
    };
    cache_mtime >= source_mtime
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok()?.modified().ok()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
