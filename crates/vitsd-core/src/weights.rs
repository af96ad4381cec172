//! Weight-file materialization.
//!
//! Turns a possibly-obfuscated weight blob into a path the synthesis
//! engine can open. Pass-through mode hands the original path back
//! untouched; obfuscated blobs are streamed through the XOR cipher into
//! a scoped temporary file that is removed when the guard drops — on the
//! success path and on every failure path inside a model load.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::cipher;
use crate::error::TtsError;

/// Streaming chunk size for de-obfuscation. Large enough to amortize
/// per-call overhead on multi-gigabyte checkpoints.
const DECRYPT_CHUNK: usize = 16 * 1024 * 1024;

/// A usable weight file, either borrowed from durable storage or a
/// decrypted temporary copy scoped to the current load.
#[derive(Debug)]
pub enum MaterializedWeights {
    /// The source file as-is; nothing to clean up.
    Original(PathBuf),
    /// Decrypted copy; the backing file is deleted on drop.
    Decrypted(NamedTempFile),
}

impl MaterializedWeights {
    /// Path to hand to the synthesis engine.
    pub fn path(&self) -> &Path {
        match self {
            Self::Original(p) => p,
            Self::Decrypted(tmp) => tmp.path(),
        }
    }
}

/// Produce a plaintext weight file for `source`.
///
/// With `obfuscated == false` this is a pure pass-through: no copy, no
/// temp file. Otherwise the source is streamed through the cipher in
/// [`DECRYPT_CHUNK`]-sized pieces into a temp file owned by the returned
/// guard. Unreadable source or unwritable temp location maps to
/// [`TtsError::Io`]; the caller's load aborts with the previous model
/// slot state decided by the slot, not by this function.
///
/// Blocking; callers on the async runtime dispatch via `spawn_blocking`.
pub fn materialize(source: &Path, obfuscated: bool) -> Result<MaterializedWeights, TtsError> {
    if !obfuscated {
        return Ok(MaterializedWeights::Original(source.to_path_buf()));
    }

    let mut reader = File::open(source)?;
    let mut tmp = NamedTempFile::new()?;
    let mut buf = vec![0u8; DECRYPT_CHUNK];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        cipher::apply(&mut buf[..n]);
        tmp.write_all(&buf[..n])?;
        total += n as u64;
    }
    tmp.flush()?;

    tracing::debug!(
        source = %source.display(),
        bytes = total,
        "de-obfuscated weight file into scoped temp copy"
    );
    Ok(MaterializedWeights::Decrypted(tmp))
}
