//! Byte-wise XOR obfuscation for weight files at rest.
//!
//! Every byte is XORed with the same fixed mask, so the transform is its
//! own inverse and the enclosing stream can be chunked arbitrarily:
//! decrypting chunk-by-chunk yields the same bytes as decrypting the whole
//! file at once. Not cryptography — a light deterrent against casual
//! copying of weight files.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Fixed single-byte XOR mask. The same key encrypts and decrypts.
pub const XOR_KEY: u8 = 0x78;

/// Chunk size for [`transform_file`].
const FILE_CHUNK: usize = 10 * 1024 * 1024;

/// XOR every byte of `buf` with [`XOR_KEY`], in place.
///
/// Output length equals input length; empty input is a no-op.
pub fn apply(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        *b ^= XOR_KEY;
    }
}

/// Stream `src` through the cipher into `dst`.
///
/// Because the transform is an involution this both obfuscates plain
/// files and recovers obfuscated ones. Returns the number of bytes
/// written. Operator tooling for preparing weight blobs; the serving
/// path uses [`crate::weights::materialize`] instead.
pub fn transform_file(src: &Path, dst: &Path) -> std::io::Result<u64> {
    let mut reader = File::open(src)?;
    let mut writer = BufWriter::new(File::create(dst)?);
    let mut buf = vec![0u8; FILE_CHUNK];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        apply(&mut buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    writer.flush()?;
    Ok(total)
}
