//! Gzip compression for `VerifyCode` payloads (§4.4, §8: "compress →
//! decompress is identity for all UTF-8 strings").

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Gzips `source`.
pub fn compress(source: &str) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(source.as_bytes())?;
    encoder.finish()
}

/// Inverse of [`compress`]. Returns an error on truncated or non-gzip
/// input, or bytes that do not decode as UTF-8 once inflated.
pub fn decompress(bytes: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = String::new();
    decoder.read_to_string(&mut out)?;
    Ok(out)
}
