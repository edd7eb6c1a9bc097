// Copyright 2026 The Myba Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Conditional gzip of textual plaintexts.
//!
//! Textual blobs are gzipped before encryption; binary blobs are passed
//! through. The decode side detects gzip from the stream itself, so no
//! metadata is stored: after decryption, a successful gzip inflate means the
//! plaintext was compressed, anything else is returned verbatim.

use std::io;
use std::io::Read;
use std::io::Write;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Bytes inspected by the text heuristic.
const SNIFF_LEN: usize = 8 * 1024;

/// Compression level; text compresses well enough that cheap beats tight.
const GZIP_LEVEL: u32 = 2;

/// A blob is binary if its first 8 KiB contain a NUL byte.
pub fn is_binary(data: &[u8]) -> bool {
    data[..data.len().min(SNIFF_LEN)].contains(&0)
}

/// Gzips `data` at the fixed level.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(GZIP_LEVEL));
    encoder.write_all(data)?;
    encoder.finish()
}

/// Streaming gzip reader over `input`, for blobs too big to buffer.
pub fn gzip_reader(input: impl Read) -> impl Read {
    flate2::read::GzEncoder::new(input, Compression::new(GZIP_LEVEL))
}

/// Inflates `data` if it is a complete, well-formed gzip stream; returns it
/// unchanged otherwise.
pub fn gunzip_or_passthrough(data: Vec<u8>) -> Vec<u8> {
    let mut decoder = GzDecoder::new(&data[..]);
    let mut inflated = Vec::new();
    match decoder.read_to_end(&mut inflated) {
        Ok(_) => inflated,
        Err(_) => data,
    }
}
