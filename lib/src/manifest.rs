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

//! Per-commit manifests binding encrypted paths to plaintext paths.
//!
//! A manifest is a text file with one `<enc_path>\t<plain_path>` line per
//! tracked file, in commit-walk order. The committed form is gzipped then
//! encrypted with the empty pepper. Paths containing TAB or newline are
//! rejected when files are added, so no escaping is needed.
//!
//! Decrypting a manifest with the wrong password yields high-entropy bytes;
//! a NUL byte (or invalid UTF-8) in the decrypted text is treated as the
//! wrong-password signal.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::cipher::Cipher;
use crate::cipher::CipherError;
use crate::compress;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Cannot access {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error("Manifest does not decrypt to text; wrong password?")]
    WrongPassword,
    #[error("Ill-formed manifest line: {line:?}")]
    IllFormed { line: String },
    #[error("Unsupported path {path:?}: {reason}")]
    UnsupportedPath { path: String, reason: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ManifestEntry {
    pub enc_path: String,
    pub plain_path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, enc_path: impl Into<String>, plain_path: impl Into<String>) {
        self.entries.push(ManifestEntry {
            enc_path: enc_path.into(),
            plain_path: plain_path.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut manifest = Self::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (enc_path, plain_path) =
                line.split_once('\t').ok_or_else(|| ManifestError::IllFormed {
                    line: line.to_string(),
                })?;
            manifest.push(enc_path, plain_path);
        }
        Ok(manifest)
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&entry.enc_path);
            text.push('\t');
            text.push_str(&entry.plain_path);
            text.push('\n');
        }
        text
    }

    /// The committed ciphertext form: gzip then encrypt with empty pepper.
    pub fn encode(&self, cipher: &Cipher) -> Result<Vec<u8>, ManifestError> {
        let packed = compress::gzip(self.to_text().as_bytes())
            .map_err(CipherError::Io)?;
        Ok(cipher.encrypt_vec("", &packed)?)
    }

    pub fn decode(cipher: &Cipher, data: &[u8]) -> Result<Self, ManifestError> {
        let decrypted = cipher.decrypt_vec("", data)?;
        let inflated = compress::gunzip_or_passthrough(decrypted);
        if inflated.contains(&0) {
            return Err(ManifestError::WrongPassword);
        }
        let text = String::from_utf8(inflated).map_err(|_| ManifestError::WrongPassword)?;
        Self::parse(&text)
    }
}

/// Rejects paths the manifest format cannot represent.
pub fn validate_plain_path(path: &str) -> Result<(), ManifestError> {
    if path.contains('\t') {
        return Err(ManifestError::UnsupportedPath {
            path: path.to_string(),
            reason: "contains a TAB",
        });
    }
    if path.contains('\n') {
        return Err(ManifestError::UnsupportedPath {
            path: path.to_string(),
            reason: "contains a newline",
        });
    }
    Ok(())
}

/// Collects the sorted-unique union of entries from every plaintext manifest
/// under `manifest_dir` whose plaintext path matches one of `patterns`
/// (path-component prefix match). Empty `patterns` matches everything.
pub fn scan_dir(
    manifest_dir: &Path,
    patterns: &[String],
) -> Result<Vec<ManifestEntry>, ManifestError> {
    let mut matched = BTreeSet::new();
    let dir_entries = fs::read_dir(manifest_dir).map_err(|source| ManifestError::Path {
        path: manifest_dir.to_path_buf(),
        source,
    })?;
    for dir_entry in dir_entries {
        let path = dir_entry
            .map_err(|source| ManifestError::Path {
                path: manifest_dir.to_path_buf(),
                source,
            })?
            .path();
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path).map_err(|source| ManifestError::Path {
            path: path.clone(),
            source,
        })?;
        for entry in Manifest::parse(&text)?.entries {
            if patterns.is_empty() || patterns.iter().any(|p| matches_prefix(&entry.plain_path, p))
            {
                matched.insert(entry);
            }
        }
    }
    Ok(matched.into_iter().collect())
}

/// `^<pattern>(/|$)`: the pattern names the path itself or an ancestor
/// directory of it.
fn matches_prefix(plain_path: &str, pattern: &str) -> bool {
    let pattern = pattern.trim_end_matches('/');
    plain_path == pattern
        || (plain_path.len() > pattern.len()
            && plain_path.starts_with(pattern)
            && plain_path.as_bytes()[pattern.len()] == b'/')
}
