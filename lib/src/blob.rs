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

//! File-blob encode/decode: conditional gzip composed with the cipher.
//!
//! The pepper for a file blob is its plaintext path, so equal file contents
//! at different paths produce unrelated ciphertexts.

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Seek as _;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::cipher::Cipher;
use crate::cipher::CipherError;
use crate::compress;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Cannot access {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

trait IoResultExt<T> {
    fn context(self, path: impl AsRef<Path>) -> Result<T, BlobError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn context(self, path: impl AsRef<Path>) -> Result<T, BlobError> {
        self.map_err(|source| BlobError::Path {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Encrypts the plaintext file at `src` into the ciphertext file at `dst`,
/// creating parent directories. Returns the ciphertext size, which drives
/// LFS promotion.
pub fn encrypt_file(
    cipher: &Cipher,
    plain_path: &str,
    src: &Path,
    dst: &Path,
) -> Result<u64, BlobError> {
    let mut input = File::open(src).context(src)?;
    let mut sniff = [0u8; 8 * 1024];
    let sniffed = read_up_to(&mut input, &mut sniff).context(src)?;
    let textual = !compress::is_binary(&sniff[..sniffed]);
    input.seek(SeekFrom::Start(0)).context(src)?;

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).context(parent)?;
    }
    let mut output = File::create(dst).context(dst)?;
    let written = if textual {
        cipher.encrypt(plain_path, &mut compress::gzip_reader(input), &mut output)?
    } else {
        cipher.encrypt(plain_path, &mut input, &mut output)?
    };
    Ok(written)
}

/// Decrypts the ciphertext file at `src` into the plaintext file at `dst`.
/// The write goes through a sibling temporary file and an atomic rename.
pub fn decrypt_file(
    cipher: &Cipher,
    plain_path: &str,
    src: &Path,
    dst: &Path,
) -> Result<(), BlobError> {
    let data = fs::read(src).context(src)?;
    let plaintext = decrypt_bytes(cipher, plain_path, &data)?;

    let parent = dst.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).context(parent)?;
    let mut temp = NamedTempFile::new_in(parent).context(parent)?;
    io::Write::write_all(&mut temp, &plaintext).context(dst)?;
    temp.persist(dst)
        .map_err(|err| BlobError::Path {
            path: dst.to_path_buf(),
            source: err.error,
        })?;
    Ok(())
}

/// Decrypts an in-memory ciphertext blob, inflating if it was compressed.
pub fn decrypt_bytes(
    cipher: &Cipher,
    plain_path: &str,
    data: &[u8],
) -> Result<Vec<u8>, BlobError> {
    let decrypted = cipher.decrypt_vec(plain_path, data)?;
    Ok(compress::gunzip_or_passthrough(decrypted))
}

fn read_up_to(input: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use crate::cipher::CipherMode;
    use crate::settings::Password;

    use super::*;

    fn test_cipher() -> Cipher {
        Cipher::new(
            CipherMode::OpenSsl { iterations: 1024 },
            Password::new("secret"),
        )
    }

    #[test]
    fn text_file_round_trips_compressed() {
        let cipher = test_cipher();
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("plain.txt");
        let enc = dir.path().join("enc/blob");
        let out = dir.path().join("restored.txt");
        let text = "text content\n".repeat(200);
        fs::write(&src, &text).unwrap();

        let size = encrypt_file(&cipher, "plain.txt", &src, &enc).unwrap();
        // Compressed-then-encrypted text is smaller than the plaintext.
        assert!(size < text.len() as u64);
        decrypt_file(&cipher, "plain.txt", &enc, &out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), text);
    }

    #[test]
    fn binary_file_skips_compression() {
        let cipher = test_cipher();
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("blob.bin");
        let enc = dir.path().join("enc/blob");
        let out = dir.path().join("restored.bin");
        let mut data = vec![0u8; 4096];
        data[1] = 0xff;
        fs::write(&src, &data).unwrap();

        let size = encrypt_file(&cipher, "blob.bin", &src, &enc).unwrap();
        // Salt plus the uncompressed body.
        assert_eq!(size, data.len() as u64 + 8);
        decrypt_file(&cipher, "blob.bin", &enc, &out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), data);
    }

    #[test]
    fn same_bytes_different_paths_differ() {
        let cipher = test_cipher();
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("file");
        fs::write(&src, b"same bytes, no nuls, plenty of text").unwrap();
        let enc_a = dir.path().join("a");
        let enc_b = dir.path().join("b");
        encrypt_file(&cipher, "path/a", &src, &enc_a).unwrap();
        encrypt_file(&cipher, "path/b", &src, &enc_b).unwrap();
        assert_ne!(fs::read(&enc_a).unwrap(), fs::read(&enc_b).unwrap());
    }
}
