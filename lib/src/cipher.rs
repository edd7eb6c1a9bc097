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

//! KDF / cipher adapter.
//!
//! Two interchangeable primitives produce the ciphertext streams:
//!
//! - OpenSSL mode (default): in-process AES-256-CTR keyed by
//!   PBKDF2-HMAC-SHA512 over a random 8-byte salt. The stored stream is
//!   `salt ‖ body` with no `Salted__` magic; decrypt reads the salt straight
//!   off the front.
//! - GPG mode: a spawned `gpg` process doing symmetric AES256 with S2K
//!   SHA-512 mode 3. The primitive's own compression is disabled; gzip is
//!   applied by the caller where wanted.
//!
//! The pass phrase is `password ‖ pepper`. The pepper is empty for manifests
//! and commit messages and the plaintext path for per-file blobs, so
//! identical bytes at different paths yield different ciphertexts. The pass
//! phrase reaches gpg over an inherited pipe descriptor, never through argv
//! or the environment.

use std::io;
use std::io::Read;
use std::io::Write;
use std::process::Command;
use std::process::Stdio;

use aes::cipher::KeyIvInit as _;
use aes::cipher::StreamCipher as _;
use rand::RngCore as _;
use sha2::Sha512;
use thiserror::Error;

use crate::settings::DEFAULT_KDF_ITERS;
use crate::settings::DEFAULT_S2K_COUNT;
use crate::settings::Password;
use crate::settings::Settings;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

const SALT_LEN: usize = 8;
const CHUNK_LEN: usize = 64 * 1024;

/// Child descriptor the gpg pass phrase pipe is bound to.
#[cfg(unix)]
const PASSPHRASE_FD: i32 = 3;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("I/O error in cipher stream")]
    Io(#[from] io::Error),
    #[error("Could not execute `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` failed: {stderr}")]
    Primitive { program: String, stderr: String },
    #[error("Ciphertext is shorter than its salt")]
    TruncatedCiphertext,
    #[error("GPG mode requires a Unix platform")]
    UnsupportedPlatform,
}

#[derive(Clone, Debug)]
pub enum CipherMode {
    OpenSsl { iterations: u32 },
    Gpg { s2k_count: u32 },
}

/// A password bound to a cipher primitive.
#[derive(Clone, Debug)]
pub struct Cipher {
    mode: CipherMode,
    password: Password,
}

impl Cipher {
    pub fn new(mode: CipherMode, password: Password) -> Self {
        Self { mode, password }
    }

    pub fn from_settings(settings: &Settings, password: Password) -> Self {
        let mode = if settings.use_gpg {
            CipherMode::Gpg {
                s2k_count: settings.kdf_iters.unwrap_or(DEFAULT_S2K_COUNT),
            }
        } else {
            CipherMode::OpenSsl {
                iterations: settings.kdf_iters.unwrap_or(DEFAULT_KDF_ITERS),
            }
        };
        Self::new(mode, password)
    }

    /// The same primitive keyed by a different password. Used by reencrypt.
    pub fn with_password(&self, password: Password) -> Self {
        Self::new(self.mode.clone(), password)
    }

    /// The bound password; encrypted path derivation keys off it too.
    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Encrypts `input` into `output`, returning the ciphertext length.
    pub fn encrypt(
        &self,
        pepper: &str,
        input: &mut (dyn Read + Send),
        output: &mut (dyn Write + Send),
    ) -> Result<u64, CipherError> {
        let phrase = self.password.with_pepper(pepper);
        match &self.mode {
            CipherMode::OpenSsl { iterations } => {
                let mut salt = [0u8; SALT_LEN];
                rand::rng().fill_bytes(&mut salt);
                output.write_all(&salt)?;
                let written = apply_ctr(&phrase, &salt, *iterations, input, output)?;
                Ok(written + SALT_LEN as u64)
            }
            CipherMode::Gpg { s2k_count } => {
                let count = s2k_count.to_string();
                let args = [
                    "--symmetric",
                    "--cipher-algo",
                    "AES256",
                    "--digest-algo",
                    "SHA512",
                    "--s2k-mode",
                    "3",
                    "--s2k-count",
                    count.as_str(),
                    "--compress-algo",
                    "none",
                    "--output",
                    "-",
                ];
                run_gpg(&phrase, &args, input, output)
            }
        }
    }

    /// Decrypts `input` into `output`, returning the plaintext length.
    pub fn decrypt(
        &self,
        pepper: &str,
        input: &mut (dyn Read + Send),
        output: &mut (dyn Write + Send),
    ) -> Result<u64, CipherError> {
        let phrase = self.password.with_pepper(pepper);
        match &self.mode {
            CipherMode::OpenSsl { iterations } => {
                let mut salt = [0u8; SALT_LEN];
                input.read_exact(&mut salt).map_err(|err| {
                    if err.kind() == io::ErrorKind::UnexpectedEof {
                        CipherError::TruncatedCiphertext
                    } else {
                        CipherError::Io(err)
                    }
                })?;
                apply_ctr(&phrase, &salt, *iterations, input, output)
            }
            CipherMode::Gpg { .. } => run_gpg(&phrase, &["--decrypt"], input, output),
        }
    }

    pub fn encrypt_vec(&self, pepper: &str, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut out = Vec::with_capacity(data.len() + SALT_LEN);
        self.encrypt(pepper, &mut &data[..], &mut out)?;
        Ok(out)
    }

    pub fn decrypt_vec(&self, pepper: &str, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut out = Vec::with_capacity(data.len().saturating_sub(SALT_LEN));
        self.decrypt(pepper, &mut &data[..], &mut out)?;
        Ok(out)
    }
}

/// CTR is its own inverse, so one keystream loop serves both directions.
fn apply_ctr(
    phrase: &str,
    salt: &[u8; SALT_LEN],
    iterations: u32,
    input: &mut (dyn Read + Send),
    output: &mut (dyn Write + Send),
) -> Result<u64, CipherError> {
    // Matches `openssl enc -aes-256-ctr -pbkdf2 -md sha512`: one PBKDF2 run
    // yields the 32-byte key followed by the 16-byte initial counter block.
    let mut derived = [0u8; 48];
    pbkdf2::pbkdf2_hmac::<Sha512>(phrase.as_bytes(), salt, iterations, &mut derived);
    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];
    key.copy_from_slice(&derived[..32]);
    iv.copy_from_slice(&derived[32..]);
    let mut cipher = Aes256Ctr::new(&key.into(), &iv.into());

    let mut buf = vec![0u8; CHUNK_LEN];
    let mut written = 0u64;
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        cipher.apply_keystream(&mut buf[..n]);
        output.write_all(&buf[..n])?;
        written += n as u64;
    }
    Ok(written)
}

#[cfg(unix)]
fn run_gpg(
    phrase: &str,
    args: &[&str],
    input: &mut (dyn Read + Send),
    output: &mut (dyn Write + Send),
) -> Result<u64, CipherError> {
    use std::os::fd::AsRawFd as _;
    use std::os::unix::process::CommandExt as _;

    let (pass_reader, mut pass_writer) = os_pipe::pipe()?;
    let mut cmd = Command::new("gpg");
    cmd.args(["--batch", "--quiet", "--no-tty"])
        .args(args)
        .arg("--passphrase-fd")
        .arg(PASSPHRASE_FD.to_string())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let pass_fd = pass_reader.as_raw_fd();
    // dup2 clears CLOEXEC on the duplicate, making the read end visible to
    // gpg at a fixed descriptor.
    unsafe {
        cmd.pre_exec(move || {
            if libc::dup2(pass_fd, PASSPHRASE_FD) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
    tracing::debug!(?cmd, "spawning gpg");
    let mut child = cmd.spawn().map_err(|source| CipherError::Spawn {
        program: "gpg".into(),
        source,
    })?;
    drop(pass_reader);
    pass_writer.write_all(phrase.as_bytes())?;
    pass_writer.write_all(b"\n")?;
    drop(pass_writer);

    let mut stdin = child.stdin.take().expect("stdin was piped");
    let mut stdout = child.stdout.take().expect("stdout was piped");
    let mut stderr = child.stderr.take().expect("stderr was piped");

    let mut stderr_buf = Vec::new();
    let copy_result = std::thread::scope(|scope| {
        // A broken pipe while feeding means gpg exited early; the child's
        // exit status reports the real failure.
        scope.spawn(move || {
            let _ = io::copy(input, &mut stdin);
        });
        let stderr_buf = &mut stderr_buf;
        scope.spawn(move || {
            let _ = stderr.read_to_end(stderr_buf);
        });
        io::copy(&mut stdout, output)
    });

    let status = child.wait()?;
    if !status.success() {
        return Err(CipherError::Primitive {
            program: "gpg".into(),
            stderr: String::from_utf8_lossy(&stderr_buf).trim().to_string(),
        });
    }
    Ok(copy_result?)
}

#[cfg(not(unix))]
fn run_gpg(
    _phrase: &str,
    _args: &[&str],
    _input: &mut (dyn Read + Send),
    _output: &mut (dyn Write + Send),
) -> Result<u64, CipherError> {
    Err(CipherError::UnsupportedPlatform)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn test_cipher(password: &str) -> Cipher {
        // Low work factor keeps the unit tests fast; production callers use
        // the defaults from `settings`.
        Cipher::new(
            CipherMode::OpenSsl { iterations: 1024 },
            Password::new(password),
        )
    }

    #[test]
    fn round_trip() {
        let cipher = test_cipher("secret");
        let plaintext = b"some plaintext\n".to_vec();
        let ciphertext = cipher.encrypt_vec("", &plaintext).unwrap();
        assert_ne!(&ciphertext[SALT_LEN..], &plaintext[..]);
        assert_eq!(cipher.decrypt_vec("", &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn round_trip_with_pepper() {
        let cipher = test_cipher("secret");
        let ciphertext = cipher.encrypt_vec("foo/bar", b"data").unwrap();
        assert_eq!(cipher.decrypt_vec("foo/bar", &ciphertext).unwrap(), b"data");
        assert_ne!(cipher.decrypt_vec("other", &ciphertext).unwrap(), b"data");
    }

    #[test]
    fn wrong_password_garbles() {
        let ciphertext = test_cipher("secret").encrypt_vec("", b"data").unwrap();
        let garbled = test_cipher("wrong").decrypt_vec("", &ciphertext).unwrap();
        assert_ne!(garbled, b"data");
    }

    #[test]
    fn truncated_ciphertext_is_an_error() {
        let cipher = test_cipher("secret");
        assert_matches!(
            cipher.decrypt_vec("", b"short"),
            Err(CipherError::TruncatedCiphertext)
        );
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let cipher = test_cipher("secret");
        let ciphertext = cipher.encrypt_vec("", b"").unwrap();
        assert_eq!(ciphertext.len(), SALT_LEN);
        assert_eq!(cipher.decrypt_vec("", &ciphertext).unwrap(), b"");
    }
}
