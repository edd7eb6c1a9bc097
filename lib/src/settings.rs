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

//! Environment-derived configuration.
//!
//! All recognized options are plain environment variables so that the tool
//! works identically when driven from scripts, cron jobs, and interactive
//! shells. Invalid numeric overrides fall back to their defaults with a
//! warning rather than aborting.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// PBKDF2-HMAC-SHA512 iteration count used in OpenSSL mode.
pub const DEFAULT_KDF_ITERS: u32 = 321_731;

/// GPG S2K mode 3 count used in GPG mode.
pub const DEFAULT_S2K_COUNT: u32 = 32_111_731;

/// Ciphertext size above which a blob is promoted to LFS.
pub const DEFAULT_LFS_THRESHOLD: u64 = 40 * 1024 * 1024;

/// Marker file dropped into directories added for backup. Directories
/// containing a tracked marker are re-added on every commit.
pub const DIR_MARKER: &str = ".mybabackup";

/// A password held in memory. `Debug` output is redacted so the secret can
/// never reach logs or trace output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The pass phrase handed to the cipher primitive: `password ‖ pepper`.
    pub fn with_pepper(&self, pepper: &str) -> String {
        let mut phrase = String::with_capacity(self.0.len() + pepper.len());
        phrase.push_str(&self.0);
        phrase.push_str(pepper);
        phrase
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Resolved run-time configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Root of the tracked plaintext content.
    pub work_tree: PathBuf,
    /// Directory holding the plain repository (and, under it, the encrypted
    /// repository and the plaintext manifests).
    pub plain_repo: PathBuf,
    /// Password taken from the environment, if set. When absent, the caller
    /// prompts on the terminal.
    pub password: Option<Password>,
    /// Use the gpg primitive instead of the in-process AES-256-CTR one.
    pub use_gpg: bool,
    /// KDF work factor override, interpreted per cipher mode.
    pub kdf_iters: Option<u32>,
    /// Ciphertext size threshold for LFS promotion.
    pub lfs_threshold: u64,
    /// Worker pool size; 0 means one worker per online CPU.
    pub n_jobs: usize,
    /// Overwrite existing plaintext files without prompting.
    pub yes_overwrite: bool,
    /// Trace operations.
    pub verbose: bool,
    /// Commit a copy of the running binary into the encrypted repository on
    /// its first commit, so the backup is self-recovering.
    pub bootstrap_self: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        let work_tree = env::var_os("WORK_TREE")
            .map(PathBuf::from)
            .unwrap_or_else(home_dir);
        let plain_repo = env::var_os("PLAIN_REPO")
            .map(PathBuf::from)
            .unwrap_or_else(|| work_tree.join(".myba"));
        Self {
            work_tree,
            plain_repo,
            password: env::var("PASSWORD").ok().map(Password::new),
            use_gpg: env_flag("USE_GPG"),
            kdf_iters: env_number("KDF_ITERS"),
            lfs_threshold: env_number("GIT_LFS_THRESH").unwrap_or(DEFAULT_LFS_THRESHOLD),
            n_jobs: env_number("N_JOBS").unwrap_or(0),
            yes_overwrite: env_flag("YES_OVERWRITE"),
            verbose: env_flag("VERBOSE"),
            bootstrap_self: true,
        }
    }

    /// Path of the encrypted repository's work tree.
    pub fn encrypted_repo(&self) -> PathBuf {
        self.plain_repo.join("_encrypted")
    }

    /// Directory of plaintext manifests, one file per plain-commit hash.
    pub fn manifest_dir(&self) -> PathBuf {
        self.plain_repo.join("manifest")
    }

    /// Worker pool size with `0` resolved to the online CPU count.
    pub fn resolved_jobs(&self) -> usize {
        if self.n_jobs == 0 {
            num_cpus::get()
        } else {
            self.n_jobs
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from)
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => !value.is_empty() && value != "0",
        Err(_) => false,
    }
}

fn env_number<T: std::str::FromStr + Copy>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.parse() {
        Ok(number) => Some(number),
        Err(_) => {
            tracing::warn!(%name, %value, "ignoring unparsable numeric override");
            None
        }
    }
}
