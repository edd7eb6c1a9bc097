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

//! Shared fixtures driving a real `git` binary inside temp directories.
//!
//! Every test starts with `TestEnv::new()`, which returns `None` when no
//! usable git is on the PATH; such tests skip silently instead of failing.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use myba_lib::cipher::Cipher;
use myba_lib::context::BackupContext;
use myba_lib::git::EncryptedRepo;
use myba_lib::git::PlainRepo;
use myba_lib::pool::WorkerPool;
use myba_lib::settings::Password;
use myba_lib::settings::Settings;
use tempfile::TempDir;

pub const TEST_PASSWORD: &str = "secret";

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

/// Deterministic commit identity for plain commits made by tests.
pub fn identity_env() -> Vec<(&'static str, &'static OsStr)> {
    vec![
        ("GIT_AUTHOR_NAME", OsStr::new("Test User")),
        ("GIT_AUTHOR_EMAIL", OsStr::new("test@example.com")),
        ("GIT_AUTHOR_DATE", OsStr::new("1700000000 +0000")),
        ("GIT_COMMITTER_NAME", OsStr::new("Test User")),
        ("GIT_COMMITTER_EMAIL", OsStr::new("test@example.com")),
        ("GIT_COMMITTER_DATE", OsStr::new("1700000000 +0000")),
    ]
}

pub struct TestEnv {
    root: TempDir,
    pub settings: Settings,
    pub cipher: Cipher,
    pub pool: WorkerPool,
    pub plain: PlainRepo,
    pub enc: EncryptedRepo,
}

impl TestEnv {
    /// A fresh, initialized repository pair, or `None` without git.
    pub fn new() -> Option<Self> {
        if !git_available() {
            eprintln!("git is not available; skipping");
            return None;
        }
        let root = TempDir::new().unwrap();
        let settings = test_settings(root.path().join("work"));
        fs::create_dir_all(&settings.work_tree).unwrap();
        let plain = PlainRepo::init(&settings).unwrap();
        let enc = EncryptedRepo::init(&settings).unwrap();
        Some(Self::assemble(root, settings, plain, enc))
    }

    /// An empty work tree whose repositories are not yet created, for clone
    /// flows. `finish_open` picks the handles up afterwards.
    pub fn new_unborn() -> Option<(TempDir, Settings)> {
        if !git_available() {
            eprintln!("git is not available; skipping");
            return None;
        }
        let root = TempDir::new().unwrap();
        let settings = test_settings(root.path().join("work"));
        fs::create_dir_all(&settings.work_tree).unwrap();
        Some((root, settings))
    }

    pub fn finish_open(root: TempDir, settings: Settings) -> Self {
        let plain = PlainRepo::open(&settings);
        let enc = EncryptedRepo::open(&settings);
        Self::assemble(root, settings, plain, enc)
    }

    fn assemble(root: TempDir, settings: Settings, plain: PlainRepo, enc: EncryptedRepo) -> Self {
        let cipher = Cipher::from_settings(&settings, Password::new(TEST_PASSWORD));
        let pool = WorkerPool::new(2).unwrap();
        Self {
            root,
            settings,
            cipher,
            pool,
            plain,
            enc,
        }
    }

    pub fn ctx(&self) -> BackupContext<'_> {
        BackupContext {
            settings: &self.settings,
            cipher: &self.cipher,
            plain: &self.plain,
            enc: &self.enc,
            pool: &self.pool,
        }
    }

    /// A context keyed by a different password over the same repositories.
    pub fn ctx_with<'a>(&'a self, cipher: &'a Cipher) -> BackupContext<'a> {
        BackupContext {
            settings: &self.settings,
            cipher,
            plain: &self.plain,
            enc: &self.enc,
            pool: &self.pool,
        }
    }

    pub fn other_cipher(&self, password: &str) -> Cipher {
        self.cipher.with_password(Password::new(password))
    }

    pub fn write_file(&self, rel: &str, data: &[u8]) {
        let path = self.settings.work_tree.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    pub fn read_file(&self, rel: &str) -> Vec<u8> {
        fs::read(self.settings.work_tree.join(rel)).unwrap()
    }

    /// Stages the given paths and commits with the fixed test identity.
    /// Returns the new plain commit hash.
    pub fn plain_commit(&self, add: &[&str], message: &str) -> String {
        if !add.is_empty() {
            let paths: Vec<String> = add.iter().map(|s| (*s).to_string()).collect();
            self.plain.add(&paths).unwrap();
        }
        self.plain
            .repo
            .run_with_env(
                &["commit", "-q", "--allow-empty", "-m", message],
                &identity_env(),
            )
            .unwrap();
        self.plain.repo.head().unwrap().unwrap()
    }

    /// A bare repository configured to serve partial clones and promisor
    /// fetches over the file protocol.
    pub fn make_bare_remote(&self, name: &str) -> PathBuf {
        let path = self.root.path().join(name);
        run_git(&["init", "--quiet", "--bare", path.to_str().unwrap()]);
        run_git(&[
            "-C",
            path.to_str().unwrap(),
            "config",
            "uploadpack.allowFilter",
            "true",
        ]);
        run_git(&[
            "-C",
            path.to_str().unwrap(),
            "config",
            "uploadpack.allowAnySHA1InWant",
            "true",
        ]);
        path
    }
}

pub fn test_settings(work_tree: PathBuf) -> Settings {
    Settings {
        plain_repo: work_tree.join(".myba"),
        work_tree,
        password: None,
        use_gpg: false,
        // Low KDF work factor keeps the suite fast.
        kdf_iters: Some(1024),
        lfs_threshold: 40 * 1024 * 1024,
        n_jobs: 2,
        yes_overwrite: false,
        verbose: false,
        // The test binary is large and irrelevant; do not commit it.
        bootstrap_self: false,
    }
}

pub fn run_git(args: &[&str]) {
    let out = Command::new("git").args(args).output().unwrap();
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
