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

//! Remote and GC orchestration for the encrypted repository.
//!
//! Remotes are registered as promisors with a blob-less filter, so clones
//! and fetches move commits and trees eagerly but blobs on demand. After a
//! successful push, local packfiles can be reclaimed by replacing them with
//! `.promisor` markers; the blobs are re-fetched lazily when needed.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::context::BackupContext;
use crate::git;
use crate::git::EncryptedRepo;
use crate::git::GitError;
use crate::git::PlainRepo;
use crate::manifest::Manifest;
use crate::manifest::ManifestError;
use crate::settings::Settings;

/// Grace period between push completion and pack reclamation, letting git's
/// own background maintenance quiesce.
const GC_SETTLE: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("Cannot access {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No remote is configured")]
    NoRemotes,
    #[error("git {operation} exited with code {code}")]
    CommandExit { operation: String, code: i32 },
}

fn path_error(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> RemoteError {
    let path = path.as_ref().to_path_buf();
    move |source| RemoteError::Path { path, source }
}

/// Outcome of a manifest refresh: how many plaintext manifests were
/// (re)written and how many failed to decrypt.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub bad: usize,
}

/// Decrypts every manifest in E's work tree into P's plaintext manifest
/// directory. Manifests that do not decrypt (wrong password) are warned
/// about and their stale plaintext counterparts removed, so a retry with
/// the correct password starts clean.
pub fn refresh_manifests(ctx: &BackupContext<'_>) -> Result<RefreshReport, ManifestError> {
    let enc_manifest_dir = ctx.enc.repo.work_tree().join("manifest");
    let plain_manifest_dir = ctx.plain.manifest_dir();
    fs::create_dir_all(plain_manifest_dir).map_err(|source| ManifestError::Path {
        path: plain_manifest_dir.to_path_buf(),
        source,
    })?;

    let mut report = RefreshReport::default();
    if !enc_manifest_dir.is_dir() {
        return Ok(report);
    }
    let dir = fs::read_dir(&enc_manifest_dir).map_err(|source| ManifestError::Path {
        path: enc_manifest_dir.clone(),
        source,
    })?;
    for entry in dir {
        let path = entry
            .map_err(|source| ManifestError::Path {
                path: enc_manifest_dir.clone(),
                source,
            })?
            .path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let data = fs::read(&path).map_err(|source| ManifestError::Path {
            path: path.clone(),
            source,
        })?;
        let plain_path = plain_manifest_dir.join(&name);
        match Manifest::decode(ctx.cipher, &data) {
            Ok(manifest) => {
                fs::write(&plain_path, manifest.to_text()).map_err(|source| {
                    ManifestError::Path {
                        path: plain_path.clone(),
                        source,
                    }
                })?;
                report.refreshed += 1;
            }
            Err(ManifestError::WrongPassword) => {
                tracing::warn!(manifest = %name, "manifest does not decrypt; wrong password?");
                if plain_path.exists() {
                    let _ = fs::remove_file(&plain_path);
                }
                report.bad += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(report)
}

/// Pushes E to the given remote, or to every registered remote. After the
/// push, promisor state is reacquired with a refetch and local packs are
/// reclaimed. No password is involved anywhere on this path.
pub fn push(enc: &EncryptedRepo, remote: Option<&str>) -> Result<(), RemoteError> {
    let remotes = match remote {
        Some(name) => vec![name.to_string()],
        None => enc.remotes()?,
    };
    if remotes.is_empty() {
        return Err(RemoteError::NoRemotes);
    }
    for name in &remotes {
        let code = enc.repo.run_inherited(&["push", name.as_str()])?;
        if code != 0 {
            return Err(RemoteError::CommandExit {
                operation: format!("push {name}"),
                code,
            });
        }
    }
    enc.repo.run(&["fetch", "--refetch", "--all"])?;
    thread::sleep(GC_SETTLE);
    gc(enc)
}

/// Shrinks the local encrypted repository to the manifest cone and replaces
/// every packfile with a `.promisor` marker, telling git the objects are
/// retrievable from a promisor remote on demand.
pub fn gc(enc: &EncryptedRepo) -> Result<(), RemoteError> {
    enc.sparse_set(&[])?;
    let pack_dir = enc.repo.git_dir().join("objects/pack");
    if !pack_dir.is_dir() {
        return Ok(());
    }
    let entries = fs::read_dir(&pack_dir).map_err(path_error(&pack_dir))?;
    for entry in entries {
        let path = entry.map_err(path_error(&pack_dir))?.path();
        if path.extension().is_none_or(|ext| ext != "pack") {
            continue;
        }
        let marker = path.with_extension("promisor");
        fs::write(&marker, b"").map_err(path_error(&marker))?;
        tracing::debug!(pack = %path.display(), "reclaiming packfile");
        fs::remove_file(&path).map_err(path_error(&path))?;
        for sibling in ["idx", "rev"] {
            let side = path.with_extension(sibling);
            if side.exists() {
                let _ = fs::remove_file(&side);
            }
        }
    }
    Ok(())
}

/// Pulls into E and refreshes the decrypted manifests. Returns the refresh
/// report so the caller can exit non-zero when manifests were bad.
pub fn pull(ctx: &BackupContext<'_>, remote: Option<&str>) -> Result<RefreshReport, RemoteError> {
    let mut args = vec!["pull", "-q"];
    if let Some(name) = remote {
        args.push(name);
    }
    ctx.enc.repo.run(&args)?;
    Ok(refresh_manifests(ctx)?)
}

/// Partial-clones `url` into E's location and configures both repositories.
/// Manifest decryption happens after the caller has obtained the password.
pub fn clone_repos(settings: &Settings, url: &str) -> Result<(), RemoteError> {
    fs::create_dir_all(&settings.plain_repo).map_err(path_error(&settings.plain_repo))?;
    git::clone_filtered(url, &settings.encrypted_repo())?;
    let plain = PlainRepo::init(settings)?;
    debug_assert!(plain.is_initialized());
    let enc = EncryptedRepo::open(settings);
    enc.configure()?;
    // `clone --filter` marks origin as a promisor already; make it explicit
    // so a config inspection shows the same shape as `remote add`.
    enc.repo.config_set("remote.origin.promisor", "true")?;
    enc.repo
        .config_set("remote.origin.partialclonefilter", "blob:none")?;
    // Populate the work tree now that the cone is restricted to manifests.
    enc.repo.run(&["reset", "-q", "--hard", "HEAD"])?;
    Ok(())
}
