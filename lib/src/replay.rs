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

//! Replay engines: rebuild one repository from the other.
//!
//! Restore walks the encrypted history parent-before-child and re-creates
//! each plain commit with its original author, date and message; the squash
//! variant ignores history and materializes the union of all manifests as a
//! single commit. Reencrypt goes the other way: it empties the encrypted
//! tree and replays the plain history through the commit pipeline under a
//! new password.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use crate::blob;
use crate::blob::BlobError;
use crate::cipher::Cipher;
use crate::cipher::CipherError;
use crate::cleanup::CleanupStack;
use crate::commit;
use crate::commit::CommitError;
use crate::commit::MirrorPayload;
use crate::compress;
use crate::context::BackupContext;
use crate::enc_path::cone_prefix;
use crate::git::Change;
use crate::git::CommitMeta;
use crate::git::GitError;
use crate::git::GitRepo;
use crate::manifest;
use crate::manifest::Manifest;
use crate::manifest::ManifestError;

const RM_CHUNK: usize = 500;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error("Cannot access {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("The plain repository already has commits (set YES_OVERWRITE to restore anyway)")]
    AlreadyRestored,
    #[error("Nothing to replay")]
    EmptyHistory,
}

fn path_error(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> ReplayError {
    let path = path.as_ref().to_path_buf();
    move |source| ReplayError::Path { path, source }
}

fn commit_with_meta(repo: &GitRepo, meta: &CommitMeta) -> Result<(), GitError> {
    let envs: [(&str, &OsStr); 6] = [
        ("GIT_AUTHOR_NAME", OsStr::new(&meta.author_name)),
        ("GIT_AUTHOR_EMAIL", OsStr::new(&meta.author_email)),
        ("GIT_AUTHOR_DATE", OsStr::new(&meta.author_date)),
        ("GIT_COMMITTER_NAME", OsStr::new(&meta.author_name)),
        ("GIT_COMMITTER_EMAIL", OsStr::new(&meta.author_email)),
        ("GIT_COMMITTER_DATE", OsStr::new(&meta.author_date)),
    ];
    repo.run_with_env(
        &["commit", "-q", "--allow-empty-message", "-m", meta.body.as_str()],
        &envs,
    )
    .map(|_| ())
}

fn reverse_history(repo: &GitRepo) -> Result<Vec<String>, GitError> {
    Ok(repo
        .run_str(&["log", "--reverse", "--topo-order", "--format=%H"])?
        .lines()
        .map(str::to_string)
        .filter(|hash| !hash.is_empty())
        .collect())
}

/// Sequential restore: replays every encrypted commit onto P, preserving
/// per-commit file snapshots, messages, authors and dates. Returns the
/// number of plain commits created.
pub fn restore_sequential(ctx: &BackupContext<'_>) -> Result<usize, ReplayError> {
    if ctx.plain.repo.head()?.is_some() && !ctx.settings.yes_overwrite {
        return Err(ReplayError::AlreadyRestored);
    }
    let commits = reverse_history(&ctx.enc.repo)?;
    if commits.is_empty() {
        return Err(ReplayError::EmptyHistory);
    }

    let mut cleanup = CleanupStack::new();
    if let Some(branch) = ctx.enc.repo.current_branch()? {
        let repo = ctx.enc.repo.clone();
        cleanup.push("reattach the encrypted branch", move || {
            let _ = repo.run(&["checkout", "-q", branch.as_str()]);
        });
    }
    {
        let enc = ctx.enc.clone();
        cleanup.push("restore the manifest-only cone", move || {
            let _ = enc.sparse_set(&[]);
        });
    }

    let tmp = tempfile::tempdir_in(&ctx.settings.plain_repo)
        .map_err(path_error(&ctx.settings.plain_repo))?;
    let plain_view = ctx.plain.repo.with_work_tree(tmp.path());
    let enc_root = ctx.enc.repo.work_tree().to_path_buf();
    let mut restored = 0;

    for enc_commit in &commits {
        let message = ctx
            .enc
            .repo
            .run_str(&["show", "--no-patch", "--format=%B", enc_commit.as_str()])?;
        let payload = match MirrorPayload::decode(ctx.cipher, &message) {
            Ok(payload) => payload,
            Err(CommitError::WrongPassword | CommitError::BadPayload { .. }) => {
                tracing::warn!(%enc_commit, "commit message does not decode; skipping");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        // Materialize only what this commit touches.
        let mut cones = Vec::new();
        let mut manifest_rel = None;
        for change in ctx.enc.repo.name_status(enc_commit)? {
            if let Change::Added { path } | Change::Modified { path } = change {
                if path.starts_with("manifest/") {
                    manifest_rel = Some(path);
                } else if path.starts_with("d/") {
                    cones.push(cone_prefix(&path).to_string());
                }
            }
        }
        ctx.enc.sparse_set(&cones)?;
        ctx.enc.repo.run(&["checkout", "-q", enc_commit.as_str()])?;

        let manifest = match &manifest_rel {
            Some(rel) => {
                let data = fs::read(enc_root.join(rel)).map_err(path_error(enc_root.join(rel)))?;
                match Manifest::decode(ctx.cipher, &data) {
                    Ok(manifest) => manifest,
                    Err(ManifestError::WrongPassword) => {
                        tracing::warn!(%enc_commit, "manifest does not decrypt; skipping");
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            None => Manifest::new(),
        };

        // Deletions and rename sources come from the embedded name-status
        // listing; the manifest only names files this commit (re)wrote.
        let mut to_remove = Vec::new();
        for change in &payload.changes {
            match change {
                Change::Deleted { path } => to_remove.push(path.clone()),
                Change::Renamed { old, .. } => to_remove.push(old.clone()),
                _ => {}
            }
        }
        for chunk in to_remove.chunks(RM_CHUNK) {
            let mut args = ["rm", "--cached", "-q", "--ignore-unmatch", "--"]
                .map(String::from)
                .to_vec();
            args.extend(chunk.iter().cloned());
            plain_view.run(&args)?;
            for path in chunk {
                let _ = fs::remove_file(tmp.path().join(path));
            }
        }

        let tmp_root = tmp.path().to_path_buf();
        let restored_paths = ctx.pool.run_all(manifest.entries().to_vec(), |entry, log| {
            let src = enc_root.join(&entry.enc_path);
            blob::decrypt_file(ctx.cipher, &entry.plain_path, &src, &tmp_root.join(&entry.plain_path))?;
            log.line(format!("decrypted {}", entry.plain_path));
            Ok::<_, BlobError>(entry.plain_path)
        })?;
        for chunk in restored_paths.chunks(RM_CHUNK) {
            let mut args = ["add", "--"].map(String::from).to_vec();
            args.extend(chunk.iter().cloned());
            plain_view.run(&args)?;
        }

        let staged = match plain_view.head()? {
            Some(_) => !plain_view
                .run_str(&["diff", "--cached", "--name-only", "HEAD"])?
                .is_empty(),
            None => !plain_view.run_str(&["ls-files", "--cached"])?.is_empty(),
        };
        if !staged {
            tracing::debug!(%enc_commit, "no staged changes; skipping");
            continue;
        }
        commit_with_meta(&plain_view, &payload.meta)?;
        restored += 1;
    }

    // The registered actions re-attach E's branch and shrink the cone; they
    // are wanted on success as much as on failure.
    cleanup.run();
    Ok(restored)
}

/// Squash restore: decrypt the union of all local manifests once and commit
/// the final file states as a single plain commit.
pub fn restore_squash(ctx: &BackupContext<'_>) -> Result<usize, ReplayError> {
    if ctx.plain.repo.head()?.is_some() && !ctx.settings.yes_overwrite {
        return Err(ReplayError::AlreadyRestored);
    }
    let entries = manifest::scan_dir(ctx.plain.manifest_dir(), &[])?;
    if entries.is_empty() {
        return Err(ReplayError::EmptyHistory);
    }

    let cones: Vec<String> = {
        let mut cones: Vec<String> = entries
            .iter()
            .map(|entry| cone_prefix(&entry.enc_path).to_string())
            .collect();
        cones.sort();
        cones.dedup();
        cones
    };
    ctx.enc.sparse_set(&cones)?;
    ctx.enc.sparse_reapply()?;

    let enc_root = ctx.enc.repo.work_tree().to_path_buf();
    let work_tree = ctx.settings.work_tree.clone();
    let restored_paths: Vec<Option<String>> = ctx.pool.run_all(entries, |entry, log| {
        let src = enc_root.join(&entry.enc_path);
        if !src.is_file() {
            // The union of manifests includes files deleted later; those
            // have no blob in the current encrypted tree.
            log.line(format!("skipping {} (not in the current tree)", entry.plain_path));
            return Ok(None);
        }
        blob::decrypt_file(ctx.cipher, &entry.plain_path, &src, &work_tree.join(&entry.plain_path))?;
        log.line(format!("restored {}", entry.plain_path));
        Ok::<_, BlobError>(Some(entry.plain_path))
    })?;

    let to_add: Vec<String> = restored_paths.into_iter().flatten().collect();
    for chunk in to_add.chunks(RM_CHUNK) {
        let mut args = ["add", "--"].map(String::from).to_vec();
        args.extend(chunk.iter().cloned());
        ctx.plain.repo.run(&args)?;
    }
    let enc_head = ctx.enc.repo.head()?.unwrap_or_default();
    let short = &enc_head[..enc_head.len().min(12)];
    ctx.plain
        .repo
        .run(&["commit", "-q", "-m", format!("Restore at {short}").as_str()])?;
    Ok(to_add.len())
}

/// Replays P's entire history through the commit pipeline, producing a
/// fresh encrypted history under `ctx.cipher`'s password. The old password
/// is never needed: the plain history is already in the clear. On failure,
/// E's branch tip is restored to its pre-reencrypt state.
pub fn reencrypt(ctx: &BackupContext<'_>) -> Result<usize, ReplayError> {
    let plain_commits = reverse_history(&ctx.plain.repo)?;
    if plain_commits.is_empty() {
        return Err(ReplayError::EmptyHistory);
    }
    let enc_head = ctx.enc.repo.head()?.ok_or(ReplayError::EmptyHistory)?;

    let mut cleanup = CleanupStack::new();
    {
        let enc = ctx.enc.clone();
        let enc_head = enc_head.clone();
        cleanup.push("restore the encrypted branch tip", move || {
            let _ = enc.repo.run(&["reset", "-q", "--hard", enc_head.as_str()]);
            let _ = enc.repo.run(&["sparse-checkout", "init", "--cone"]);
            let _ = enc.sparse_set(&[]);
        });
    }

    // Drop every tracked entry except the self-bootstrap copy, committed as
    // the first commit of the new history.
    ctx.enc.sparse_disable()?;
    let tracked: Vec<String> = ctx
        .enc
        .repo
        .run_str(&["ls-files"])?
        .lines()
        .map(str::to_string)
        .filter(|path| Some(path.as_str()) != ctx.enc.bootstrap_name())
        .collect();
    for chunk in tracked.chunks(RM_CHUNK) {
        let mut args = ["rm", "-q", "--ignore-unmatch", "--"]
            .map(String::from)
            .to_vec();
        args.extend(chunk.iter().cloned());
        ctx.enc.repo.run(&args)?;
    }
    let removal_message = opaque_message(ctx.cipher, "reencrypt\n")?;
    ctx.enc
        .repo
        .run(&["commit", "-q", "--allow-empty", "-m", removal_message.as_str()])?;

    let tmp = tempfile::tempdir_in(&ctx.settings.plain_repo)
        .map_err(path_error(&ctx.settings.plain_repo))?;
    let plain_view = ctx.plain.repo.with_work_tree(tmp.path());
    for plain_commit in &plain_commits {
        plain_view.run(&[
            "restore",
            "-q",
            "--source",
            plain_commit.as_str(),
            "--worktree",
            "--",
            ":/",
        ])?;
        commit::mirror_commit(ctx, plain_commit, tmp.path())?;
    }

    ctx.enc.repo.run(&["sparse-checkout", "init", "--cone"])?;
    ctx.enc.sparse_set(&[])?;
    cleanup.disarm();
    Ok(plain_commits.len())
}

/// A commit message that is encrypted and armored like a mirror payload but
/// carries no plain-commit metadata (restore skips it).
fn opaque_message(cipher: &Cipher, text: &str) -> Result<String, ReplayError> {
    let packed = compress::gzip(text.as_bytes()).map_err(CipherError::Io)?;
    Ok(BASE64.encode(cipher.encrypt_vec("", &packed)?))
}
