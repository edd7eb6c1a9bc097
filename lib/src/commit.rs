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

//! The commit pipeline: mirror one plain commit into the encrypted repo.
//!
//! The caller has already produced the plain commit, so P's HEAD (or the
//! historic commit being replayed) is fixed before mirroring starts. The
//! pipeline reads the commit's name-status listing, encrypts changed files
//! in parallel, then serially translates each entry into encrypted-repo
//! index mutations and manifest lines, and finally commits to E with the
//! armored, encrypted plain-commit metadata as the message.

use std::collections::HashMap;
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
use crate::compress;
use crate::context::BackupContext;
use crate::git;
use crate::git::Change;
use crate::git::CommitMeta;
use crate::git::GitError;
use crate::manifest::Manifest;
use crate::manifest::ManifestError;

/// Paths per `git add` invocation; keeps argv well under platform limits.
const ADD_CHUNK: usize = 500;

#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("Cannot access {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Commit message does not decrypt to text; wrong password?")]
    WrongPassword,
    #[error("Malformed mirrored commit message: {reason}")]
    BadPayload { reason: &'static str },
}

fn path_error(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> CommitError {
    let path = path.as_ref().to_path_buf();
    move |source| CommitError::Path { path, source }
}

/// Plain-commit metadata embedded in the mirrored commit's message.
///
/// The textual form is a short header (author identity, raw author date and
/// the name-status line count), a blank line, the commit body, and the
/// name-status listing. The `changes` count makes the trailing block
/// unambiguous even when the body's last lines resemble one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorPayload {
    pub meta: CommitMeta,
    pub changes: Vec<Change>,
}

impl MirrorPayload {
    pub fn encode_text(&self) -> String {
        let mut body = self.meta.body.clone();
        if !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }
        format!(
            "author {}\nemail {}\ndate {}\nchanges {}\n\n{}{}",
            self.meta.author_name,
            self.meta.author_email,
            self.meta.author_date,
            self.changes.len(),
            body,
            git::format_name_status(&self.changes),
        )
    }

    pub fn parse_text(text: &str) -> Result<Self, CommitError> {
        let (header, rest) = text
            .split_once("\n\n")
            .ok_or(CommitError::BadPayload { reason: "missing header" })?;
        let mut author_name = None;
        let mut author_email = None;
        let mut author_date = None;
        let mut change_count = None;
        for line in header.lines() {
            if let Some(value) = line.strip_prefix("author ") {
                author_name = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("email ") {
                author_email = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("date ") {
                author_date = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("changes ") {
                change_count = value.parse::<usize>().ok();
            }
        }
        let change_count =
            change_count.ok_or(CommitError::BadPayload { reason: "missing change count" })?;
        let mut lines: Vec<&str> = rest.lines().collect();
        if lines.len() < change_count {
            return Err(CommitError::BadPayload { reason: "truncated name-status block" });
        }
        let status_lines = lines.split_off(lines.len() - change_count);
        let mut body = lines.join("\n");
        let trimmed = body.trim_end().len();
        body.truncate(trimmed);
        if !body.is_empty() {
            body.push('\n');
        }
        Ok(Self {
            meta: CommitMeta {
                author_name: author_name
                    .ok_or(CommitError::BadPayload { reason: "missing author" })?,
                author_email: author_email
                    .ok_or(CommitError::BadPayload { reason: "missing email" })?,
                author_date: author_date
                    .ok_or(CommitError::BadPayload { reason: "missing date" })?,
                body,
            },
            changes: git::parse_name_status(&status_lines.join("\n")),
        })
    }

    /// The encrypted commit message: base64 of the encrypted gzipped text.
    pub fn encode(&self, cipher: &Cipher) -> Result<String, CommitError> {
        let packed = compress::gzip(self.encode_text().as_bytes()).map_err(CipherError::Io)?;
        let encrypted = cipher.encrypt_vec("", &packed)?;
        Ok(BASE64.encode(encrypted))
    }

    pub fn decode(cipher: &Cipher, message: &str) -> Result<Self, CommitError> {
        let encrypted = BASE64
            .decode(message.trim().as_bytes())
            .map_err(|_| CommitError::BadPayload { reason: "not base64" })?;
        let decrypted = cipher.decrypt_vec("", &encrypted)?;
        let inflated = compress::gunzip_or_passthrough(decrypted);
        if inflated.contains(&0) {
            return Err(CommitError::WrongPassword);
        }
        let text = String::from_utf8(inflated).map_err(|_| CommitError::WrongPassword)?;
        Self::parse_text(&text)
    }
}

struct EncryptJob {
    plain_path: String,
    enc_rel: String,
}

/// Mirrors `plain_commit` (whose files are readable under `tree_root`) into
/// a new encrypted commit. Returns `None` when the commit is already
/// mirrored, which makes re-running `commit` idempotent on HEAD.
pub fn mirror_commit(
    ctx: &BackupContext<'_>,
    plain_commit: &str,
    tree_root: &Path,
) -> Result<Option<String>, CommitError> {
    let manifest_rel = format!("manifest/{plain_commit}");
    if ctx.enc.repo.head()?.is_some()
        && ctx
            .enc
            .repo
            .try_run(&["cat-file", "-e", format!("HEAD:{manifest_rel}").as_str()])?
            .is_some()
    {
        tracing::debug!(%plain_commit, "already mirrored; skipping");
        return Ok(None);
    }

    let changes = ctx.plain.name_status(plain_commit)?;
    let enc_root = ctx.enc.repo.work_tree().to_path_buf();

    // Encrypt phase: every added, modified, renamed or copied file, fanned
    // out over the pool. The serial phase below consumes the sizes.
    let mut jobs = Vec::new();
    for change in &changes {
        match change {
            Change::Added { path } | Change::Modified { path } => {
                jobs.push(EncryptJob {
                    plain_path: path.clone(),
                    enc_rel: ctx.enc_path(path),
                });
            }
            Change::Renamed { new, .. } | Change::Copied { new, .. } => {
                jobs.push(EncryptJob {
                    plain_path: new.clone(),
                    enc_rel: ctx.enc_path(new),
                });
            }
            Change::TypeChanged { path } => {
                tracing::warn!(%path, "type changed; backing up as a regular file");
                if tree_root.join(path).is_file() {
                    jobs.push(EncryptJob {
                        plain_path: path.clone(),
                        enc_rel: ctx.enc_path(path),
                    });
                } else {
                    tracing::warn!(%path, "not a regular file; skipping");
                }
            }
            Change::Deleted { .. } => {}
            Change::Unmerged { path } => {
                tracing::warn!(%path, "unmerged entry; skipping");
            }
            Change::Unknown { status, path } => {
                tracing::error!(%status, %path, "unrecognized status; skipping");
            }
        }
    }

    let verbose = ctx.settings.verbose;
    let sizes: HashMap<String, u64> = ctx
        .pool
        .run_all(jobs, |job, log| {
            let src = tree_root.join(&job.plain_path);
            let dst = enc_root.join(&job.enc_rel);
            let size = blob::encrypt_file(ctx.cipher, &job.plain_path, &src, &dst)?;
            if verbose {
                log.line(format!("encrypted {} ({size} bytes)", job.plain_path));
            }
            Ok::<_, BlobError>((job.plain_path, size))
        })?
        .into_iter()
        .collect();

    // Serial phase: index mutations and manifest lines, in listing order.
    let mut manifest = Manifest::new();
    let mut to_add = Vec::new();
    let mut lfs_touched = false;
    for change in &changes {
        match change {
            Change::Added { path } | Change::Modified { path } | Change::TypeChanged { path } => {
                if let Some(size) = sizes.get(path) {
                    let enc_rel = ctx.enc_path(path);
                    if *size > ctx.settings.lfs_threshold {
                        ctx.enc.lfs_track(&enc_rel)?;
                        lfs_touched = true;
                    }
                    manifest.push(&enc_rel, path);
                    to_add.push(enc_rel);
                }
            }
            Change::Renamed { old, new } => {
                let old_enc = ctx.enc_path(old);
                ctx.enc
                    .repo
                    .run(&["rm", "-q", "--sparse", "--ignore-unmatch", "--", old_enc.as_str()])?;
                ctx.enc.lfs_untrack(&old_enc);
                let enc_rel = ctx.enc_path(new);
                if let Some(size) = sizes.get(new)
                    && *size > ctx.settings.lfs_threshold
                {
                    ctx.enc.lfs_track(&enc_rel)?;
                    lfs_touched = true;
                }
                manifest.push(&enc_rel, new);
                to_add.push(enc_rel);
            }
            Change::Copied { new, .. } => {
                let enc_rel = ctx.enc_path(new);
                if let Some(size) = sizes.get(new)
                    && *size > ctx.settings.lfs_threshold
                {
                    ctx.enc.lfs_track(&enc_rel)?;
                    lfs_touched = true;
                }
                manifest.push(&enc_rel, new);
                to_add.push(enc_rel);
            }
            Change::Deleted { path } => {
                let old_enc = ctx.enc_path(path);
                ctx.enc
                    .repo
                    .run(&["rm", "-q", "--sparse", "--ignore-unmatch", "--", old_enc.as_str()])?;
                ctx.enc.lfs_untrack(&old_enc);
            }
            Change::Unmerged { .. } | Change::Unknown { .. } => {}
        }
    }
    if lfs_touched {
        to_add.push(".gitattributes".to_string());
    }

    // Self-bootstrap: the first encrypted commit carries the tool itself.
    if ctx.enc.repo.head()?.is_none()
        && let Some(name) = ctx.enc.bootstrap_name()
        && let Ok(exe) = std::env::current_exe()
    {
        let dst = enc_root.join(name);
        fs::copy(&exe, &dst).map_err(path_error(&dst))?;
        to_add.push(name.to_string());
    }

    // Manifest materialization: plaintext under P, ciphertext in E's tree.
    let manifest_dir = ctx.plain.manifest_dir();
    fs::create_dir_all(manifest_dir).map_err(path_error(manifest_dir))?;
    let plain_manifest_path = manifest_dir.join(plain_commit);
    fs::write(&plain_manifest_path, manifest.to_text())
        .map_err(path_error(&plain_manifest_path))?;
    if !manifest.is_empty() {
        let enc_manifest_path = enc_root.join(&manifest_rel);
        let enc_manifest_dir = enc_root.join("manifest");
        fs::create_dir_all(&enc_manifest_dir).map_err(path_error(&enc_manifest_dir))?;
        fs::write(&enc_manifest_path, manifest.encode(ctx.cipher)?)
            .map_err(path_error(&enc_manifest_path))?;
        to_add.push(manifest_rel);
    }

    // One bulk add with the remotes hidden, so a promisor remote cannot turn
    // every staged path into a lazy-fetch round trip.
    if !to_add.is_empty() {
        let remote_guard = ctx.enc.hide_remotes()?;
        for chunk in to_add.chunks(ADD_CHUNK) {
            let mut args = ["add", "--sparse", "--"].map(String::from).to_vec();
            args.extend(chunk.iter().cloned());
            ctx.enc.repo.run(&args)?;
        }
        drop(remote_guard);
    }

    let payload = MirrorPayload {
        meta: ctx.plain.commit_meta(plain_commit)?,
        changes,
    };
    let message = payload.encode(ctx.cipher)?;
    ctx.enc
        .repo
        .run(&["commit", "-q", "--allow-empty", "-m", message.as_str()])?;
    let enc_commit = ctx.enc.repo.head()?.ok_or(CommitError::BadPayload {
        reason: "commit produced no HEAD",
    })?;
    tracing::info!(%plain_commit, %enc_commit, files = manifest.len(), "mirrored commit");
    Ok(Some(enc_commit))
}
