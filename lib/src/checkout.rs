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

//! Checkout/decrypt pipeline.
//!
//! `checkout` accepts three input shapes: a commit resolvable in P (plain
//! checkout, E untouched), a commit resolvable in E (manifests-only
//! materialization), or plaintext path patterns (sparse-fetch the matching
//! ciphertext blobs and decrypt them into the work tree).

use std::io;
use std::path::PathBuf;

use itertools::Itertools as _;
use thiserror::Error;

use crate::blob;
use crate::blob::BlobError;
use crate::context::BackupContext;
use crate::enc_path::cone_prefix;
use crate::git::GitError;
use crate::manifest;
use crate::manifest::ManifestError;
use crate::remote;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("No backed-up file matches {patterns:?}")]
    NoMatches { patterns: Vec<String> },
    #[error("Not overwriting {path}")]
    OverwriteRefused { path: String },
    #[error("{count} manifest(s) did not decrypt; wrong password?")]
    BadManifests { count: usize },
    #[error("Cannot access {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a `checkout` invocation asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// A commit in P: delegate to plain checkout.
    PlainCommit(String),
    /// A commit in E: materialize that commit's manifests only.
    EncryptedCommit(String),
    /// Plaintext path patterns to restore from the encrypted side.
    Patterns(Vec<String>),
}

/// Disambiguates the argument list: a first argument naming a commit in P
/// wins, then a commit in E, else everything is a path pattern.
pub fn resolve_target(
    ctx: &BackupContext<'_>,
    args: &[String],
) -> Result<CheckoutTarget, CheckoutError> {
    if let Some(first) = args.first() {
        if let Some(commit) = ctx.plain.repo.rev_parse_commit(first)? {
            if args.len() > 1 {
                tracing::warn!("extra arguments after a commit are ignored");
            }
            return Ok(CheckoutTarget::PlainCommit(commit));
        }
        if ctx.enc.is_initialized()
            && let Some(commit) = ctx.enc.repo.rev_parse_commit(first)?
        {
            if args.len() > 1 {
                tracing::warn!("extra arguments after a commit are ignored");
            }
            return Ok(CheckoutTarget::EncryptedCommit(commit));
        }
    }
    Ok(CheckoutTarget::Patterns(args.to_vec()))
}

/// Runs the checkout. `overwrite_ok` is consulted once per plaintext file
/// that already exists in the work tree; a refusal aborts the operation.
pub fn checkout(
    ctx: &BackupContext<'_>,
    target: &CheckoutTarget,
    overwrite_ok: &mut dyn FnMut(&str) -> bool,
) -> Result<(), CheckoutError> {
    match target {
        CheckoutTarget::PlainCommit(commit) => {
            ctx.plain.repo.run(&["checkout", "-q", commit.as_str()])?;
            Ok(())
        }
        CheckoutTarget::EncryptedCommit(commit) => {
            ctx.enc.sparse_set(&[])?;
            ctx.enc.repo.run(&["checkout", "-q", commit.as_str()])?;
            let report = remote::refresh_manifests(ctx)?;
            if report.bad > 0 {
                return Err(CheckoutError::BadManifests { count: report.bad });
            }
            Ok(())
        }
        CheckoutTarget::Patterns(patterns) => checkout_patterns(ctx, patterns, overwrite_ok),
    }
}

fn checkout_patterns(
    ctx: &BackupContext<'_>,
    patterns: &[String],
    overwrite_ok: &mut dyn FnMut(&str) -> bool,
) -> Result<(), CheckoutError> {
    let entries = manifest::scan_dir(ctx.plain.manifest_dir(), patterns)?;
    if entries.is_empty() {
        return Err(CheckoutError::NoMatches {
            patterns: patterns.to_vec(),
        });
    }

    // Cone mode wants directory prefixes; the blob names are leaves.
    let cones: Vec<String> = entries
        .iter()
        .map(|entry| cone_prefix(&entry.enc_path).to_string())
        .sorted()
        .dedup()
        .collect();
    ctx.enc.sparse_set(&cones)?;
    ctx.enc.sparse_reapply()?;

    // Overwrite prompting happens serially, before any fan-out, so the
    // terminal conversation is never interleaved with job output.
    for entry in &entries {
        let dst = ctx.settings.work_tree.join(&entry.plain_path);
        if dst.exists() && !overwrite_ok(&entry.plain_path) {
            return Err(CheckoutError::OverwriteRefused {
                path: entry.plain_path.clone(),
            });
        }
    }

    let enc_root = ctx.enc.repo.work_tree().to_path_buf();
    let work_tree = ctx.settings.work_tree.clone();
    ctx.pool.run_all(entries, |entry, log| {
        let src = enc_root.join(&entry.enc_path);
        if !src.is_file() {
            // Manifests accumulate history; a file deleted in a later
            // commit has no blob at HEAD.
            log.line(format!("skipping {} (not in the current tree)", entry.plain_path));
            return Ok(());
        }
        blob::decrypt_file(ctx.cipher, &entry.plain_path, &src, &work_tree.join(&entry.plain_path))?;
        log.line(format!("restored {}", entry.plain_path));
        Ok::<_, BlobError>(())
    })?;
    Ok(())
}
