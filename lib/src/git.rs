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

//! Facades over the plain (P) and encrypted (E) repositories.
//!
//! Both are ordinary git repositories driven through subprocesses. P is bare
//! with an explicit work-tree override pointing at the user's files and is
//! never pushed; E lives under `P/_encrypted`, tracks only ciphertext, and
//! is configured for sparse checkout and partial clones.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use bstr::ByteSlice as _;
use thiserror::Error;

use crate::manifest;
use crate::manifest::ManifestError;
use crate::settings::DIR_MARKER;
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Could not execute the git process")]
    Spawn(#[source] io::Error),
    #[error("git {command} failed: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("Cannot access {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    UnsupportedPath(#[from] ManifestError),
}

fn path_error(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> GitError {
    let path = path.as_ref().to_path_buf();
    move |source| GitError::Path { path, source }
}

/// One git repository: a git dir, a work tree, and nothing else.
#[derive(Clone, Debug)]
pub struct GitRepo {
    git_dir: PathBuf,
    work_tree: PathBuf,
}

impl GitRepo {
    pub fn new(git_dir: impl Into<PathBuf>, work_tree: impl Into<PathBuf>) -> Self {
        // Children run with the work tree as their working directory, so
        // both paths must not depend on the caller's.
        Self {
            git_dir: absolutize(git_dir.into()),
            work_tree: absolutize(work_tree.into()),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// The same git dir over a different work tree. Replay engines use this
    /// to materialize historic commits into throwaway directories.
    pub fn with_work_tree(&self, work_tree: impl Into<PathBuf>) -> Self {
        Self::new(self.git_dir.clone(), work_tree)
    }

    fn create_command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("--git-dir")
            .arg(&self.git_dir)
            .arg("--work-tree")
            .arg(&self.work_tree)
            // Locale-independent output so we can parse it.
            .env("LC_ALL", "C")
            .stdin(Stdio::null());
        // Pathspecs are always work-tree-relative, wherever the user ran us.
        if self.work_tree.is_dir() {
            cmd.current_dir(&self.work_tree);
        }
        cmd
    }

    /// Runs git with the given arguments, capturing output. Non-zero exit is
    /// an error carrying the captured stderr.
    pub fn run(&self, args: &[impl AsRef<OsStr>]) -> Result<Vec<u8>, GitError> {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(
        &self,
        args: &[impl AsRef<OsStr>],
        envs: &[(&str, &OsStr)],
    ) -> Result<Vec<u8>, GitError> {
        let mut cmd = self.create_command();
        cmd.args(args.iter().map(AsRef::as_ref));
        for (key, value) in envs {
            cmd.env(key, value);
        }
        tracing::debug!(cmd = ?cmd, "spawning a git subprocess");
        let output = cmd.output().map_err(GitError::Spawn)?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: format_args_lossy(args),
                exit_code: output.status.code(),
                stderr: output.stderr.to_str_lossy().trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Like [`run`](Self::run), but returns `None` on non-zero exit. For
    /// probes where failure is an answer, not an error.
    pub fn try_run(&self, args: &[impl AsRef<OsStr>]) -> Result<Option<Vec<u8>>, GitError> {
        let mut cmd = self.create_command();
        cmd.args(args.iter().map(AsRef::as_ref));
        tracing::debug!(cmd = ?cmd, "spawning a git subprocess (probe)");
        let output = cmd.output().map_err(GitError::Spawn)?;
        Ok(output.status.success().then_some(output.stdout))
    }

    /// Runs git with stdio inherited from the parent. For passthrough
    /// subcommands (`log`, `diff`, `status`, raw `git`) whose output goes
    /// straight to the user, possibly through a pager.
    pub fn run_inherited(&self, args: &[impl AsRef<OsStr>]) -> Result<i32, GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("--git-dir")
            .arg(&self.git_dir)
            .arg("--work-tree")
            .arg(&self.work_tree)
            .args(args.iter().map(AsRef::as_ref));
        if self.work_tree.is_dir() {
            cmd.current_dir(&self.work_tree);
        }
        tracing::debug!(cmd = ?cmd, "spawning an interactive git subprocess");
        let status = cmd.status().map_err(GitError::Spawn)?;
        Ok(status.code().unwrap_or(1))
    }

    /// Captured stdout as trimmed UTF-8 (lossy).
    pub fn run_str(&self, args: &[impl AsRef<OsStr>]) -> Result<String, GitError> {
        Ok(self.run(args)?.to_str_lossy().trim().to_string())
    }

    pub fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.run(&["config", key, value]).map(|_| ())
    }

    /// Resolves `rev` to a commit hash, or `None` if it does not name one.
    pub fn rev_parse_commit(&self, rev: &str) -> Result<Option<String>, GitError> {
        let spec = format!("{rev}^{{commit}}");
        Ok(self
            .try_run(&["rev-parse", "--verify", "--quiet", spec.as_str()])?
            .map(|out| out.to_str_lossy().trim().to_string())
            .filter(|hash| !hash.is_empty()))
    }

    /// HEAD's commit hash, or `None` on an unborn branch.
    pub fn head(&self) -> Result<Option<String>, GitError> {
        self.rev_parse_commit("HEAD")
    }

    /// The checked-out branch name, or `None` when HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        Ok(self
            .try_run(&["symbolic-ref", "--short", "--quiet", "HEAD"])?
            .map(|out| out.to_str_lossy().trim().to_string())
            .filter(|name| !name.is_empty()))
    }

    /// Name-status listing of `commit` against its first parent, with rename
    /// and copy detection.
    pub fn name_status(&self, commit: &str) -> Result<Vec<Change>, GitError> {
        let out = self.run_str(&[
            "diff-tree",
            "-r",
            "-M",
            "-C",
            "--root",
            "--no-commit-id",
            "--name-status",
            commit,
        ])?;
        Ok(parse_name_status(&out))
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path)
    }
}

fn format_args_lossy(args: &[impl AsRef<OsStr>]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn git_init(args: &[&OsStr]) -> Result<(), GitError> {
    let mut cmd = Command::new("git");
    cmd.arg("init").args(args).stdin(Stdio::null());
    tracing::debug!(cmd = ?cmd, "initializing a git repository");
    let output = cmd.output().map_err(GitError::Spawn)?;
    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: format!("init {}", format_args_lossy(args)),
            exit_code: output.status.code(),
            stderr: output.stderr.to_str_lossy().trim().to_string(),
        });
    }
    Ok(())
}

/// Blob-less partial clone of `url` into `dest`, with progress inherited.
/// The work tree is left unpopulated; the caller materializes it after the
/// sparse cone is configured, so only manifest blobs are ever fetched.
pub fn clone_filtered(url: &str, dest: &Path) -> Result<(), GitError> {
    let mut cmd = Command::new("git");
    cmd.arg("clone")
        .arg("--filter=blob:none")
        .arg("--no-checkout")
        .arg(url)
        .arg(dest)
        .stdin(Stdio::null());
    tracing::debug!(cmd = ?cmd, "cloning the encrypted repository");
    let status = cmd.status().map_err(GitError::Spawn)?;
    if !status.success() {
        return Err(GitError::CommandFailed {
            command: format!("clone --filter=blob:none {url}"),
            exit_code: status.code(),
            stderr: String::new(),
        });
    }
    Ok(())
}

/// One entry of a name-status listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Added { path: String },
    Modified { path: String },
    Deleted { path: String },
    TypeChanged { path: String },
    Renamed { old: String, new: String },
    Copied { src: String, new: String },
    Unmerged { path: String },
    Unknown { status: String, path: String },
}

/// Parses `--name-status` output (one record per line, TAB separated).
pub fn parse_name_status(text: &str) -> Vec<Change> {
    let mut changes = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let Some((status, rest)) = line.split_once('\t') else {
            continue;
        };
        let change = match status.chars().next() {
            Some('A') => Change::Added { path: rest.to_string() },
            Some('M') => Change::Modified { path: rest.to_string() },
            Some('D') => Change::Deleted { path: rest.to_string() },
            Some('T') => Change::TypeChanged { path: rest.to_string() },
            Some('U') => Change::Unmerged { path: rest.to_string() },
            Some('R') => match rest.split_once('\t') {
                Some((old, new)) => Change::Renamed {
                    old: old.to_string(),
                    new: new.to_string(),
                },
                None => Change::Unknown {
                    status: status.to_string(),
                    path: rest.to_string(),
                },
            },
            Some('C') => match rest.split_once('\t') {
                Some((src, new)) => Change::Copied {
                    src: src.to_string(),
                    new: new.to_string(),
                },
                None => Change::Unknown {
                    status: status.to_string(),
                    path: rest.to_string(),
                },
            },
            _ => Change::Unknown {
                status: status.to_string(),
                path: rest.to_string(),
            },
        };
        changes.push(change);
    }
    changes
}

/// Renders changes back into name-status lines (rename/copy scores are not
/// preserved; the letter is what replay consumes).
pub fn format_name_status(changes: &[Change]) -> String {
    let mut text = String::new();
    for change in changes {
        match change {
            Change::Added { path } => text.push_str(&format!("A\t{path}\n")),
            Change::Modified { path } => text.push_str(&format!("M\t{path}\n")),
            Change::Deleted { path } => text.push_str(&format!("D\t{path}\n")),
            Change::TypeChanged { path } => text.push_str(&format!("T\t{path}\n")),
            Change::Renamed { old, new } => text.push_str(&format!("R100\t{old}\t{new}\n")),
            Change::Copied { src, new } => text.push_str(&format!("C100\t{src}\t{new}\n")),
            Change::Unmerged { path } => text.push_str(&format!("U\t{path}\n")),
            Change::Unknown { status, path } => text.push_str(&format!("{status}\t{path}\n")),
        }
    }
    text
}

/// Author identity and message of one plain commit, as embedded in the
/// mirrored encrypted commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitMeta {
    pub author_name: String,
    pub author_email: String,
    /// Raw format: `<unix seconds> <tz offset>`.
    pub author_date: String,
    pub body: String,
}

/// The plain repository: bare over the user's work tree, never pushed.
#[derive(Clone, Debug)]
pub struct PlainRepo {
    pub repo: GitRepo,
    manifest_dir: PathBuf,
}

impl PlainRepo {
    pub fn open(settings: &Settings) -> Self {
        Self {
            repo: GitRepo::new(&settings.plain_repo, &settings.work_tree),
            manifest_dir: settings.manifest_dir(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.repo.git_dir().join("HEAD").is_file()
    }

    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    /// Creates and configures P. Idempotent over an existing repository.
    pub fn init(settings: &Settings) -> Result<Self, GitError> {
        let plain = Self::open(settings);
        fs::create_dir_all(&settings.plain_repo).map_err(path_error(&settings.plain_repo))?;
        git_init(&[
            OsStr::new("--quiet"),
            OsStr::new("--bare"),
            settings.plain_repo.as_os_str(),
        ])?;
        plain.configure(settings)?;
        fs::create_dir_all(&plain.manifest_dir).map_err(path_error(&plain.manifest_dir))?;
        Ok(plain)
    }

    /// Applies P's configuration to an existing git dir (used after clone).
    pub fn configure(&self, settings: &Settings) -> Result<(), GitError> {
        self.repo.config_set("diff.renames", "copies")?;
        self.repo.config_set("diff.renameLimit", "32767")?;
        self.repo.config_set("core.excludesFile", "/dev/null")?;
        self.repo.config_set("status.showUntrackedFiles", "no")?;
        self.seed_excludes(settings)?;
        Ok(())
    }

    /// Seeds `info/exclude` so the backup repositories never back themselves
    /// up when they live inside the work tree.
    fn seed_excludes(&self, settings: &Settings) -> Result<(), GitError> {
        let info_dir = self.repo.git_dir().join("info");
        fs::create_dir_all(&info_dir).map_err(path_error(&info_dir))?;
        let mut excludes = String::from(".git/\n");
        if let Ok(relative) = settings.plain_repo.strip_prefix(&settings.work_tree) {
            excludes.push_str(&format!("/{}/\n", relative.display()));
        }
        let path = info_dir.join("exclude");
        fs::write(&path, excludes).map_err(path_error(&path))?;
        Ok(())
    }

    /// Stages paths for backup. A directory gets an empty marker file
    /// dropped inside it so later commits re-add its whole subtree.
    pub fn add(&self, rel_paths: &[String]) -> Result<(), GitError> {
        let mut to_add = Vec::new();
        for rel in rel_paths {
            manifest::validate_plain_path(rel)?;
            let rel = rel.trim_end_matches('/');
            let full = self.repo.work_tree().join(rel);
            if full.is_dir() {
                let marker = full.join(DIR_MARKER);
                if !marker.exists() {
                    fs::write(&marker, b"").map_err(path_error(&marker))?;
                }
            }
            to_add.push(rel.to_string());
        }
        let mut args = vec!["add".to_string(), "--".to_string()];
        args.extend(to_add);
        self.repo.run(&args).map(|_| ())
    }

    /// Untracks paths without touching the plaintext on disk.
    pub fn remove(&self, rel_paths: &[String]) -> Result<(), GitError> {
        let mut args = ["rm", "--cached", "-r", "-q", "--"]
            .map(String::from)
            .to_vec();
        args.extend(rel_paths.iter().cloned());
        self.repo.run(&args).map(|_| ())
    }

    /// Re-stages every directory containing a tracked marker file, picking
    /// up files created since the directory was `add`-ed.
    pub fn re_add_marker_dirs(&self) -> Result<(), GitError> {
        let tracked = self.repo.run_str(&["ls-files"])?;
        let mut dirs = Vec::new();
        for path in tracked.lines() {
            if path == DIR_MARKER {
                dirs.push(".".to_string());
            } else if let Some(dir) = path.strip_suffix(&format!("/{DIR_MARKER}")) {
                dirs.push(dir.to_string());
            }
        }
        if dirs.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add".to_string(), "--".to_string()];
        args.extend(dirs);
        self.repo.run(&args).map(|_| ())
    }

    pub fn name_status(&self, commit: &str) -> Result<Vec<Change>, GitError> {
        self.repo.name_status(commit)
    }

    pub fn commit_meta(&self, commit: &str) -> Result<CommitMeta, GitError> {
        let out = self.repo.run(&[
            "show",
            "--no-patch",
            "--date=raw",
            "--format=%an%x00%ae%x00%ad%x00%B",
            commit,
        ])?;
        let text = out.to_str_lossy();
        let mut parts = text.splitn(4, '\0');
        let mut next = || parts.next().unwrap_or_default().to_string();
        Ok(CommitMeta {
            author_name: next(),
            author_email: next(),
            author_date: next(),
            body: next(),
        })
    }

    /// Tracked files at `commit`, largest first, as `(bytes, path)`.
    pub fn largest(&self, commit: &str) -> Result<Vec<(u64, String)>, GitError> {
        let out = self.repo.run_str(&["ls-tree", "-r", "-l", commit])?;
        let mut files = Vec::new();
        for line in out.lines() {
            // <mode> <type> <hash> <size>\t<path>
            let Some((meta, path)) = line.split_once('\t') else {
                continue;
            };
            if let Some(size) = meta.split_whitespace().nth(3).and_then(|s| s.parse().ok()) {
                files.push((size, path.to_string()));
            }
        }
        files.sort_by(|a, b| b.cmp(a));
        Ok(files)
    }
}

/// The encrypted repository: ciphertext blobs plus manifests, the only
/// repository that ever sees a remote.
#[derive(Clone, Debug)]
pub struct EncryptedRepo {
    pub repo: GitRepo,
    bootstrap_name: Option<String>,
}

impl EncryptedRepo {
    pub fn open(settings: &Settings) -> Self {
        let root = settings.encrypted_repo();
        Self {
            repo: GitRepo::new(root.join(".git"), &root),
            bootstrap_name: bootstrap_name(settings),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.repo.git_dir().join("HEAD").is_file()
    }

    /// The file name of the self-bootstrap copy at E's root, when enabled.
    pub fn bootstrap_name(&self) -> Option<&str> {
        self.bootstrap_name.as_deref()
    }

    pub fn init(settings: &Settings) -> Result<Self, GitError> {
        let enc = Self::open(settings);
        fs::create_dir_all(enc.repo.work_tree()).map_err(path_error(enc.repo.work_tree()))?;
        git_init(&[OsStr::new("--quiet"), enc.repo.work_tree().as_os_str()])?;
        enc.configure()?;
        Ok(enc)
    }

    /// Applies E's configuration to an existing git dir (used after clone).
    pub fn configure(&self) -> Result<(), GitError> {
        // Every tracked entry is ciphertext; keep git from ever diffing or
        // delta-compressing it as text.
        self.repo.config_set("core.bigFileThreshold", "100")?;
        self.repo.config_set("push.default", "current")?;
        self.repo.config_set("fetch.parallel", "4")?;
        // The plaintext identity lives encrypted inside commit messages;
        // E's own committer identity carries no information.
        self.repo.config_set("user.name", "myba")?;
        self.repo.config_set("user.email", "myba@localhost")?;
        let info_dir = self.repo.git_dir().join("info");
        fs::create_dir_all(&info_dir).map_err(path_error(&info_dir))?;
        let attributes = info_dir.join("attributes");
        fs::write(&attributes, "* binary -diff\n").map_err(path_error(&attributes))?;
        self.repo.run(&["sparse-checkout", "init", "--cone"])?;
        self.sparse_set(&[])?;
        Ok(())
    }

    /// Installs the sparse cone: `manifest/` and the self-bootstrap copy are
    /// always included, `extra_dirs` come from the operation at hand.
    pub fn sparse_set(&self, extra_dirs: &[String]) -> Result<(), GitError> {
        let mut args = ["sparse-checkout", "set", "manifest"]
            .map(String::from)
            .to_vec();
        let mut dirs = extra_dirs.to_vec();
        dirs.sort();
        dirs.dedup();
        args.extend(dirs);
        self.repo.run(&args).map(|_| ())
    }

    pub fn sparse_reapply(&self) -> Result<(), GitError> {
        self.repo.run(&["sparse-checkout", "reapply"]).map(|_| ())
    }

    pub fn sparse_disable(&self) -> Result<(), GitError> {
        self.repo.run(&["sparse-checkout", "disable"]).map(|_| ())
    }

    pub fn remotes(&self) -> Result<Vec<String>, GitError> {
        Ok(self
            .repo
            .run_str(&["remote"])?
            .lines()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// Registers a remote as a promisor with a blob-less clone filter, so
    /// fetches bring trees and commits eagerly but blobs on demand.
    pub fn remote_add(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.repo.run(&["remote", "add", name, url])?;
        self.repo
            .config_set(&format!("remote.{name}.promisor"), "true")?;
        self.repo
            .config_set(&format!("remote.{name}.partialclonefilter"), "blob:none")?;
        Ok(())
    }

    /// Temporarily deletes all remote registrations. While a promisor remote
    /// is configured, `git add` issues one lazy-fetch round trip per missing
    /// blob; with the remotes hidden it operates locally only. The returned
    /// guard restores the saved configuration when dropped.
    pub fn hide_remotes(&self) -> Result<RemoteConfigGuard, GitError> {
        let saved = self
            .repo
            .try_run(&["config", "--local", "--get-regexp", r"^remote\."])?
            .map(|out| {
                out.to_str_lossy()
                    .lines()
                    .filter_map(|line| {
                        let (key, value) = line.split_once(' ')?;
                        Some((key.to_string(), value.to_string()))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        for name in self.remotes()? {
            self.repo.run(&["remote", "remove", name.as_str()])?;
        }
        Ok(RemoteConfigGuard {
            repo: self.repo.clone(),
            saved,
        })
    }

    pub fn lfs_track(&self, enc_path: &str) -> Result<(), GitError> {
        self.repo.run(&["lfs", "track", enc_path]).map(|_| ())
    }

    /// LFS may be unused entirely; failures here are logged, not fatal.
    pub fn lfs_untrack(&self, enc_path: &str) {
        if let Err(err) = self.repo.run(&["lfs", "untrack", enc_path]) {
            tracing::debug!(%enc_path, %err, "lfs untrack failed; ignoring");
        }
    }
}

/// Restores remote configuration removed by
/// [`hide_remotes`](EncryptedRepo::hide_remotes).
pub struct RemoteConfigGuard {
    repo: GitRepo,
    saved: Vec<(String, String)>,
}

impl Drop for RemoteConfigGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            // `--add` preserves multi-valued keys such as fetch refspecs.
            if let Err(err) = self.repo.run(&["config", "--local", "--add", key.as_str(), value.as_str()]) {
                tracing::warn!(%key, %err, "failed to restore remote configuration");
            }
        }
    }
}

fn bootstrap_name(settings: &Settings) -> Option<String> {
    if !settings.bootstrap_self {
        return None;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|name| name.to_string_lossy().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_status_covers_all_kinds() {
        let listing = "A\tnew.txt\n\
                       M\tchanged.txt\n\
                       D\tgone.txt\n\
                       R100\told.txt\tnew-name.txt\n\
                       C75\tsrc.txt\tcopy.txt\n\
                       T\tlink\n\
                       U\tconflicted\n\
                       Q\tstrange\n";
        let changes = parse_name_status(listing);
        assert_eq!(changes.len(), 8);
        assert_eq!(changes[0], Change::Added { path: "new.txt".into() });
        assert_eq!(changes[1], Change::Modified { path: "changed.txt".into() });
        assert_eq!(changes[2], Change::Deleted { path: "gone.txt".into() });
        assert_eq!(
            changes[3],
            Change::Renamed {
                old: "old.txt".into(),
                new: "new-name.txt".into()
            }
        );
        assert_eq!(
            changes[4],
            Change::Copied {
                src: "src.txt".into(),
                new: "copy.txt".into()
            }
        );
        assert_eq!(changes[5], Change::TypeChanged { path: "link".into() });
        assert_eq!(changes[6], Change::Unmerged { path: "conflicted".into() });
        assert_eq!(
            changes[7],
            Change::Unknown {
                status: "Q".into(),
                path: "strange".into()
            }
        );
    }

    #[test]
    fn name_status_round_trips_through_format() {
        let changes = vec![
            Change::Added { path: "a".into() },
            Change::Renamed {
                old: "b".into(),
                new: "c".into(),
            },
            Change::Deleted { path: "d".into() },
        ];
        assert_eq!(parse_name_status(&format_name_status(&changes)), changes);
    }

    #[test]
    fn empty_listing_parses_to_nothing() {
        assert!(parse_name_status("").is_empty());
        assert!(parse_name_status("\n\n").is_empty());
    }
}
