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

use std::fs;

use assert_matches::assert_matches;
use myba_lib::checkout;
use myba_lib::checkout::CheckoutError;
use myba_lib::checkout::CheckoutTarget;
use myba_lib::commit::CommitError;
use myba_lib::commit::MirrorPayload;
use myba_lib::commit::mirror_commit;
use myba_lib::remote;
use myba_lib::replay;
use myba_lib::replay::ReplayError;

use crate::common::TestEnv;
use crate::common::file_url;

#[test]
fn clone_and_sequential_restore_recreates_history() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("renamed.file", b"bar\n");
    let first = env.plain_commit(&["renamed.file"], "add file");
    mirror_commit(&env.ctx(), &first, &env.settings.work_tree).unwrap();

    fs::rename(
        env.settings.work_tree.join("renamed.file"),
        env.settings.work_tree.join("renamed.file.3"),
    )
    .unwrap();
    env.plain
        .repo
        .run(&["rm", "-q", "--cached", "--", "renamed.file"])
        .unwrap();
    env.plain.add(&["renamed.file.3".to_string()]).unwrap();
    let second = env.plain_commit(&[], "rename file");
    mirror_commit(&env.ctx(), &second, &env.settings.work_tree).unwrap();

    let remote_path = env.make_bare_remote("remote.git");
    env.enc.remote_add("origin", &file_url(&remote_path)).unwrap();
    remote::push(&env.enc, None).unwrap();

    let Some((root, settings)) = TestEnv::new_unborn() else {
        return;
    };
    remote::clone_repos(&settings, &file_url(&remote_path)).unwrap();
    let cloned = TestEnv::finish_open(root, settings);
    let ctx = cloned.ctx();
    let report = remote::refresh_manifests(&ctx).unwrap();
    assert_eq!(report.bad, 0);
    assert_eq!(report.refreshed, 2);

    assert_eq!(replay::restore_sequential(&ctx).unwrap(), 2);

    // Linear history with the original subjects, authors and dates.
    let log = cloned
        .plain
        .repo
        .run_str(&["log", "--format=%s|%an|%ad", "--date=raw"])
        .unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
        [
            "rename file|Test User|1700000000 +0000",
            "add file|Test User|1700000000 +0000",
        ]
    );

    // The final snapshot has the renamed path with the original bytes, and
    // the old path is gone.
    let restored = cloned
        .plain
        .repo
        .run(&["show", "HEAD:renamed.file.3"])
        .unwrap();
    assert_eq!(restored, b"bar\n");
    assert!(
        cloned
            .plain
            .repo
            .try_run(&["cat-file", "-e", "HEAD:renamed.file"])
            .unwrap()
            .is_none()
    );
    // The first commit still has the original name.
    let parent = cloned.plain.repo.run(&["show", "HEAD~1:renamed.file"]).unwrap();
    assert_eq!(parent, b"bar\n");
}

#[test]
fn squash_restore_materializes_the_final_state() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("foo/.dotfile", b"version one\n");
    let first = env.plain_commit(&["foo"], "add");
    mirror_commit(&env.ctx(), &first, &env.settings.work_tree).unwrap();
    env.write_file("foo/.dotfile", b"version two\n");
    env.plain.add(&["foo/.dotfile".to_string()]).unwrap();
    let second = env.plain_commit(&[], "modify");
    mirror_commit(&env.ctx(), &second, &env.settings.work_tree).unwrap();

    let remote_path = env.make_bare_remote("remote.git");
    env.enc.remote_add("origin", &file_url(&remote_path)).unwrap();
    remote::push(&env.enc, None).unwrap();

    let Some((root, settings)) = TestEnv::new_unborn() else {
        return;
    };
    remote::clone_repos(&settings, &file_url(&remote_path)).unwrap();
    let cloned = TestEnv::finish_open(root, settings);
    // Squash commits need a committer identity like any other commit.
    cloned.plain.repo.config_set("user.name", "Test User").unwrap();
    cloned
        .plain
        .repo
        .config_set("user.email", "test@example.com")
        .unwrap();
    let ctx = cloned.ctx();
    remote::refresh_manifests(&ctx).unwrap();

    let files = replay::restore_squash(&ctx).unwrap();
    assert!(files >= 1);
    assert_eq!(cloned.read_file("foo/.dotfile"), b"version two\n");
    // One commit, regardless of the original history length.
    let log = cloned.plain.repo.run_str(&["log", "--format=%s"]).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with("Restore at "));
}

#[test]
fn restore_onto_existing_history_requires_overwrite() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("a.txt", b"a\n");
    let commit = env.plain_commit(&["a.txt"], "add a");
    mirror_commit(&env.ctx(), &commit, &env.settings.work_tree).unwrap();

    // P already has commits; restoring over it must be refused.
    assert_matches!(
        replay::restore_sequential(&env.ctx()),
        Err(ReplayError::AlreadyRestored)
    );
}

#[test]
fn reencrypt_replays_history_under_the_new_password() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("a.txt", b"first file\n");
    let first = env.plain_commit(&["a.txt"], "add a");
    mirror_commit(&env.ctx(), &first, &env.settings.work_tree).unwrap();
    env.write_file("b.txt", b"second file\n");
    let second = env.plain_commit(&["b.txt"], "add b");
    mirror_commit(&env.ctx(), &second, &env.settings.work_tree).unwrap();

    let new_cipher = env.other_cipher("brand-new");
    let new_ctx = env.ctx_with(&new_cipher);
    assert_eq!(replay::reencrypt(&new_ctx).unwrap(), 2);

    // The old password no longer decodes the mirrored messages.
    let message = env
        .enc
        .repo
        .run_str(&["show", "--no-patch", "--format=%B", "HEAD"])
        .unwrap();
    assert_matches!(
        MirrorPayload::decode(&env.cipher, &message),
        Err(CommitError::WrongPassword)
    );
    let payload = MirrorPayload::decode(&new_cipher, &message).unwrap();
    assert!(payload.meta.body.starts_with("add b"));

    // Tree entries: one blob per file plus one manifest per commit.
    let tracked = env.enc.repo.run_str(&["ls-files"]).unwrap();
    assert_eq!(tracked.lines().count(), 4);

    // Manifests refresh under the new password and fail under the old one.
    assert_eq!(remote::refresh_manifests(&new_ctx).unwrap().bad, 0);
    let stale = remote::refresh_manifests(&env.ctx()).unwrap();
    assert_eq!(stale.bad, 2);
}

#[test]
fn checkout_refuses_overwrites_unless_confirmed() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("foo/.dotfile", b"foo\n");
    let commit = env.plain_commit(&["foo"], "add");
    mirror_commit(&env.ctx(), &commit, &env.settings.work_tree).unwrap();

    let ctx = env.ctx();
    let target = CheckoutTarget::Patterns(vec!["foo/.dotfile".to_string()]);
    // The file still exists in the work tree, so a declining callback
    // (no TTY behaves the same) aborts the checkout.
    assert_matches!(
        checkout::checkout(&ctx, &target, &mut |_| false),
        Err(CheckoutError::OverwriteRefused { .. })
    );
    checkout::checkout(&ctx, &target, &mut |_| true).unwrap();
    assert_eq!(env.read_file("foo/.dotfile"), b"foo\n");
}

#[test]
fn checkout_disambiguates_commits_from_patterns() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("a.txt", b"version one\n");
    let first = env.plain_commit(&["a.txt"], "one");
    env.write_file("a.txt", b"version two\n");
    env.plain.add(&["a.txt".to_string()]).unwrap();
    env.plain_commit(&[], "two");

    let ctx = env.ctx();
    let target = checkout::resolve_target(&ctx, &[first.clone()]).unwrap();
    assert_eq!(target, CheckoutTarget::PlainCommit(first));
    checkout::checkout(&ctx, &target, &mut |_| true).unwrap();
    assert_eq!(env.read_file("a.txt"), b"version one\n");

    let target = checkout::resolve_target(&ctx, &["a.txt".to_string()]).unwrap();
    assert_eq!(
        target,
        CheckoutTarget::Patterns(vec!["a.txt".to_string()])
    );
}
