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

use myba_lib::checkout;
use myba_lib::checkout::CheckoutTarget;
use myba_lib::commit::mirror_commit;
use myba_lib::remote;

use crate::common::TestEnv;
use crate::common::file_url;

/// 1 MiB of deterministic, NUL-bearing (binary) content.
fn binary_payload() -> Vec<u8> {
    (0..1024 * 1024u32).map(|i| (i * 31 + 7) as u8).collect()
}

#[test]
fn push_clone_checkout_round_trip() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("foo/.dotfile", b"foo\n");
    env.write_file("foo/other.file", &binary_payload());
    let commit = env.plain_commit(&["foo/.dotfile", "foo/other.file"], "m");
    mirror_commit(&env.ctx(), &commit, &env.settings.work_tree).unwrap();

    let remote_path = env.make_bare_remote("remote.git");
    env.enc.remote_add("origin", &file_url(&remote_path)).unwrap();
    remote::push(&env.enc, None).unwrap();

    // After push the local packs are reclaimed: only promisor markers stay.
    let pack_dir = env.settings.encrypted_repo().join(".git/objects/pack");
    let mut promisors = 0;
    for entry in fs::read_dir(&pack_dir).unwrap() {
        let path = entry.unwrap().path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("pack") => panic!("packfile survived gc: {}", path.display()),
            Some("promisor") => promisors += 1,
            _ => {}
        }
    }
    assert!(promisors > 0);

    // A fresh clone restores a single file first, then the directory.
    let Some((root, settings)) = TestEnv::new_unborn() else {
        return;
    };
    remote::clone_repos(&settings, &file_url(&remote_path)).unwrap();
    let cloned = TestEnv::finish_open(root, settings);
    let ctx = cloned.ctx();
    let report = remote::refresh_manifests(&ctx).unwrap();
    assert_eq!(report.bad, 0);
    assert_eq!(report.refreshed, 1);

    let target = CheckoutTarget::Patterns(vec!["foo/.dotfile".to_string()]);
    checkout::checkout(&ctx, &target, &mut |_| true).unwrap();
    assert_eq!(cloned.read_file("foo/.dotfile"), b"foo\n");
    assert!(!cloned.settings.work_tree.join("foo/other.file").exists());

    let target = CheckoutTarget::Patterns(vec!["foo".to_string()]);
    checkout::checkout(&ctx, &target, &mut |_| true).unwrap();
    assert_eq!(cloned.read_file("foo/other.file"), binary_payload());
}

#[test]
fn checkout_of_an_encrypted_commit_refreshes_manifests() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("a.txt", b"a\n");
    let commit = env.plain_commit(&["a.txt"], "add a");
    mirror_commit(&env.ctx(), &commit, &env.settings.work_tree).unwrap();
    let enc_commit = env.enc.repo.head().unwrap().unwrap();

    // Wipe the plaintext manifests, then recover them from E alone.
    fs::remove_dir_all(env.settings.manifest_dir()).unwrap();
    let ctx = env.ctx();
    let target = checkout::resolve_target(&ctx, &[enc_commit.clone()]).unwrap();
    assert_eq!(target, CheckoutTarget::EncryptedCommit(enc_commit));
    checkout::checkout(&ctx, &target, &mut |_| true).unwrap();
    assert!(env.settings.manifest_dir().join(&commit).is_file());
}
