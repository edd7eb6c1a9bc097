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

use myba_lib::blob;
use myba_lib::commit::MirrorPayload;
use myba_lib::commit::mirror_commit;
use myba_lib::manifest::Manifest;
use myba_lib::remote;

use crate::common::TestEnv;

#[test]
fn commit_mirrors_into_encrypted_repo() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("foo/.dotfile", b"foo\n");
    env.write_file("foo/other.file", &[0u8, 1, 2, 3].repeat(1024));
    let plain_commit = env.plain_commit(&["foo"], "first backup");

    let enc_commit = mirror_commit(&env.ctx(), &plain_commit, &env.settings.work_tree)
        .unwrap()
        .unwrap();
    assert_eq!(env.enc.repo.head().unwrap().unwrap(), enc_commit);

    // The encrypted commit message decrypts to the plain commit metadata.
    let message = env
        .enc
        .repo
        .run_str(&["show", "--no-patch", "--format=%B", "HEAD"])
        .unwrap();
    let payload = MirrorPayload::decode(&env.cipher, &message).unwrap();
    assert_eq!(payload.meta.author_name, "Test User");
    assert_eq!(payload.meta.author_date, "1700000000 +0000");
    assert!(payload.meta.body.starts_with("first backup"));
    // Two files plus the directory marker.
    assert_eq!(payload.changes.len(), 3);

    // The committed manifest decodes to the plaintext one.
    let manifest_text =
        fs::read_to_string(env.settings.manifest_dir().join(&plain_commit)).unwrap();
    let manifest = Manifest::parse(&manifest_text).unwrap();
    assert_eq!(manifest.len(), 3);
    let encoded = fs::read(
        env.settings
            .encrypted_repo()
            .join(format!("manifest/{plain_commit}")),
    )
    .unwrap();
    assert_eq!(Manifest::decode(&env.cipher, &encoded).unwrap(), manifest);

    // Every encrypted blob decrypts back to the plaintext bytes.
    for entry in manifest.entries() {
        assert!(entry.enc_path.starts_with("d/"));
        let enc_blob = fs::read(env.settings.encrypted_repo().join(&entry.enc_path)).unwrap();
        let plaintext = blob::decrypt_bytes(&env.cipher, &entry.plain_path, &enc_blob).unwrap();
        assert_eq!(plaintext, env.read_file(&entry.plain_path));
    }
}

#[test]
fn mirroring_the_same_commit_twice_is_a_no_op() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("note.txt", b"text\n");
    let plain_commit = env.plain_commit(&["note.txt"], "add note");

    assert!(
        mirror_commit(&env.ctx(), &plain_commit, &env.settings.work_tree)
            .unwrap()
            .is_some()
    );
    let head_before = env.enc.repo.head().unwrap();
    assert!(
        mirror_commit(&env.ctx(), &plain_commit, &env.settings.work_tree)
            .unwrap()
            .is_none()
    );
    assert_eq!(env.enc.repo.head().unwrap(), head_before);
}

#[test]
fn metadata_only_commit_stages_no_manifest() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("a.txt", b"a\n");
    let first = env.plain_commit(&["a.txt"], "add a");
    mirror_commit(&env.ctx(), &first, &env.settings.work_tree).unwrap();

    let empty = env.plain_commit(&[], "nothing changed");
    let mirrored = mirror_commit(&env.ctx(), &empty, &env.settings.work_tree)
        .unwrap()
        .unwrap();
    // An encrypted commit exists, but its tree carries no manifest for the
    // metadata-only plain commit.
    assert_eq!(env.enc.repo.head().unwrap().unwrap(), mirrored);
    assert!(
        env.enc
            .repo
            .try_run(&["cat-file", "-e", format!("HEAD:manifest/{empty}").as_str()])
            .unwrap()
            .is_none()
    );
    // The plaintext manifest exists and is empty.
    let text = fs::read_to_string(env.settings.manifest_dir().join(&empty)).unwrap();
    assert_eq!(text, "");
}

#[test]
fn rename_removes_the_old_encrypted_path() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("renamed.file", b"bar\n");
    let first = env.plain_commit(&["renamed.file"], "add file");
    mirror_commit(&env.ctx(), &first, &env.settings.work_tree).unwrap();
    let old_enc = env.ctx().enc_path("renamed.file");

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

    let tracked = env.enc.repo.run_str(&["ls-files"]).unwrap();
    let new_enc = env.ctx().enc_path("renamed.file.3");
    assert!(!tracked.contains(&old_enc));
    assert!(tracked.contains(&new_enc));
}

#[test]
fn wrong_password_manifests_are_detected_and_removed() {
    let Some(env) = TestEnv::new() else { return };
    env.write_file("a.txt", b"a\n");
    let plain_commit = env.plain_commit(&["a.txt"], "add a");
    mirror_commit(&env.ctx(), &plain_commit, &env.settings.work_tree).unwrap();
    let plain_manifest = env.settings.manifest_dir().join(&plain_commit);
    assert!(plain_manifest.is_file());

    let wrong = env.other_cipher("wrong");
    let report = remote::refresh_manifests(&env.ctx_with(&wrong)).unwrap();
    assert_eq!(report.refreshed, 0);
    assert_eq!(report.bad, 1);
    // The stale plaintext manifest is gone, so a retry starts clean.
    assert!(!plain_manifest.exists());

    let report = remote::refresh_manifests(&env.ctx()).unwrap();
    assert_eq!(report.bad, 0);
    assert_eq!(report.refreshed, 1);
    assert!(plain_manifest.is_file());
}
