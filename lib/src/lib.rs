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

//! Library for myba: encrypted, git-backed file backup.
//!
//! Two coupled repositories implement the backup: a plain repository (P)
//! tracks the user's files under a work tree and is never pushed, while an
//! encrypted repository (E) holds deterministically-named ciphertext blobs
//! plus per-commit manifests and is the only thing synced to remotes. Every
//! plain commit is mirrored by an encrypted commit whose message embeds the
//! plaintext commit metadata, encrypted and armored; reconstructing P from E
//! requires only the password.

#![deny(unused_must_use)]

pub mod blob;
pub mod checkout;
pub mod cipher;
pub mod cleanup;
pub mod commit;
pub mod compress;
pub mod context;
pub mod enc_path;
pub mod git;
pub mod manifest;
pub mod pool;
pub mod remote;
pub mod replay;
pub mod settings;
