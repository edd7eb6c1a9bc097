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

//! Shared state threaded through the pipelines.

use crate::cipher::Cipher;
use crate::enc_path;
use crate::git::EncryptedRepo;
use crate::git::PlainRepo;
use crate::pool::WorkerPool;
use crate::settings::Settings;

/// Everything an operation over the repository pair needs: resolved
/// settings, the keyed cipher, both repo facades and the worker pool.
pub struct BackupContext<'a> {
    pub settings: &'a Settings,
    pub cipher: &'a Cipher,
    pub plain: &'a PlainRepo,
    pub enc: &'a EncryptedRepo,
    pub pool: &'a WorkerPool,
}

impl BackupContext<'_> {
    /// Encrypted-repo path for a plaintext path under the current password.
    pub fn enc_path(&self, plain_path: &str) -> String {
        enc_path::enc_path(plain_path, self.cipher.password().as_str())
    }
}
