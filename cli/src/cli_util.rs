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

//! Shared command plumbing: repository handles, password resolution and
//! path normalization.

use std::env;
use std::path::Path;

use myba_lib::cipher::Cipher;
use myba_lib::context::BackupContext;
use myba_lib::git::EncryptedRepo;
use myba_lib::git::PlainRepo;
use myba_lib::pool::WorkerPool;
use myba_lib::settings::Password;
use myba_lib::settings::Settings;

use crate::command_error::CommandError;
use crate::ui::Ui;

pub struct CommandHelper {
    settings: Settings,
    /// Password from the first prompt of this invocation, so multi-phase
    /// commands ask only once.
    cached_password: Option<Password>,
}

impl CommandHelper {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cached_password: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn plain(&self) -> PlainRepo {
        PlainRepo::open(&self.settings)
    }

    pub fn enc(&self) -> EncryptedRepo {
        EncryptedRepo::open(&self.settings)
    }

    pub fn require_initialized(&self) -> Result<PlainRepo, CommandError> {
        let plain = self.plain();
        if !plain.is_initialized() {
            return Err(CommandError::user(format!(
                "No backup repository at {}; run `myba init` or `myba clone` first",
                self.settings.plain_repo.display()
            )));
        }
        Ok(plain)
    }

    pub fn require_encrypted(&self) -> Result<EncryptedRepo, CommandError> {
        let enc = self.enc();
        if !enc.is_initialized() {
            return Err(CommandError::user(format!(
                "No encrypted repository at {}; run `myba init` or `myba clone` first",
                self.settings().encrypted_repo().display()
            )));
        }
        Ok(enc)
    }

    /// The backup password: `PASSWORD` from the environment, or a terminal
    /// prompt (confirmed when `confirm` is set).
    pub fn password(&mut self, ui: &Ui, confirm: bool) -> Result<Password, CommandError> {
        if let Some(password) = &self.settings.password {
            return Ok(password.clone());
        }
        if let Some(password) = &self.cached_password {
            return Ok(password.clone());
        }
        let password = ui.prompt_password(confirm)?;
        self.cached_password = Some(password.clone());
        Ok(password)
    }

    /// Everything a pipeline operation needs, built in one step.
    pub fn op_state(&mut self, ui: &Ui, confirm_password: bool) -> Result<OpState, CommandError> {
        let plain = self.require_initialized()?;
        let enc = self.enc();
        let password = self.password(ui, confirm_password)?;
        let cipher = Cipher::from_settings(&self.settings, password);
        let pool = WorkerPool::new(self.settings.resolved_jobs())?;
        Ok(OpState {
            plain,
            enc,
            cipher,
            pool,
        })
    }

    /// Normalizes a user-supplied path to be relative to the work tree.
    /// Relative arguments are resolved against the current directory first,
    /// falling back to work-tree-relative when that leads outside.
    pub fn rel_to_work_tree(&self, arg: &str) -> Result<String, CommandError> {
        let work_tree = &self.settings.work_tree;
        let path = Path::new(arg);
        let absolute;
        let resolved = if path.is_absolute() {
            path
        } else {
            absolute = env::current_dir()?.join(path);
            &*absolute
        };
        if let Ok(rel) = resolved.strip_prefix(work_tree) {
            let rel = rel.to_string_lossy().into_owned();
            return Ok(if rel.is_empty() { ".".to_string() } else { rel });
        }
        if path.is_relative() {
            return Ok(arg.trim_end_matches('/').to_string());
        }
        Err(CommandError::user(format!(
            "{arg} is outside the work tree {}",
            work_tree.display()
        )))
    }
}

/// Owned pipeline state; borrow a [`BackupContext`] from it per call.
pub struct OpState {
    pub plain: PlainRepo,
    pub enc: EncryptedRepo,
    pub cipher: Cipher,
    pub pool: WorkerPool,
}

impl OpState {
    pub fn context<'a>(&'a self, settings: &'a Settings) -> BackupContext<'a> {
        BackupContext {
            settings,
            cipher: &self.cipher,
            plain: &self.plain,
            enc: &self.enc,
            pool: &self.pool,
        }
    }
}
