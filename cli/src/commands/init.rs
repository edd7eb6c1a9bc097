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

use myba_lib::git::EncryptedRepo;
use myba_lib::git::PlainRepo;
use tracing::instrument;

use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// Create the plain and encrypted backup repositories
///
/// The plain repository tracks files under the work tree and never leaves
/// this machine; the encrypted repository holds only ciphertext and is what
/// `push` syncs to remotes.
#[derive(clap::Args, Clone, Debug)]
pub struct InitArgs {}

#[instrument(skip_all)]
pub fn cmd_init(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    _args: &InitArgs,
) -> Result<(), CommandError> {
    if helper.plain().is_initialized() {
        return Err(CommandError::user(format!(
            "A backup repository already exists at {}",
            helper.settings().plain_repo.display()
        )));
    }
    // First use: make sure the user can type the password twice before
    // anything gets encrypted under it.
    let _password = helper.password(ui, true)?;
    PlainRepo::init(helper.settings())?;
    EncryptedRepo::init(helper.settings())?;
    println!(
        "Initialized backup repositories in {}",
        helper.settings().plain_repo.display()
    );
    Ok(())
}
