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

use myba_lib::remote;
use tracing::instrument;

use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// Push the encrypted repository to its remotes
///
/// Pushes to the named remote, or to every registered one, then reacquires
/// promisor state and reclaims local packfiles. Only ciphertext leaves the
/// machine; no password is involved.
#[derive(clap::Args, Clone, Debug)]
pub struct PushArgs {
    /// Remote to push to (default: all registered remotes)
    remote: Option<String>,
}

#[instrument(skip_all)]
pub fn cmd_push(
    _ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &PushArgs,
) -> Result<(), CommandError> {
    let enc = helper.require_encrypted()?;
    remote::push(&enc, args.remote.as_deref())?;
    Ok(())
}
