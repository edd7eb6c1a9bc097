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

use myba_lib::replay;
use tracing::instrument;

use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// Re-encrypt the whole backup under a new password
///
/// The encrypted tree is emptied (keeping the self-bootstrap copy) and the
/// plain history replayed commit-by-commit under the new password, taken
/// from `PASSWORD` or prompted with confirmation. The old password is not
/// needed. Remember to `push` afterwards.
#[derive(clap::Args, Clone, Debug)]
pub struct ReencryptArgs {}

#[instrument(skip_all)]
pub fn cmd_reencrypt(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    _args: &ReencryptArgs,
) -> Result<(), CommandError> {
    // The password resolved here is the NEW one; confirm it like first use.
    let state = helper.op_state(ui, true)?;
    let ctx = state.context(helper.settings());
    let commits = replay::reencrypt(&ctx)?;
    println!("Re-encrypted {commits} commits under the new password");
    Ok(())
}
