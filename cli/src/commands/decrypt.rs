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

/// Reconstruct the plain repository from the encrypted one
///
/// Walks the encrypted history parent-before-child and re-creates each
/// plain commit with its original message, author and date. With
/// `--squash`, history is ignored and the union of all manifests becomes a
/// single commit.
#[derive(clap::Args, Clone, Debug)]
pub struct DecryptArgs {
    /// Restore the final state as one commit instead of replaying history
    #[arg(long)]
    squash: bool,
}

#[instrument(skip_all)]
pub fn cmd_decrypt(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &DecryptArgs,
) -> Result<(), CommandError> {
    let state = helper.op_state(ui, false)?;
    let ctx = state.context(helper.settings());
    if args.squash {
        let files = replay::restore_squash(&ctx)?;
        println!("Restored {files} files in a single commit");
    } else {
        let commits = replay::restore_sequential(&ctx)?;
        println!("Recreated {commits} plain commits");
    }
    Ok(())
}
