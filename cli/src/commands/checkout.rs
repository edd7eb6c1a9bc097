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

use myba_lib::checkout;
use tracing::instrument;

use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// Restore files from the backup, or check out a commit
///
/// The first argument is tried as a commit in the plain repository, then in
/// the encrypted one; otherwise all arguments are path patterns matched
/// against the backed-up plaintext paths. Matching ciphertext is fetched
/// sparsely, decrypted and written under the work tree.
#[derive(clap::Args, Clone, Debug)]
pub struct CheckoutArgs {
    /// Path patterns, or a single commit
    #[arg(required = true, value_name = "PATH|COMMIT")]
    targets: Vec<String>,
}

#[instrument(skip_all)]
pub fn cmd_checkout(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &CheckoutArgs,
) -> Result<(), CommandError> {
    let state = helper.op_state(ui, false)?;
    let ctx = state.context(helper.settings());
    let targets: Vec<String> = args
        .targets
        .iter()
        .map(|target| {
            helper
                .rel_to_work_tree(target)
                .unwrap_or_else(|_| target.clone())
        })
        .collect();
    let target = checkout::resolve_target(&ctx, &targets)?;
    let yes_overwrite = helper.settings().yes_overwrite;
    checkout::checkout(&ctx, &target, &mut |path| {
        yes_overwrite || ui.prompt_overwrite(path)
    })?;
    Ok(())
}
