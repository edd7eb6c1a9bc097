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

use myba_lib::commit::mirror_commit;
use myba_lib::git::EncryptedRepo;
use tracing::instrument;

use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// Commit the selected files and mirror the commit into the encrypted repo
///
/// Extra arguments are passed through to `git commit` on the plain
/// repository (e.g. `-m MESSAGE`). Mirroring is idempotent on HEAD, so a
/// failed run can simply be repeated.
#[derive(clap::Args, Clone, Debug)]
pub struct CommitArgs {
    /// Arguments passed through to `git commit`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[instrument(skip_all)]
pub fn cmd_commit(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &CommitArgs,
) -> Result<(), CommandError> {
    let plain = helper.require_initialized()?;
    plain.re_add_marker_dirs()?;

    let mut git_args = vec!["commit".to_string()];
    git_args.extend(args.args.iter().cloned());
    let code = plain.repo.run_inherited(&git_args)?;
    let Some(head) = plain.repo.head()? else {
        return Err(CommandError::exit(code));
    };
    if code != 0 {
        // Typically "nothing to commit": HEAD is unchanged, and mirroring
        // it again is a no-op anyway.
        tracing::debug!(%code, "plain commit made no new commit; mirroring HEAD");
    }

    if !helper.enc().is_initialized() {
        EncryptedRepo::init(helper.settings())?;
    }
    let state = helper.op_state(ui, false)?;
    let ctx = state.context(helper.settings());
    match mirror_commit(&ctx, &head, &helper.settings().work_tree)? {
        Some(enc_commit) => println!(
            "Mirrored {} into encrypted commit {}",
            &head[..12.min(head.len())],
            &enc_commit[..12.min(enc_commit.len())]
        ),
        None => println!("Already mirrored; nothing to do"),
    }
    Ok(())
}
