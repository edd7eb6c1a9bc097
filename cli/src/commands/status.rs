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

use tracing::instrument;

use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// Show the status of tracked files (passthrough to `git status`)
#[derive(clap::Args, Clone, Debug)]
pub struct StatusArgs {
    /// Arguments passed through to `git status`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[instrument(skip_all)]
pub fn cmd_status(
    _ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &StatusArgs,
) -> Result<(), CommandError> {
    passthrough(helper, "status", &args.args)
}

pub(super) fn passthrough(
    helper: &CommandHelper,
    subcommand: &str,
    args: &[String],
) -> Result<(), CommandError> {
    let plain = helper.require_initialized()?;
    let mut git_args = vec![subcommand.to_string()];
    git_args.extend(args.iter().cloned());
    let code = plain.repo.run_inherited(&git_args)?;
    if code != 0 {
        return Err(CommandError::exit(code));
    }
    Ok(())
}
