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

/// Run a raw git command against the plain repository
#[derive(clap::Args, Clone, Debug)]
pub struct GitArgs {
    /// Arguments passed through to git
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    args: Vec<String>,
}

/// Run a raw git command against the encrypted repository
#[derive(clap::Args, Clone, Debug)]
pub struct GitEncArgs {
    /// Arguments passed through to git
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    args: Vec<String>,
}

#[instrument(skip_all)]
pub fn cmd_git(
    _ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &GitArgs,
) -> Result<(), CommandError> {
    let plain = helper.require_initialized()?;
    let code = plain.repo.run_inherited(&args.args)?;
    if code != 0 {
        return Err(CommandError::exit(code));
    }
    Ok(())
}

#[instrument(skip_all)]
pub fn cmd_git_enc(
    _ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &GitEncArgs,
) -> Result<(), CommandError> {
    let enc = helper.require_encrypted()?;
    let code = enc.repo.run_inherited(&args.args)?;
    if code != 0 {
        return Err(CommandError::exit(code));
    }
    Ok(())
}
