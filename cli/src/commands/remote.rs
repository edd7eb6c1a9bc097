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

/// Manage remotes of the encrypted repository
///
/// `remote add NAME URL` registers a promisor remote with a blob-less
/// filter, so clones and fetches transfer blobs only on demand. Any other
/// subcommand is passed through to `git remote`.
#[derive(clap::Args, Clone, Debug)]
pub struct RemoteArgs {
    /// `add NAME URL`, or any `git remote` subcommand
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    args: Vec<String>,
}

#[instrument(skip_all)]
pub fn cmd_remote(
    _ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &RemoteArgs,
) -> Result<(), CommandError> {
    let enc = helper.require_encrypted()?;
    if args.args[0] == "add" {
        let [_, name, url] = args.args.as_slice() else {
            return Err(CommandError::user("usage: myba remote add NAME URL"));
        };
        enc.remote_add(name, url)?;
        println!("Registered promisor remote {name}");
        return Ok(());
    }
    let mut git_args = vec!["remote".to_string()];
    git_args.extend(args.args.iter().cloned());
    let code = enc.repo.run_inherited(&git_args)?;
    if code != 0 {
        return Err(CommandError::exit(code));
    }
    Ok(())
}
