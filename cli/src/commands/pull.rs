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

/// Pull the encrypted repository and refresh the decrypted manifests
#[derive(clap::Args, Clone, Debug)]
pub struct PullArgs {
    /// Remote to pull from (default: the configured upstream)
    remote: Option<String>,
}

#[instrument(skip_all)]
pub fn cmd_pull(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &PullArgs,
) -> Result<(), CommandError> {
    let state = helper.op_state(ui, false)?;
    let ctx = state.context(helper.settings());
    let report = remote::pull(&ctx, args.remote.as_deref())?;
    if report.bad > 0 {
        return Err(CommandError::failure(format!(
            "{} manifest(s) did not decrypt; wrong password?",
            report.bad
        )));
    }
    println!("Refreshed {} manifests", report.refreshed);
    Ok(())
}
