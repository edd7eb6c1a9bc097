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

/// Clone an encrypted backup from a remote
///
/// Performs a blob-less partial clone into the encrypted repository,
/// configures the plain repository next to it, and decrypts the manifests
/// with the prompted password. Follow with `decrypt` or `checkout` to get
/// files back.
#[derive(clap::Args, Clone, Debug)]
pub struct CloneArgs {
    /// URL of a previously pushed encrypted repository
    url: String,
}

#[instrument(skip_all)]
pub fn cmd_clone(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &CloneArgs,
) -> Result<(), CommandError> {
    if helper.plain().is_initialized() {
        return Err(CommandError::user(format!(
            "A backup repository already exists at {}",
            helper.settings().plain_repo.display()
        )));
    }
    remote::clone_repos(helper.settings(), &args.url)?;
    let state = helper.op_state(ui, false)?;
    let ctx = state.context(helper.settings());
    let report = remote::refresh_manifests(&ctx)?;
    if report.bad > 0 {
        return Err(CommandError::failure(format!(
            "{} manifest(s) did not decrypt; wrong password?",
            report.bad
        )));
    }
    println!(
        "Cloned into {}; {} manifests decrypted",
        helper.settings().plain_repo.display(),
        report.refreshed
    );
    Ok(())
}
