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

use super::status::passthrough;
use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// List tracked files (passthrough to `git ls-files`)
#[derive(clap::Args, Clone, Debug)]
pub struct LsFilesArgs {
    /// Arguments passed through to `git ls-files`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[instrument(skip_all)]
pub fn cmd_ls_files(
    _ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &LsFilesArgs,
) -> Result<(), CommandError> {
    passthrough(helper, "ls-files", &args.args)
}
