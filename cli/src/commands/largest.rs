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

/// List the largest backed-up files
#[derive(clap::Args, Clone, Debug)]
pub struct LargestArgs {
    /// How many files to show
    #[arg(short = 'n', long, default_value_t = 20)]
    count: usize,
}

#[instrument(skip_all)]
pub fn cmd_largest(
    _ui: &mut Ui,
    helper: &mut CommandHelper,
    args: &LargestArgs,
) -> Result<(), CommandError> {
    let plain = helper.require_initialized()?;
    if plain.repo.head()?.is_none() {
        return Err(CommandError::user("No commits yet"));
    }
    for (size, path) in plain.largest("HEAD")?.into_iter().take(args.count) {
        println!("{size:>12}  {path}");
    }
    Ok(())
}
