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

/// Stop backing up files or directories
///
/// The plaintext stays on disk; the next `commit` records the removal.
#[derive(clap::Args, Clone, Debug)]
pub struct RmArgs {
    /// Paths to stop tracking
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<String>,
}

#[instrument(skip_all)]
pub fn cmd_rm(_ui: &mut Ui, helper: &mut CommandHelper, args: &RmArgs) -> Result<(), CommandError> {
    let plain = helper.require_initialized()?;
    let rel_paths = args
        .paths
        .iter()
        .map(|path| helper.rel_to_work_tree(path))
        .collect::<Result<Vec<_>, _>>()?;
    plain.remove(&rel_paths)?;
    Ok(())
}
