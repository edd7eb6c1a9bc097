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

/// Reclaim local disk used by pushed ciphertext
///
/// Shrinks the encrypted checkout to the manifest cone and replaces
/// packfiles with promisor markers; blobs are re-fetched from a remote on
/// demand. Only safe after a successful `push`.
#[derive(clap::Args, Clone, Debug)]
pub struct GcArgs {}

#[instrument(skip_all)]
pub fn cmd_gc(_ui: &mut Ui, helper: &mut CommandHelper, _args: &GcArgs) -> Result<(), CommandError> {
    let enc = helper.require_encrypted()?;
    remote::gc(&enc)?;
    Ok(())
}
