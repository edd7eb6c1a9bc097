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

mod add;
mod checkout;
mod clone;
mod commit;
mod decrypt;
mod diff;
mod gc;
mod git;
mod init;
mod largest;
mod log;
mod ls_files;
mod pull;
mod push;
mod reencrypt;
mod remote;
mod rm;
mod status;

use crate::cli_util::CommandHelper;
use crate::command_error::CommandError;
use crate::ui::Ui;

#[derive(clap::Parser, Clone, Debug)]
#[command(name = "myba", version)]
#[command(about = "Encrypted, version-controlled, distributed file backup")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Clone, Debug)]
pub enum Command {
    Init(init::InitArgs),
    Add(add::AddArgs),
    Rm(rm::RmArgs),
    Commit(commit::CommitArgs),
    Push(push::PushArgs),
    Pull(pull::PullArgs),
    Clone(clone::CloneArgs),
    Remote(remote::RemoteArgs),
    Decrypt(decrypt::DecryptArgs),
    Reencrypt(reencrypt::ReencryptArgs),
    Diff(diff::DiffArgs),
    Log(log::LogArgs),
    Status(status::StatusArgs),
    LsFiles(ls_files::LsFilesArgs),
    Largest(largest::LargestArgs),
    Checkout(checkout::CheckoutArgs),
    Gc(gc::GcArgs),
    Git(git::GitArgs),
    GitEnc(git::GitEncArgs),
}

pub fn run_command(
    ui: &mut Ui,
    helper: &mut CommandHelper,
    command: &Command,
) -> Result<(), CommandError> {
    match command {
        Command::Init(args) => init::cmd_init(ui, helper, args),
        Command::Add(args) => add::cmd_add(ui, helper, args),
        Command::Rm(args) => rm::cmd_rm(ui, helper, args),
        Command::Commit(args) => commit::cmd_commit(ui, helper, args),
        Command::Push(args) => push::cmd_push(ui, helper, args),
        Command::Pull(args) => pull::cmd_pull(ui, helper, args),
        Command::Clone(args) => clone::cmd_clone(ui, helper, args),
        Command::Remote(args) => remote::cmd_remote(ui, helper, args),
        Command::Decrypt(args) => decrypt::cmd_decrypt(ui, helper, args),
        Command::Reencrypt(args) => reencrypt::cmd_reencrypt(ui, helper, args),
        Command::Diff(args) => diff::cmd_diff(ui, helper, args),
        Command::Log(args) => log::cmd_log(ui, helper, args),
        Command::Status(args) => status::cmd_status(ui, helper, args),
        Command::LsFiles(args) => ls_files::cmd_ls_files(ui, helper, args),
        Command::Largest(args) => largest::cmd_largest(ui, helper, args),
        Command::Checkout(args) => checkout::cmd_checkout(ui, helper, args),
        Command::Gc(args) => gc::cmd_gc(ui, helper, args),
        Command::Git(args) => git::cmd_git(ui, helper, args),
        Command::GitEnc(args) => git::cmd_git_enc(ui, helper, args),
    }
}
