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

use std::process::ExitCode;

use clap::Parser as _;
use myba_lib::settings::Settings;
use tracing_subscriber::EnvFilter;

mod cli_util;
mod command_error;
mod commands;
mod ui;

use crate::cli_util::CommandHelper;
use crate::ui::Ui;

fn main() -> ExitCode {
    let settings = Settings::from_env();
    init_tracing(&settings);

    let cli = match commands::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Usage problems exit 1; --help and --version are successes.
            return ExitCode::from(u8::from(err.use_stderr()));
        }
    };

    let mut ui = Ui::new();
    let mut helper = CommandHelper::new(settings);
    match commands::run_command(&mut ui, &mut helper, &cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(message) = err.message() {
                eprintln!("Error: {message}");
                for cause in err.causes() {
                    eprintln!("Caused by: {cause}");
                }
            }
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_tracing(settings: &Settings) {
    let filter = if settings.verbose {
        EnvFilter::new("myba_cli=debug,myba_lib=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
