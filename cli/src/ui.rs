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

//! Terminal interaction: password entry and overwrite prompts.

use std::fs::OpenOptions;
use std::io;
use std::io::BufRead as _;
use std::io::BufReader;
use std::io::Write as _;

use myba_lib::settings::Password;

pub struct Ui {}

impl Ui {
    pub fn new() -> Self {
        Self {}
    }

    /// Reads the password without echo. `confirm` re-prompts and compares,
    /// for first-use flows where a typo would encrypt the backup under a
    /// password the user does not know.
    pub fn prompt_password(&self, confirm: bool) -> io::Result<Password> {
        let password = rpassword::prompt_password("Password: ")?;
        if password.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "the password must not be empty",
            ));
        }
        if confirm {
            let again = rpassword::prompt_password("Repeat password: ")?;
            if password != again {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "the passwords do not match",
                ));
            }
        }
        Ok(Password::new(password))
    }

    /// Asks whether `path` may be overwritten. The prompt goes to the
    /// controlling terminal directly, so it works inside pipelines that own
    /// stdin; with no terminal available the answer is no.
    pub fn prompt_overwrite(&self, path: &str) -> bool {
        self.prompt_overwrite_tty(path).unwrap_or(false)
    }

    #[cfg(unix)]
    fn prompt_overwrite_tty(&self, path: &str) -> io::Result<bool> {
        let mut tty = OpenOptions::new().read(true).write(true).open("/dev/tty")?;
        write!(tty, "Overwrite {path}? [y/N] ")?;
        tty.flush()?;
        let mut answer = String::new();
        BufReader::new(&tty).read_line(&mut answer)?;
        let answer = answer.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }

    #[cfg(not(unix))]
    fn prompt_overwrite_tty(&self, _path: &str) -> io::Result<bool> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no controlling terminal",
        ))
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}
