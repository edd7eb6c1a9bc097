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

//! Error type carried out of command handlers, mapped to exit codes:
//! 1 for usage problems, 2 for failed operations.

use std::error::Error;
use std::io;

use myba_lib::checkout::CheckoutError;
use myba_lib::cipher::CipherError;
use myba_lib::commit::CommitError;
use myba_lib::git::GitError;
use myba_lib::manifest::ManifestError;
use myba_lib::pool::PoolError;
use myba_lib::remote::RemoteError;
use myba_lib::replay::ReplayError;

const EXIT_USAGE: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[derive(Debug)]
pub struct CommandError {
    code: u8,
    repr: Repr,
}

#[derive(Debug)]
enum Repr {
    /// The failing child already printed its own diagnostics.
    Silent,
    Message(String),
    Source(Box<dyn Error + Send + Sync>),
}

impl CommandError {
    /// A usage-level problem the user can correct.
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            repr: Repr::Message(message.into()),
        }
    }

    /// Propagates a child process's exit code without extra output.
    pub fn exit(code: i32) -> Self {
        Self {
            code: u8::try_from(code).unwrap_or(EXIT_FAILURE).max(1),
            repr: Repr::Silent,
        }
    }

    /// A failed operation, reported with its cause chain.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_FAILURE,
            repr: Repr::Message(message.into()),
        }
    }

    fn internal(err: impl Error + Send + Sync + 'static) -> Self {
        Self {
            code: EXIT_FAILURE,
            repr: Repr::Source(Box::new(err)),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.code
    }

    pub fn message(&self) -> Option<String> {
        match &self.repr {
            Repr::Silent => None,
            Repr::Message(message) => Some(message.clone()),
            Repr::Source(err) => Some(err.to_string()),
        }
    }

    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        if let Repr::Source(err) = &self.repr {
            let mut source = err.source();
            while let Some(cause) = source {
                causes.push(cause.to_string());
                source = cause.source();
            }
        }
        causes
    }
}

macro_rules! internal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CommandError {
                fn from(err: $ty) -> Self {
                    Self::internal(err)
                }
            }
        )*
    };
}

internal_from!(
    GitError,
    CipherError,
    CommitError,
    CheckoutError,
    ManifestError,
    PoolError,
    RemoteError,
    ReplayError,
    io::Error,
);
