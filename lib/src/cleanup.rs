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

//! LIFO stack of deferred cleanup actions.
//!
//! Long operations (reencrypt, restore, the commit pipeline's remote hiding)
//! register undo actions here as they go. The stack runs on drop, which
//! covers normal returns, `?` early exits and panics. Independent phases push
//! onto the same stack, so later registrations never clobber earlier ones.

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;

/// A stack of deferred closures executed in reverse registration order.
pub struct CleanupStack {
    actions: Vec<(String, Box<dyn FnOnce() + Send>)>,
    armed: bool,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            armed: true,
        }
    }

    /// Registers a cleanup action. `label` names the action in trace output.
    pub fn push(&mut self, label: impl Into<String>, action: impl FnOnce() + Send + 'static) {
        self.actions.push((label.into(), Box::new(action)));
    }

    /// Discards all registered actions without running them. Called on
    /// success paths whose registered actions would undo completed work.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.actions.clear();
    }

    /// Runs all registered actions now, most recent first.
    pub fn run(&mut self) {
        while let Some((label, action)) = self.actions.pop() {
            tracing::debug!(%label, "running cleanup action");
            if catch_unwind(AssertUnwindSafe(action)).is_err() {
                tracing::warn!(%label, "cleanup action panicked");
            }
        }
    }
}

impl Default for CleanupStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        if self.armed {
            self.run();
        }
    }
}
