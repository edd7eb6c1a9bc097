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

//! Deterministic mapping from plaintext paths to encrypted-repo paths.
//!
//! The encrypted name is a pure function of `(plain_path, password)`, so
//! every client with the same password derives identical names and git's
//! content addressing deduplicates across them. The 2/2/rest hex fanout
//! bounds directory size and keeps sparse-checkout cone rules efficient.

use sha2::Digest as _;
use sha2::Sha512;

/// Directory all encrypted file blobs live under.
pub const ENC_ROOT: &str = "d";

/// Derives the encrypted-repo path for `plain_path`.
///
/// The digest input interleaves path and password twice; a plain
/// `path ‖ password` concatenation would make `("ab", "c")` and `("a", "bc")`
/// collide.
pub fn enc_path(plain_path: &str, password: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(plain_path.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(plain_path.as_bytes());
    hasher.update(password.as_bytes());
    let h = hex::encode(hasher.finalize());
    format!("{ENC_ROOT}/{}/{}/{}", &h[..2], &h[2..4], &h[4..])
}

/// The directory prefix of an encrypted path, e.g. `d/ab/cd`. Sparse
/// checkout in cone mode accepts directory prefixes only.
pub fn cone_prefix(enc_path: &str) -> &str {
    enc_path.rsplit_once('/').map_or(enc_path, |(dir, _)| dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_and_determinism() {
        let p = enc_path("foo/.dotfile", "secret");
        assert_eq!(p, enc_path("foo/.dotfile", "secret"));
        let parts: Vec<_> = p.split('/').collect();
        assert_eq!(parts[0], "d");
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 2);
        assert_eq!(parts[3].len(), 128 - 4);
        assert!(p[2..].chars().all(|c| c.is_ascii_hexdigit() || c == '/'));
    }

    #[test]
    fn distinct_inputs_diverge() {
        assert_ne!(enc_path("a", "pw"), enc_path("b", "pw"));
        assert_ne!(enc_path("a", "pw"), enc_path("a", "pw2"));
        // The doubled interleaving separates path/password splits of the
        // same concatenation.
        assert_ne!(enc_path("ab", "c"), enc_path("a", "bc"));
    }

    #[test]
    fn cone_prefix_drops_the_leaf() {
        let p = enc_path("file", "pw");
        let prefix = cone_prefix(&p);
        assert_eq!(prefix.split('/').count(), 3);
        assert!(p.starts_with(&format!("{prefix}/")));
    }
}
