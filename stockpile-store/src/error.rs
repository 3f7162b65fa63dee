// Copyright 2026 stockpile Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Stock store error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O failure on the underlying journal file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Record codec failure.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    /// The journal file header does not belong to this engine or version.
    #[error("magic mismatch, magic: {magic:x}, expected: {expected:x}")]
    MagicMismatch {
        /// Magic found in the journal header.
        magic: u64,
        /// Magic this engine writes.
        expected: u64,
    },
}

/// Stock store result.
pub type Result<T> = core::result::Result<T, Error>;
