// Copyright 2026 The MEMEfs Contributors
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

//! Error kinds surfaced by the core crate. The VFS adapter (in the `memefs`
//! binary crate) maps each of these onto a POSIX errno; this crate stays
//! errno-agnostic.

/// Errors produced by the on-disk format, allocator, directory table and
/// file I/O engine.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("path not found")]
    NotFound,
    #[error("file already exists")]
    Duplicate,
    #[error("name or extension too long")]
    NameTooLong,
    #[error("name contains a disallowed character")]
    BadName,
    #[error("no space left (directory full or FAT exhausted)")]
    NoSpace,
    #[error("image I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("mount failed: {0}")]
    Mount(String),
}

pub type Result<T> = std::result::Result<T, Error>;
