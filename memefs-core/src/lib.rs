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

//! Core MEMEfs implementation: on-disk binary format, FAT allocator,
//! directory table and file I/O engine. No FUSE, no libc, no CLI lives
//! here; the `memefs` binary crate holds the VFS adapter that wires
//! these onto kernel callbacks.

pub mod bcd;
pub mod directory;
pub mod error;
pub mod fat;
pub mod fileio;
pub mod filename;
pub mod image;
pub mod layout;

#[cfg(test)]
mod testutil;

pub use directory::DirEntry;
pub use error::{Error, Result};
pub use image::State;
