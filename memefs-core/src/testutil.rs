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

//! Test-only helpers for building scratch images. Not part of the public API.
#![cfg(test)]

use std::io::Write;
use zerocopy::IntoBytes;

use crate::bcd::now_bcd;
use crate::layout::*;

/// A 131072-byte image with a freshly formatted (`fs_version == 1`)
/// superblock at both block 255 and block 0, everything else zeroed.
pub fn fresh_image() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    let zeros = vec![0u8; BLOCK_SIZE * NUM_BLOCKS];
    f.write_all(&zeros).unwrap();

    let sb = SuperblockRaw::fresh(now_bcd().0);
    write_at(&f, MAIN_SUPERBLOCK_BLOCK, sb.as_bytes());
    write_at(&f, BACKUP_SUPERBLOCK_BLOCK, sb.as_bytes());
    f
}

fn write_at(f: &tempfile::NamedTempFile, block: usize, bytes: &[u8]) {
    use std::os::unix::fs::FileExt;
    f.as_file()
        .write_all_at(bytes, (block * BLOCK_SIZE) as u64)
        .unwrap();
}
