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

//! Fixed region map and on-disk record layouts. All multi-byte integers
//! are big-endian; the `zerocopy` byte-order wrappers make that the type
//! rather than a convention to remember at each read/write site, the way
//! `hyrax_fs_fat`'s `BootSector`/`DirEntry` use `zerocopy::little_endian`
//! wrappers for FAT32's little-endian fields.

use zerocopy::big_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const BLOCK_SIZE: usize = 512;
pub const NUM_BLOCKS: usize = 256;

pub const BACKUP_SUPERBLOCK_BLOCK: usize = 0;
pub const RESERVED_RANGE: std::ops::Range<usize> = 1..19;
pub const USER_RANGE: std::ops::Range<usize> = 19..239;
pub const NUM_USER_BLOCKS: usize = USER_RANGE.end - USER_RANGE.start;
pub const BACKUP_FAT_BLOCK: usize = 239;
pub const DIRECTORY_START_BLOCK: usize = 240;
pub const DIRECTORY_NUM_BLOCKS: usize = 14;
pub const MAIN_FAT_BLOCK: usize = 254;
pub const MAIN_SUPERBLOCK_BLOCK: usize = 255;

pub const DIR_ENTRY_SIZE: usize = 32;
pub const ENTRIES_PER_DIR_BLOCK: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;
pub const NUM_DIR_ENTRIES: usize = DIRECTORY_NUM_BLOCKS * ENTRIES_PER_DIR_BLOCK;

pub const FAT_FREE: u16 = 0x0000;
pub const FAT_EOC: u16 = 0xFFFF;

pub const SIGNATURE: &[u8; 16] = b"MEMEfs\0\0\0\0\0\0\0\0\0\0";

/// On-disk superblock, byte-exact. Stored in duplicate at block 255
/// (main) and block 0 (backup).
#[repr(C)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Clone, Copy, Debug)]
pub struct SuperblockRaw {
    pub signature: [u8; 16],
    pub cleanly_unmounted: u8,
    pub reserved: [u8; 3],
    pub fs_version: U32,
    pub fs_ctime: [u8; 8],
    pub main_fat: U16,
    pub main_fat_size: U16,
    pub backup_fat: U16,
    pub backup_fat_size: U16,
    pub directory_start: U16,
    pub directory_size: U16,
    pub num_user_blocks: U16,
    pub first_user_block: U16,
    pub volume_label: [u8; 16],
    pub unused: [u8; 448],
}

const _: () = assert!(std::mem::size_of::<SuperblockRaw>() == BLOCK_SIZE);

impl SuperblockRaw {
    pub fn fresh(fs_ctime: [u8; 8]) -> Self {
        SuperblockRaw {
            signature: *SIGNATURE,
            cleanly_unmounted: 0x00,
            reserved: [0; 3],
            fs_version: U32::new(1),
            fs_ctime,
            main_fat: U16::new(MAIN_FAT_BLOCK as u16),
            main_fat_size: U16::new(1),
            backup_fat: U16::new(BACKUP_FAT_BLOCK as u16),
            backup_fat_size: U16::new(1),
            directory_start: U16::new(DIRECTORY_START_BLOCK as u16),
            directory_size: U16::new(DIRECTORY_NUM_BLOCKS as u16),
            num_user_blocks: U16::new(NUM_USER_BLOCKS as u16),
            first_user_block: U16::new(1),
            volume_label: [0; 16],
            unused: [0; 448],
        }
    }
}

/// On-disk directory entry, byte-exact. 224 of these fill blocks 240..=253.
#[repr(C)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Clone, Copy, Debug)]
pub struct DirEntryRaw {
    pub file_type: U16,
    pub start_block: U16,
    pub filename: [u8; 11],
    pub unused: u8,
    pub timestamp: [u8; 8],
    pub size: U32,
    pub owner_uid: U16,
    pub group_gid: U16,
}

const _: () = assert!(std::mem::size_of::<DirEntryRaw>() == DIR_ENTRY_SIZE);

impl DirEntryRaw {
    /// The zero-initialized "free slot" record used for a fresh (fs_version
    /// == 1) image: type=0, filename=single space, start_block=0xFFFF,
    /// UID/GID=0xFFFF, timestamp zero, size=0.
    pub fn fresh_free_slot() -> Self {
        let mut filename = [0u8; 11];
        filename[0] = b' ';
        DirEntryRaw {
            file_type: U16::new(0),
            start_block: U16::new(FAT_EOC),
            filename,
            unused: 0,
            timestamp: [0; 8],
            size: U32::new(0),
            owner_uid: U16::new(0xFFFF),
            group_gid: U16::new(0xFFFF),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_map_has_expected_sizes() {
        assert_eq!(USER_RANGE, 19..239);
        assert_eq!(NUM_USER_BLOCKS, 220);
        assert_eq!(NUM_DIR_ENTRIES, 224);
    }

    #[test]
    fn structs_are_byte_exact() {
        assert_eq!(std::mem::size_of::<SuperblockRaw>(), BLOCK_SIZE);
        assert_eq!(std::mem::size_of::<DirEntryRaw>(), DIR_ENTRY_SIZE);
    }
}
