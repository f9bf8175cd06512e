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

//! Image codec: mount/unmount, i.e. load/store of the superblocks, both
//! FATs, the directory table and the user-data area, to and from the
//! backing image file. Block-addressed I/O goes through `std::fs::File`'s
//! positional read/write, the way `hyrax_ds_std::DataStorageServer` wraps
//! `read_exact_at`/`write_all_at` over a `File` rather than seek+read.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use log::{debug, warn};
use zerocopy::{FromBytes, IntoBytes};

use crate::bcd::{now_bcd, BcdTimestamp};
use crate::directory::DirEntry;
use crate::error::{Error, Result};
use crate::layout::*;

/// All mutable filesystem state for one mounted image: the dual
/// superblocks, the dual FATs, the directory table, and the user data area.
/// Owned solely by the adapter for the mount's lifetime.
pub struct State {
    file: File,
    pub main_superblock: SuperblockRaw,
    pub backup_superblock: SuperblockRaw,
    pub main_fat: [u16; NUM_BLOCKS],
    pub backup_fat: [u16; NUM_BLOCKS],
    pub directory: Vec<DirEntry>,
    pub user_data: Vec<u8>,
}

fn read_block(file: &File, block: usize, buf: &mut [u8]) -> Result<()> {
    file.read_exact_at(buf, (block * BLOCK_SIZE) as u64)?;
    Ok(())
}

fn write_block(file: &File, block: usize, buf: &[u8]) -> Result<()> {
    file.write_all_at(buf, (block * BLOCK_SIZE) as u64)?;
    Ok(())
}

fn read_fat(file: &File, block: usize) -> Result<[u16; NUM_BLOCKS]> {
    let mut raw = [0u8; BLOCK_SIZE];
    read_block(file, block, &mut raw)?;
    let mut fat = [0u16; NUM_BLOCKS];
    for (i, slot) in fat.iter_mut().enumerate() {
        *slot = u16::from_be_bytes([raw[i * 2], raw[i * 2 + 1]]);
    }
    Ok(fat)
}

fn write_fat(file: &File, block: usize, fat: &[u16; NUM_BLOCKS]) -> Result<()> {
    let mut raw = [0u8; BLOCK_SIZE];
    for (i, slot) in fat.iter().enumerate() {
        raw[i * 2..i * 2 + 2].copy_from_slice(&slot.to_be_bytes());
    }
    write_block(file, block, &raw)
}

impl State {
    /// Opens the image read/write and deserializes every region. A fresh
    /// image (`fs_version == 1`) gets a zero-initialized in-memory
    /// directory and user area instead of being read from disk.
    pub fn mount(image_path: &Path) -> Result<State> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(image_path)
            .map_err(|e| Error::Mount(format!("opening {}: {e}", image_path.display())))?;

        let mut sb_raw = [0u8; BLOCK_SIZE];
        read_block(&file, MAIN_SUPERBLOCK_BLOCK, &mut sb_raw)?;
        let mut main_superblock = SuperblockRaw::read_from_bytes(&sb_raw[..])
            .map_err(|_| Error::Mount("superblock layout mismatch".into()))?;
        // Dirty the volume for the live session regardless of what was on disk.
        main_superblock.cleanly_unmounted = 0x00;

        let mut backup_raw = [0u8; BLOCK_SIZE];
        read_block(&file, BACKUP_SUPERBLOCK_BLOCK, &mut backup_raw)?;
        let mut backup_superblock = SuperblockRaw::read_from_bytes(&backup_raw[..])
            .map_err(|_| Error::Mount("backup superblock layout mismatch".into()))?;
        backup_superblock.cleanly_unmounted = 0x00;

        let main_fat = read_fat(&file, MAIN_FAT_BLOCK)?;
        let backup_fat = read_fat(&file, BACKUP_FAT_BLOCK)?;

        let fresh = main_superblock.fs_version.get() == 1;
        let (directory, user_data) = if fresh {
            debug!("fresh image (fs_version == 1), zero-initializing directory and user area");
            let directory = (0..NUM_DIR_ENTRIES)
                .map(|_| DirEntry::from_raw(&DirEntryRaw::fresh_free_slot()))
                .collect();
            let user_data = vec![0u8; NUM_USER_BLOCKS * BLOCK_SIZE];
            (directory, user_data)
        } else {
            let mut dir_raw = vec![0u8; DIRECTORY_NUM_BLOCKS * BLOCK_SIZE];
            for (i, chunk) in dir_raw.chunks_mut(BLOCK_SIZE).enumerate() {
                read_block(&file, DIRECTORY_START_BLOCK + i, chunk)?;
            }
            let mut directory = Vec::with_capacity(NUM_DIR_ENTRIES);
            for i in 0..NUM_DIR_ENTRIES {
                let bytes = &dir_raw[i * DIR_ENTRY_SIZE..(i + 1) * DIR_ENTRY_SIZE];
                let raw = DirEntryRaw::read_from_bytes(bytes)
                    .map_err(|_| Error::Mount("directory entry layout mismatch".into()))?;
                directory.push(DirEntry::from_raw(&raw));
            }

            let mut user_data = vec![0u8; NUM_USER_BLOCKS * BLOCK_SIZE];
            for (i, chunk) in user_data.chunks_mut(BLOCK_SIZE).enumerate() {
                read_block(&file, USER_RANGE.start + i, chunk)?;
            }
            (directory, user_data)
        };

        if main_fat != backup_fat {
            warn!("main and backup FAT disagree at mount; trusting main FAT");
        }

        Ok(State {
            file,
            main_superblock,
            backup_superblock,
            main_fat,
            backup_fat,
            directory,
            user_data,
        })
    }

    /// Serializes every region back to the image file and closes it.
    /// `fs_version` is incremented on the main superblock.
    /// `cleanly_unmounted` is deliberately written as 0x00 ("not cleanly
    /// unmounted") to both copies despite the field's name; see DESIGN.md
    /// for why that polarity is kept rather than reinterpreted.
    pub fn unmount(mut self) -> Result<()> {
        self.main_superblock.cleanly_unmounted = 0x00;
        self.backup_superblock.cleanly_unmounted = 0x00;
        self.main_superblock.fs_version =
            zerocopy::big_endian::U32::new(self.main_superblock.fs_version.get() + 1);

        // Backup superblock written first so a torn write leaves it as a
        // valid prior version if the main write is interrupted.
        write_block(&self.file, BACKUP_SUPERBLOCK_BLOCK, self.backup_superblock.as_bytes())?;
        write_block(&self.file, MAIN_SUPERBLOCK_BLOCK, self.main_superblock.as_bytes())?;

        write_fat(&self.file, MAIN_FAT_BLOCK, &self.main_fat)?;
        write_fat(&self.file, BACKUP_FAT_BLOCK, &self.backup_fat)?;

        for (i, entry) in self.directory.iter().enumerate() {
            let raw = entry.to_raw();
            write_block_offset(
                &self.file,
                DIRECTORY_START_BLOCK * BLOCK_SIZE + i * DIR_ENTRY_SIZE,
                raw.as_bytes(),
            )?;
        }

        for (i, chunk) in self.user_data.chunks(BLOCK_SIZE).enumerate() {
            write_block(&self.file, USER_RANGE.start + i, chunk)?;
        }

        self.file.sync_all()?;
        Ok(())
    }

    pub fn touch_entry(&mut self, slot: usize) {
        self.directory[slot].timestamp = now_bcd();
    }

    pub fn ctime(&self) -> BcdTimestamp {
        BcdTimestamp::from_bytes(self.main_superblock.fs_ctime)
    }
}

fn write_block_offset(file: &File, offset: usize, buf: &[u8]) -> Result<()> {
    file.write_all_at(buf, offset as u64)?;
    Ok(())
}
