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

//! Directory table: the 224-entry flat namespace. Lookup, insertion and
//! deletion all operate on `State::directory`; chain (de)allocation is
//! delegated to the FAT allocator.

use crate::bcd::{now_bcd, BcdTimestamp};
use crate::error::{Error, Result};
use crate::fat;
use crate::filename;
use crate::image::State;
use crate::layout::{DirEntryRaw, NUM_DIR_ENTRIES};

const S_IFREG: u16 = 0o100000;

/// In-memory mirror of a 32-byte on-disk directory entry.
#[derive(Clone, Debug)]
pub struct DirEntry {
    pub file_type: u16,
    pub start_block: u16,
    pub filename: [u8; 11],
    pub timestamp: BcdTimestamp,
    pub size: u32,
    pub owner_uid: u16,
    pub group_gid: u16,
}

impl DirEntry {
    pub fn from_raw(raw: &DirEntryRaw) -> Self {
        DirEntry {
            file_type: raw.file_type.get(),
            start_block: raw.start_block.get(),
            filename: raw.filename,
            timestamp: BcdTimestamp::from_bytes(raw.timestamp),
            size: raw.size.get(),
            owner_uid: raw.owner_uid.get(),
            group_gid: raw.group_gid.get(),
        }
    }

    pub fn to_raw(&self) -> DirEntryRaw {
        use zerocopy::big_endian::{U16, U32};
        DirEntryRaw {
            file_type: U16::new(self.file_type),
            start_block: U16::new(self.start_block),
            filename: self.filename,
            unused: 0,
            timestamp: self.timestamp.0,
            size: U32::new(self.size),
            owner_uid: U16::new(self.owner_uid),
            group_gid: U16::new(self.group_gid),
        }
    }

    pub fn is_free(&self) -> bool {
        self.file_type == 0
    }

    /// `None` for a free or tombstoned (filename == " ") slot.
    pub fn decoded_name(&self) -> Option<String> {
        if self.is_free() || self.filename == [0u8; 11] || self.filename == tombstone() {
            return None;
        }
        Some(filename::decode(&self.filename))
    }
}

fn tombstone() -> [u8; 11] {
    let mut t = [0u8; 11];
    t[0] = b' ';
    t
}

/// Scans for the first non-free, non-tombstoned entry whose decoded name
/// matches.
pub fn lookup(state: &State, path: &str) -> Option<usize> {
    let target = filename::encode(path).ok()?;
    state
        .directory
        .iter()
        .position(|e| !e.is_free() && e.filename == target)
}

/// Validates the name, rejects duplicates, allocates a slot by scanning
/// *backward* from 223 (part of the observable contract: newest files
/// land in the highest free slot), allocates one starting block via the
/// FAT allocator, and rolls back any partial allocation on failure.
pub fn create(state: &mut State, path: &str, mode: u32, uid: u32, gid: u32) -> Result<usize> {
    let packed = filename::encode(path)?;
    filename::validate_chars(&packed)?;

    if lookup(state, path).is_some() {
        return Err(Error::Duplicate);
    }

    let slot = (0..NUM_DIR_ENTRIES)
        .rev()
        .find(|&i| state.directory[i].is_free())
        .ok_or(Error::NoSpace)?;

    let first_block = fat::alloc_chain(state, 1).ok_or(Error::NoSpace)?;

    state.directory[slot] = DirEntry {
        file_type: S_IFREG | (mode as u16 & 0o777),
        start_block: first_block as u16,
        filename: packed,
        timestamp: now_bcd(),
        size: 0,
        owner_uid: uid as u16,
        group_gid: gid as u16,
    };

    Ok(slot)
}

/// Tombstones the entry and frees its chain.
pub fn unlink(state: &mut State, path: &str) -> Result<()> {
    let slot = lookup(state, path).ok_or(Error::NotFound)?;
    let first_block = state.directory[slot].start_block;

    state.directory[slot].file_type = 0;
    state.directory[slot].filename = tombstone();
    fat::free_chain(state, first_block);

    Ok(())
}

/// Decoded names of every live (non-free, non-tombstone) entry, in
/// directory order.
pub fn list(state: &State) -> Vec<String> {
    state.directory.iter().filter_map(DirEntry::decoded_name).collect()
}
