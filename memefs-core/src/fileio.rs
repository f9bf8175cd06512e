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

//! File I/O engine: maps byte-range read/write onto the FAT block chains,
//! and extends/trims chains as a file grows or shrinks.

use crate::bcd::now_bcd;
use crate::error::{Error, Result};
use crate::fat;
use crate::image::State;
use crate::layout::{BLOCK_SIZE, FAT_EOC, USER_RANGE};

fn user_offset(block: usize, within_block: usize) -> usize {
    (block - USER_RANGE.start) * BLOCK_SIZE + within_block
}

fn chain_blocks(state: &State, first: u16) -> Vec<usize> {
    fat::chain_iter(state, first).collect()
}

/// `read(slot, buf, offset) -> bytes_read`. Zero at or past EOF.
pub fn read(state: &State, slot: usize, buf: &mut [u8], offset: u64) -> Result<usize> {
    let entry = state.directory.get(slot).ok_or(Error::NotFound)?;
    let size = entry.size as u64;
    if offset >= size {
        return Ok(0);
    }

    let to_read = (size - offset).min(buf.len() as u64) as usize;
    let blocks = chain_blocks(state, entry.start_block);

    let mut written = 0usize;
    let mut pos = offset as usize;
    while written < to_read {
        let block_idx = pos / BLOCK_SIZE;
        let within = pos % BLOCK_SIZE;
        let Some(&block) = blocks.get(block_idx) else {
            break;
        };
        let chunk = (BLOCK_SIZE - within).min(to_read - written);
        let src_off = user_offset(block, within);
        buf[written..written + chunk].copy_from_slice(&state.user_data[src_off..src_off + chunk]);
        written += chunk;
        pos += chunk;
    }

    Ok(written)
}

/// `write(slot, data, offset) -> bytes_written`. Extends the chain
/// first if the post-write size needs more blocks than are currently
/// allocated; on `NoSpace` no partial write is applied. Gaps created by a
/// write past the current end are zero-filled (the user area starts zeroed
/// and stays that way outside of explicit writes).
pub fn write(state: &mut State, slot: usize, data: &[u8], offset: u64) -> Result<usize> {
    if state.directory.get(slot).is_none() {
        return Err(Error::NotFound);
    }

    let current_size = state.directory[slot].size as u64;
    let new_size = current_size.max(offset + data.len() as u64);
    let required_blocks = new_size.div_ceil(BLOCK_SIZE as u64) as usize;

    let first = state.directory[slot].start_block;
    let mut blocks = chain_blocks(state, first);
    if required_blocks > blocks.len() {
        let last = *blocks.last().unwrap_or(&(first as usize));
        fat::extend_chain(state, last, required_blocks - blocks.len())?;
        blocks = chain_blocks(state, first);
    }

    let mut written = 0usize;
    let mut pos = offset as usize;
    while written < data.len() {
        let block_idx = pos / BLOCK_SIZE;
        let within = pos % BLOCK_SIZE;
        let block = blocks[block_idx];
        let chunk = (BLOCK_SIZE - within).min(data.len() - written);
        let dst_off = user_offset(block, within);
        state.user_data[dst_off..dst_off + chunk]
            .copy_from_slice(&data[written..written + chunk]);
        written += chunk;
        pos += chunk;
    }

    state.directory[slot].size = new_size as u32;
    state.directory[slot].timestamp = now_bcd();
    Ok(written)
}

/// `truncate(slot, new_size)`. Shrinking frees the tail chain beyond
/// `ceil(new_size/512)` blocks and zeroes the residue of the last kept
/// block; growing behaves as a write of zeros out to `new_size`.
pub fn truncate(state: &mut State, slot: usize, new_size: u64) -> Result<()> {
    let entry = state.directory.get(slot).ok_or(Error::NotFound)?;
    let current_size = entry.size as u64;

    if new_size >= current_size {
        let gap = new_size - current_size;
        if gap > 0 {
            let zeros = vec![0u8; gap as usize];
            write(state, slot, &zeros, current_size)?;
        }
        state.directory[slot].size = new_size as u32;
        state.directory[slot].timestamp = now_bcd();
        return Ok(());
    }

    let first = state.directory[slot].start_block;
    let blocks = chain_blocks(state, first);
    let keep = (new_size.div_ceil(BLOCK_SIZE as u64) as usize).max(1);

    if keep < blocks.len() {
        let cut_after = blocks[keep - 1];
        let first_freed = state.main_fat[cut_after];
        state.main_fat[cut_after] = FAT_EOC;
        state.backup_fat[cut_after] = FAT_EOC;
        if first_freed != FAT_EOC {
            fat::free_chain(state, first_freed);
        }
    }

    if let Some(&last_kept) = blocks.get(keep - 1) {
        let residue_start = (new_size % BLOCK_SIZE as u64) as usize;
        if residue_start > 0 || new_size == 0 {
            let from = if new_size == 0 { 0 } else { residue_start };
            let off = user_offset(last_kept, from);
            state.user_data[off..off + (BLOCK_SIZE - from)].fill(0);
        }
    }

    state.directory[slot].size = new_size as u32;
    state.directory[slot].timestamp = now_bcd();
    Ok(())
}

/// Refreshes the entry's timestamp to now.
pub fn utimens(state: &mut State, slot: usize) -> Result<()> {
    if state.directory.get(slot).is_none() {
        return Err(Error::NotFound);
    }
    state.directory[slot].timestamp = now_bcd();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory;
    use crate::image::State;
    use crate::testutil::fresh_image;

    #[test]
    fn write_then_read_round_trip() {
        let img = fresh_image();
        let mut state = State::mount(img.path()).unwrap();
        let slot = directory::create(&mut state, "/HELLO.TXT", 0o644, 0, 0).unwrap();

        let n = write(&mut state, slot, b"hello\n", 0).unwrap();
        assert_eq!(n, 6);
        assert_eq!(state.directory[slot].size, 6);

        let mut buf = [0u8; 6];
        let r = read(&state, slot, &mut buf, 0).unwrap();
        assert_eq!(r, 6);
        assert_eq!(&buf, b"hello\n");
    }

    #[test]
    fn boundary_write_spans_two_blocks() {
        let img = fresh_image();
        let mut state = State::mount(img.path()).unwrap();
        let slot = directory::create(&mut state, "/BIG", 0o644, 0, 0).unwrap();

        let data = vec![b'A'; 1000];
        let n = write(&mut state, slot, &data, 0).unwrap();
        assert_eq!(n, 1000);
        assert_eq!(state.directory[slot].size, 1000);

        let chain = chain_blocks(&state, state.directory[slot].start_block);
        assert_eq!(chain.len(), 2);

        let mut buf = vec![0u8; 1000];
        let r = read(&state, slot, &mut buf, 0).unwrap();
        assert_eq!(r, 1000);
        assert_eq!(buf, data);
    }

    #[test]
    fn write_with_gap_zero_fills() {
        let img = fresh_image();
        let mut state = State::mount(img.path()).unwrap();
        let slot = directory::create(&mut state, "/GAP", 0o644, 0, 0).unwrap();

        write(&mut state, slot, b"end", 100).unwrap();
        let mut buf = [0u8; 103];
        read(&state, slot, &mut buf, 0).unwrap();
        assert!(buf[..100].iter().all(|&b| b == 0));
        assert_eq!(&buf[100..], b"end");
    }

    #[test]
    fn truncate_shrink_frees_tail_and_zeroes_residue() {
        let img = fresh_image();
        let mut state = State::mount(img.path()).unwrap();
        let slot = directory::create(&mut state, "/BIG", 0o644, 0, 0).unwrap();
        write(&mut state, slot, &vec![b'A'; 1000], 0).unwrap();

        truncate(&mut state, slot, 10).unwrap();
        assert_eq!(state.directory[slot].size, 10);

        let mut buf = [0u8; 512];
        read(&state, slot, &mut buf, 0).unwrap();
        assert_eq!(&buf[..10], &[b'A'; 10]);
        assert!(buf[10..].iter().all(|&b| b == 0));

        let chain = chain_blocks(&state, state.directory[slot].start_block);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn truncate_grow_zero_fills_like_write() {
        let img = fresh_image();
        let mut state = State::mount(img.path()).unwrap();
        let slot = directory::create(&mut state, "/F", 0o644, 0, 0).unwrap();
        truncate(&mut state, slot, 5).unwrap();
        assert_eq!(state.directory[slot].size, 5);
        let mut buf = [0u8; 5];
        read(&state, slot, &mut buf, 0).unwrap();
        assert_eq!(buf, [0u8; 5]);
    }
}
