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

//! FAT allocator: chain allocation/extension/free over the paired
//! main/backup File Allocation Tables. Every mutation touches both copies
//! in the same call so they never observably diverge.

use crate::error::{Error, Result};
use crate::image::State;
use crate::layout::{FAT_EOC, FAT_FREE, USER_RANGE};

fn set_slot(state: &mut State, block: usize, value: u16) {
    state.main_fat[block] = value;
    state.backup_fat[block] = value;
}

fn free_slots(state: &State) -> impl Iterator<Item = usize> + '_ {
    USER_RANGE.filter(move |&b| state.main_fat[b] == FAT_FREE)
}

/// Picks `n` free blocks in ascending order, links them `slot_i ->
/// slot_{i+1}`, terminates the last with `0xFFFF`. `None` if fewer than
/// `n` are free.
pub fn alloc_chain(state: &mut State, n_blocks: usize) -> Option<usize> {
    if n_blocks == 0 {
        return None;
    }
    let chosen: Vec<usize> = free_slots(state).take(n_blocks).collect();
    if chosen.len() < n_blocks {
        return None;
    }

    for window in chosen.windows(2) {
        set_slot(state, window[0], window[1] as u16);
    }
    set_slot(state, *chosen.last().unwrap(), FAT_EOC);

    Some(chosen[0])
}

/// Appends `extra` free blocks after the chain's current last slot.
pub fn extend_chain(state: &mut State, last: usize, extra: usize) -> Result<()> {
    if extra == 0 {
        return Ok(());
    }
    let chosen: Vec<usize> = free_slots(state).take(extra).collect();
    if chosen.len() < extra {
        return Err(Error::NoSpace);
    }

    set_slot(state, last, chosen[0] as u16);
    for window in chosen.windows(2) {
        set_slot(state, window[0], window[1] as u16);
    }
    set_slot(state, *chosen.last().unwrap(), FAT_EOC);

    Ok(())
}

/// Walks the chain from `first`, zeroing each visited slot in both FATs,
/// stopping after clearing the slot that was `0xFFFF` before being
/// cleared.
pub fn free_chain(state: &mut State, first: u16) {
    let mut current = first;
    loop {
        if current as usize >= state.main_fat.len() {
            break;
        }
        let next = state.main_fat[current as usize];
        set_slot(state, current as usize, FAT_FREE);
        if next == FAT_EOC {
            break;
        }
        current = next;
    }
}

/// Lazily yields block indices in chain order until the `0xFFFF`
/// terminator.
pub fn chain_iter(state: &State, first: u16) -> ChainIter<'_> {
    ChainIter { state, next: first }
}

pub struct ChainIter<'s> {
    state: &'s State,
    next: u16,
}

impl<'s> Iterator for ChainIter<'s> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next == FAT_EOC {
            return None;
        }
        let block = self.next as usize;
        self.next = self.state.main_fat[block];
        Some(block)
    }
}
