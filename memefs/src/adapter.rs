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

//! VFS adapter: routes FUSE callbacks onto the directory table and file
//! I/O engine, and translates core errors to errno at this one seam.
//!
//! Inode scheme: `1` is the (single, non-nested) root directory; every
//! other inode is `slot + 2` where `slot` is the directory-table index,
//! so lookups by inode never need a secondary table. There are no
//! subdirectories, so this mapping is complete.

use std::ffi::OsStr;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use log::{debug, warn};
use memefs_core::{directory, fileio, State};

use crate::errno::to_errno;

const ROOT_INO: u64 = 1;
const TTL: Duration = Duration::from_secs(1);

pub struct MemefsAdapter {
    state: Option<State>,
}

impl MemefsAdapter {
    pub fn new(state: State) -> Self {
        MemefsAdapter { state: Some(state) }
    }

    /// Serializes everything back to the image and closes it. `fuser` owns
    /// the filesystem value for the session's lifetime and calls
    /// `destroy()` exactly once when the kernel tears the mount down
    /// (unmount, or the daemon being killed cleanly), so that is where
    /// unmount serialization happens; `Filesystem::destroy` has no error
    /// channel, so failures are logged rather than propagated.
    fn flush_to_disk(&mut self) {
        if let Some(state) = self.state.take() {
            if let Err(e) = state.unmount() {
                log::error!("unmount failed: {e}");
            }
        }
    }

    /// Test-only equivalent of `flush_to_disk` that surfaces the error.
    #[cfg(test)]
    pub fn unmount(mut self) -> memefs_core::Result<()> {
        self.state.take().expect("state missing at unmount").unmount()
    }

    fn state(&self) -> &State {
        self.state.as_ref().expect("state missing")
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.as_mut().expect("state missing")
    }

    fn slot_to_ino(slot: usize) -> u64 {
        slot as u64 + 2
    }

    fn ino_to_slot(ino: u64) -> Option<usize> {
        ino.checked_sub(2).map(|s| s as usize)
    }

    fn root_attr(&self) -> FileAttr {
        let now = SystemTime::now();
        FileAttr {
            ino: ROOT_INO,
            size: 0,
            blocks: 0,
            atime: now,
            mtime: now,
            ctime: now,
            crtime: now,
            kind: FileType::Directory,
            perm: 0o755,
            nlink: 2,
            uid: 0,
            gid: 0,
            rdev: 0,
            blksize: 512,
            flags: 0,
        }
    }

    fn entry_attr(&self, slot: usize) -> Option<FileAttr> {
        let entry = self.state().directory.get(slot)?;
        if entry.is_free() {
            return None;
        }
        let mtime = entry.timestamp.to_system_time();
        Some(FileAttr {
            ino: Self::slot_to_ino(slot),
            size: entry.size as u64,
            blocks: (entry.size as u64).div_ceil(512),
            atime: mtime,
            mtime,
            ctime: mtime,
            crtime: mtime,
            kind: FileType::RegularFile,
            perm: entry.file_type & 0o777,
            nlink: 1,
            uid: entry.owner_uid as u32,
            gid: entry.group_gid as u32,
            rdev: 0,
            blksize: 512,
            flags: 0,
        })
    }

    fn path_for(name: &OsStr) -> Option<String> {
        let name = name.to_str()?;
        Some(format!("/{name}"))
    }
}

impl Filesystem for MemefsAdapter {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), libc::c_int> {
        debug!("init");
        Ok(())
    }

    fn destroy(&mut self) {
        debug!("destroy: flushing image to disk");
        self.flush_to_disk();
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        if parent != ROOT_INO {
            reply.error(libc::ENOENT);
            return;
        }
        let Some(path) = Self::path_for(name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match directory::lookup(self.state(), &path) {
            Some(slot) => match self.entry_attr(slot) {
                Some(attr) => reply.entry(&TTL, &attr, 0),
                None => reply.error(libc::ENOENT),
            },
            None => reply.error(libc::ENOENT),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        if ino == ROOT_INO {
            reply.attr(&TTL, &self.root_attr());
            return;
        }
        match Self::ino_to_slot(ino).and_then(|s| self.entry_attr(s)) {
            Some(attr) => reply.attr(&TTL, &attr),
            None => reply.error(libc::ENOENT),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        if ino != ROOT_INO {
            reply.error(libc::ENOENT);
            return;
        }

        let mut entries: Vec<(u64, FileType, String)> =
            vec![(ROOT_INO, FileType::Directory, ".".into()), (ROOT_INO, FileType::Directory, "..".into())];
        for (slot, entry) in self.state().directory.iter().enumerate() {
            if let Some(name) = entry.decoded_name() {
                entries.push((Self::slot_to_ino(slot), FileType::RegularFile, name));
            }
        }

        for (i, (ino, kind, name)) in entries.into_iter().enumerate().skip(offset as usize) {
            if reply.add(ino, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn create(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        flags: i32,
        reply: ReplyCreate,
    ) {
        if parent != ROOT_INO {
            reply.error(libc::ENOENT);
            return;
        }
        let Some(path) = Self::path_for(name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match directory::create(self.state_mut(), &path, mode, req.uid(), req.gid()) {
            Ok(slot) => {
                let attr = self.entry_attr(slot).expect("just created");
                reply.created(&TTL, &attr, 0, Self::slot_to_ino(slot), flags as u32);
            }
            Err(e) => {
                warn!("create {path}: {e}");
                reply.error(to_errno(&e));
            }
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        if parent != ROOT_INO {
            reply.error(libc::ENOENT);
            return;
        }
        let Some(path) = Self::path_for(name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match directory::unlink(self.state_mut(), &path) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(to_errno(&e)),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        match Self::ino_to_slot(ino) {
            Some(slot) if self.entry_attr(slot).is_some() => {
                reply.opened(Self::slot_to_ino(slot), flags as u32)
            }
            _ => reply.error(libc::ENOENT),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(slot) = Self::ino_to_slot(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let mut buf = vec![0u8; size as usize];
        match fileio::read(self.state(), slot, &mut buf, offset as u64) {
            Ok(n) => reply.data(&buf[..n]),
            Err(e) => reply.error(to_errno(&e)),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(slot) = Self::ino_to_slot(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match fileio::write(self.state_mut(), slot, data, offset as u64) {
            Ok(n) => reply.written(n as u32),
            Err(e) => reply.error(to_errno(&e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let Some(slot) = Self::ino_to_slot(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        if let Some(new_size) = size {
            if let Err(e) = fileio::truncate(self.state_mut(), slot, new_size) {
                reply.error(to_errno(&e));
                return;
            }
        } else if atime.is_some() || mtime.is_some() {
            if let Err(e) = fileio::utimens(self.state_mut(), slot) {
                reply.error(to_errno(&e));
                return;
            }
        }
        match self.entry_attr(slot) {
            Some(attr) => reply.attr(&TTL, &attr),
            None => reply.error(libc::ENOENT),
        }
    }

    fn fallocate(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        length: i64,
        _mode: i32,
        reply: ReplyEmpty,
    ) {
        let Some(slot) = Self::ino_to_slot(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match fileio::truncate(self.state_mut(), slot, (offset + length) as u64) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(to_errno(&e)),
        }
    }
}
