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

//! Maps core `memefs_core::Error` variants onto POSIX errno. This is the
//! only place errno numbers appear; the core crate stays POSIX-agnostic
//! and leaves translation to the caller.

use memefs_core::Error;

pub fn to_errno(err: &Error) -> i32 {
    match err {
        Error::NotFound => libc::ENOENT,
        Error::Duplicate => libc::EEXIST,
        Error::NameTooLong => libc::ENAMETOOLONG,
        Error::BadName => libc::EBADF,
        Error::NoSpace => libc::ENOSPC,
        Error::Io(_) => libc::EIO,
        Error::Mount(_) => libc::EIO,
    }
}
