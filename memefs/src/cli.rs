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

//! Command-line configuration: mountpoint, image path, and the usual
//! `-f`/`-v` pair, via `clap`'s derive API.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "memefs", about = "Mount a MEMEfs image as a FUSE filesystem")]
pub struct Cli {
    /// Directory to mount the filesystem at.
    pub mountpoint: PathBuf,

    /// Path to the MEMEfs image file.
    #[arg(long, default_value = "./myfilesystem.img")]
    pub image: PathBuf,

    /// Stay in the foreground instead of forking to the background.
    #[arg(short, long)]
    pub foreground: bool,

    /// Increase log verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
