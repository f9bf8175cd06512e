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

mod adapter;
mod cli;
mod errno;

use clap::Parser;
use log::{error, info};

use adapter::MemefsAdapter;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let state = match memefs_core::State::mount(&cli.image) {
        Ok(s) => s,
        Err(e) => {
            error!("mount failed: {e}");
            std::process::exit(1);
        }
    };
    info!("mounted {} at {}", cli.image.display(), cli.mountpoint.display());

    let mut options = vec![
        fuser::MountOption::FSName("memefs".into()),
        fuser::MountOption::CUSTOM("kernel_cache".into()),
    ];
    if !cli.foreground {
        options.push(fuser::MountOption::AutoUnmount);
    }

    // `mount2` owns the adapter for the session's lifetime and calls
    // `Filesystem::destroy` (which flushes the image back to disk) exactly
    // once when the kernel tears the mount down.
    let adapter = MemefsAdapter::new(state);
    match fuser::mount2(adapter, &cli.mountpoint, &options) {
        Ok(()) => info!("unmounted cleanly"),
        Err(e) => error!("fuse session ended with error: {e}"),
    }
}
