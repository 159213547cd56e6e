// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File watcher command: recompile on change without a server.

use brisk::RecompileScheduler;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;

use super::{initial_compile, project_compiler, spawn_watch_loop};
use crate::config::Config;
use crate::watcher::FileWatcher;

/// Runs the file watcher until Ctrl+C.
pub async fn run(quiet: bool) -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let config = Config::load_from(&root)?;
    let compiler = project_compiler(&root, &config, quiet).await?;
    let routes = initial_compile(&compiler, false, quiet)?;

    let scheduler = Arc::new(RecompileScheduler::new(
        Arc::new(compiler.clone()),
        routes,
    ));

    let (tx, rx) = mpsc::unbounded_channel();
    let _watcher = FileWatcher::new(
        compiler.src_dir(),
        vec![compiler.out_dir().to_path_buf()],
        tx,
    )?;
    let consumer = spawn_watch_loop(scheduler, rx, quiet);

    if !quiet {
        println!("Watching for changes in: {}", compiler.src_dir().display());
        println!("Press Ctrl+C to stop...");
        println!();
    }

    signal::ctrl_c().await?;
    consumer.abort();

    if !quiet {
        println!("\nStopping file watcher...");
    }
    Ok(())
}
