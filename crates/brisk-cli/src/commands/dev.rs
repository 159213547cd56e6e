// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Development server command with live reload support.

use brisk::RecompileScheduler;
use console::style;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{initial_compile, project_compiler, spawn_watch_loop};
use crate::config::Config;
use crate::server::http::{create_server, AppState};
use crate::watcher::FileWatcher;

/// Runs the development server with live reload.
pub async fn run(
    host: Option<String>,
    port: Option<u16>,
    verbose: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let config = Config::load_from(&root)?;
    let host = host.unwrap_or_else(|| config.dev.host.clone());
    let port = port.unwrap_or(config.dev.port);

    let compiler = project_compiler(&root, &config, quiet).await?;
    let routes = initial_compile(&compiler, verbose, quiet)?;

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
    spawn_watch_loop(scheduler.clone(), rx, quiet);

    let addr = format!("{}:{}", host, port);
    if !quiet {
        println!();
        println!(
            "{} {}",
            style("Server:").cyan(),
            style(format!("http://{}", addr)).green().bold()
        );
        println!(
            "{} {}",
            style("Status:").cyan(),
            style("Watching for changes...").dim()
        );
        println!();
    }

    let state = Arc::new(AppState::new(scheduler, config, &root));
    create_server(&addr, state).await?;

    Ok(())
}
