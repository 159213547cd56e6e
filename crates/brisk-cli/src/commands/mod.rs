// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! This module contains the implementations for all brisk CLI commands:
//!
//! - `build`: Bundle the project for production
//! - `compile`: Compile the project once
//! - `dev`: Start development server with live reload
//! - `routes`: Print or query the route table
//! - `watch`: Watch files and recompile on changes

/// Production build command.
pub mod build;
/// One-shot compile command.
pub mod compile;
/// Development server command.
pub mod dev;
/// Route table inspection command.
pub mod routes;
/// File watch command.
pub mod watch;

use brisk::{CompileReport, Compiler, CycleStatus, RecompileScheduler, RouteTable, TriggerOutcome};
use console::style;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::toolchain::{resolve_esbuild, EsbuildTransform};

/// Builds the project compiler, resolving esbuild first.
pub(crate) async fn project_compiler(
    root: &Path,
    config: &Config,
    quiet: bool,
) -> anyhow::Result<Compiler> {
    let esbuild = resolve_esbuild(&config.toolchain, quiet).await?;
    Ok(compiler_for(root, config, &esbuild))
}

/// Builds the project compiler around a known esbuild binary.
pub(crate) fn compiler_for(root: &Path, config: &Config, esbuild: &Path) -> Compiler {
    Compiler::new(
        config.paths.src_dir(root),
        config.paths.out_dir(root),
        Arc::new(EsbuildTransform::new(esbuild)),
    )
}

/// Runs the startup compile.
///
/// A missing source root is fatal. Any other failure is reported and the
/// routes discovered so far are returned, so the watcher can pick up the fix.
pub(crate) fn initial_compile(
    compiler: &Compiler,
    verbose: bool,
    quiet: bool,
) -> anyhow::Result<RouteTable> {
    match compiler.compile() {
        Ok(report) => {
            if !quiet {
                print_report(&report, verbose);
            }
            Ok(report.routes)
        }
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            eprintln!(
                "  {} {}",
                style("✗").red(),
                style(format!("Initial compile failed: {}", e)).red()
            );
            Ok(compiler.discover_routes().unwrap_or_default())
        }
    }
}

/// Prints a compile summary.
pub(crate) fn print_report(report: &CompileReport, verbose: bool) {
    println!(
        "  {} {} {} {}",
        style("✓").green(),
        style(format!("Compiled {} file(s)", report.stats.files)).dim(),
        style(format!("{} route(s)", report.routes.len())).cyan(),
        style(format!("{}ms", report.duration.as_millis())).dim()
    );

    for collision in report.routes.collisions() {
        println!(
            "  {} {} {} (kept {})",
            style("!").yellow(),
            style(&collision.url_path).yellow(),
            style(format!("ignored {}", collision.dropped)).dim(),
            collision.kept
        );
    }

    if verbose {
        print_routes(&report.routes);
    }
}

/// Prints one line per route.
pub(crate) fn print_routes(table: &RouteTable) {
    for route in table.routes() {
        println!(
            "    {:<8} {:<32} {}",
            style(route.kind().as_str()).dim(),
            style(route.url_path()).cyan(),
            style(route.source_file()).dim()
        );
    }
}

/// Consumes watcher events, starting a scheduler trigger for each.
///
/// Triggers run as their own tasks so the scheduler can coalesce changes
/// that arrive during a running cycle.
pub(crate) fn spawn_watch_loop(
    scheduler: Arc<RecompileScheduler>,
    mut rx: mpsc::UnboundedReceiver<String>,
    quiet: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(file) = rx.recv().await {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                let outcome = scheduler.trigger(file).await;
                print_outcome(&outcome, quiet);
            });
        }
        tracing::debug!("Watcher channel closed");
    })
}

fn print_outcome(outcome: &TriggerOutcome, quiet: bool) {
    let TriggerOutcome::Ran(cycles) = outcome else {
        return;
    };

    for cycle in cycles {
        let ms = cycle.duration.map(|d| d.as_millis()).unwrap_or_default();
        match cycle.status {
            CycleStatus::Succeeded if !quiet => println!(
                "  {} {} {}",
                style("✓").green(),
                style(&cycle.trigger_file).dim(),
                style(format!("{}ms", ms)).dim()
            ),
            CycleStatus::Failed => eprintln!(
                "  {} {} {}",
                style("✗").red(),
                style(&cycle.trigger_file).dim(),
                style(cycle.error.as_deref().unwrap_or("compile failed")).red()
            ),
            _ => {}
        }
    }
}
