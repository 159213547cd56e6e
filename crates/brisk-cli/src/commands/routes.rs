// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Route table inspection.
//!
//! Reads `src/pages/` directly; no compile and no esbuild needed.

use brisk::compiler::PAGES_DIR;
use brisk::{discover, RouteError, RouteTable};
use console::style;
use std::path::Path;

use super::print_routes;
use crate::config::Config;

/// Prints the route table, or resolves `path` against it.
pub async fn run(path: Option<&str>) -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let config = Config::load_from(&root)?;
    let table = load_table(&config.paths.src_dir(&root).join(PAGES_DIR))?;

    let Some(path) = path else {
        println!(
            "{} {} route(s)",
            style("Discovered").green(),
            table.len()
        );
        print_routes(&table);
        for collision in table.collisions() {
            println!(
                "  {} {} {} (kept {})",
                style("!").yellow(),
                style(&collision.url_path).yellow(),
                style(format!("ignored {}", collision.dropped)).dim(),
                collision.kept
            );
        }
        return Ok(());
    };

    let Some(hit) = table.match_path(path) else {
        anyhow::bail!("No route matches {}", path);
    };

    println!(
        "{} {} {}",
        style(path).cyan(),
        style("->").dim(),
        hit.descriptor.source_file()
    );
    for (name, value) in &hit.params {
        println!("    {} = {}", style(name).dim(), value);
    }
    Ok(())
}

/// Builds the table for a pages root. A missing root is an empty table.
pub fn load_table(pages_root: &Path) -> anyhow::Result<RouteTable> {
    match discover(pages_root) {
        Ok(descriptors) => Ok(RouteTable::build(descriptors)?),
        Err(RouteError::DirectoryNotFound(_)) => Ok(RouteTable::default()),
        Err(e) => Err(e.into()),
    }
}
