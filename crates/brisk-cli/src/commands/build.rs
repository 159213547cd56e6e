// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Build command for bundling the project for production.
//!
//! Steps: compile (so `router.js` and the output tree are current), copy
//! `public/` into the dist root, bundle the entry with esbuild, write
//! `index.html`.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::{compiler_for, print_report};
use crate::config::Config;
use crate::server::shell::render_production_shell;
use crate::toolchain::{resolve_esbuild, Bundler};

/// Runs the production build.
pub async fn run(output: Option<String>, quiet: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let root = std::env::current_dir()?;
    let config = Config::load_from(&root)?;
    let dist_dir = output
        .map(|o| root.join(o))
        .unwrap_or_else(|| config.paths.dist_dir(&root));

    let entry = config.paths.entry(&root);
    if !entry.exists() {
        anyhow::bail!("Entry point not found: {}", config.paths.entry);
    }

    let esbuild = resolve_esbuild(&config.toolchain, quiet).await?;
    let compiler = compiler_for(&root, &config, &esbuild);
    let report = compiler.compile()?;
    if !quiet {
        print_report(&report, false);
    }

    if dist_dir.exists() {
        fs::remove_dir_all(&dist_dir)?;
    }
    fs::create_dir_all(&dist_dir)?;

    let public_dir = config.paths.public_dir(&root);
    if public_dir.is_dir() {
        let copied = copy_dir(&public_dir, &dist_dir)?;
        if !quiet {
            println!(
                "  {} {}",
                style("✓").green(),
                style(format!("Copied {} public asset(s)", copied)).dim()
            );
        }
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(spinner) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        pb.set_style(spinner);
    }
    pb.set_message("Bundling...");
    pb.enable_steady_tick(Duration::from_millis(80));

    let bundle = match Bundler::new(esbuild, &root).bundle(&entry, &dist_dir).await {
        Ok(bundle) => {
            pb.finish_and_clear();
            bundle
        }
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    let index = dist_dir.join("index.html");
    let html = render_production_shell(&config, &bundle.entry, bundle.stylesheet.as_deref());
    fs::write(&index, html)?;

    if !quiet {
        for file in &bundle.files {
            println!(
                "    {:<48} {}",
                style(&file.path).dim(),
                style(format!("{:.2} KB", file.bytes as f64 / 1024.0)).dim()
            );
        }
        println!(
            "  {} {} {}",
            style("✓").green(),
            style("Build complete").green(),
            style(format!("{}ms", start.elapsed().as_millis())).dim()
        );
        println!("{} {}", style("Output:").cyan(), dist_dir.display());
    }

    Ok(())
}

/// Copies a directory tree into `to`, returning the number of files copied.
fn copy_dir(from: &Path, to: &Path) -> std::io::Result<usize> {
    let mut copied = 0;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst)?;
        for entry in fs::read_dir(&src)? {
            let entry = entry?;
            let target = dst.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), &target)?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
