// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! One-shot compile command.

use console::style;

use super::{print_report, project_compiler};
use crate::config::Config;

/// Compiles the project once. Any compile error exits non-zero.
pub async fn run(verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let config = Config::load_from(&root)?;
    let compiler = project_compiler(&root, &config, quiet).await?;

    if !quiet {
        println!(
            "{} {}",
            style("Compiling:").cyan(),
            compiler.src_dir().display()
        );
    }

    let report = compiler.compile()?;
    if !quiet {
        print_report(&report, verbose);
        println!(
            "{} {}",
            style("Output:").cyan(),
            compiler.out_dir().display()
        );
    }

    Ok(())
}
