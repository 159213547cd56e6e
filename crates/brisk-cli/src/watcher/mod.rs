// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File system watching for recompiles.
//!
//! This module provides `FileWatcher` for monitoring the source root and
//! forwarding relevant changes to a tokio channel.
//!
//! # Features
//!
//! - Debounced file change events (750ms)
//! - Filters for relevant file types (.js, .jsx, .ts, .tsx, .css)
//! - Ignores the output root when it lives inside the source root
//! - Recursive directory watching

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebouncedEvent, Debouncer, RecommendedCache};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Extensions whose changes start a compile cycle.
pub const WATCHED_EXTENSIONS: [&str; 5] = ["js", "jsx", "ts", "tsx", "css"];

/// Debounce window for filesystem events.
pub const DEBOUNCE: Duration = Duration::from_millis(750);

/// Returns true when a change to `path` should trigger a recompile.
pub fn is_watched(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| WATCHED_EXTENSIONS.contains(&ext))
}

/// Watches the source root for changes to page, script and style files.
///
/// Each relevant path is sent, relative to the watched root and
/// `/`-separated, over the channel given at construction. Dropping the
/// watcher stops it.
pub struct FileWatcher {
    #[allow(dead_code)]
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl FileWatcher {
    /// Creates a new file watcher for `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory path to watch recursively
    /// * `ignore` - Directories under `root` whose changes are dropped
    /// * `tx` - Channel receiving changed paths
    pub fn new(
        root: &Path,
        ignore: Vec<PathBuf>,
        tx: mpsc::UnboundedSender<String>,
    ) -> anyhow::Result<Self> {
        let base = root.to_path_buf();

        let mut debouncer = new_debouncer(
            DEBOUNCE,
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
                Ok(events) => {
                    for changed in relevant_paths(&events, &base, &ignore) {
                        if tx.send(changed).is_err() {
                            tracing::debug!("Watch consumer gone, dropping change");
                            return;
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        tracing::warn!("Watch error: {}", e);
                    }
                }
            },
        )?;

        debouncer.watch(root, RecursiveMode::Recursive)?;
        tracing::info!("Watching {}", root.display());

        Ok(Self { debouncer })
    }
}

/// Relevant, de-duplicated, root-relative paths from one debounced batch.
fn relevant_paths(events: &[DebouncedEvent], base: &Path, ignore: &[PathBuf]) -> Vec<String> {
    let paths: BTreeSet<String> = events
        .iter()
        .flat_map(|e| e.paths.iter())
        .filter(|p| is_watched(p))
        .filter(|p| !ignore.iter().any(|dir| p.starts_with(dir)))
        .map(|p| relative_display(p, base))
        .collect();
    paths.into_iter().collect()
}

fn relative_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
