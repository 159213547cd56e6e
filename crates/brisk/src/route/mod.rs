// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File-based route discovery.
//!
//! Every script under the pages root becomes one route:
//!
//! | File                      | URL path        | Kind    |
//! |---------------------------|-----------------|---------|
//! | `index.jsx`               | `/`             | static  |
//! | `about.tsx`               | `/about`        | static  |
//! | `blog/index.jsx`          | `/blog`         | static  |
//! | `blog/[slug].jsx`         | `/blog/[slug]`  | dynamic |
//!
//! Only the file's own base name decides whether a route is dynamic. A
//! bracketed *directory* (`blog/[slug]/index.jsx`) produces a static route
//! whose URL path still contains the brackets literally.

pub mod matcher;
pub mod table;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RouteError, RouteResult};

pub use matcher::MatchResult;
pub use table::{RouteCollision, RouteTable};

/// Script extensions recognized as pages, in collision precedence order.
pub const PAGE_EXTENSIONS: [&str; 4] = ["tsx", "jsx", "ts", "js"];

/// Whether a route matches literally or captures path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Exact URL match.
    Static,
    /// URL path contains `[name]` segments.
    Dynamic,
}

impl RouteKind {
    /// Returns the string identifier used in generated artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Static => "static",
            RouteKind::Dynamic => "dynamic",
        }
    }
}

/// One page file mapped to a URL path.
///
/// Fields are read-only once discovered; the URL path never changes after
/// classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    url_path: String,
    source_file: String,
    kind: RouteKind,
    #[serde(skip)]
    absolute_path: PathBuf,
}

impl RouteDescriptor {
    /// Builds a descriptor from a path relative to the pages root.
    ///
    /// Returns `None` if the file is not a page (unrecognized extension or
    /// a name that is not valid UTF-8).
    pub fn from_relative(relative: &Path, absolute_path: PathBuf) -> Option<Self> {
        let ext = relative.extension()?.to_str()?;
        if !PAGE_EXTENSIONS.contains(&ext) {
            return None;
        }
        let stem = relative.file_stem()?.to_str()?;

        let mut segments = Vec::new();
        for component in relative.components() {
            segments.push(component.as_os_str().to_str()?);
        }
        let source_file = segments.join("/");

        let without_ext = &source_file[..source_file.len() - ext.len() - 1];
        let mut url_path = format!("/{}", without_ext);
        if stem == "index" {
            url_path.truncate(url_path.len() - "/index".len());
            if url_path.is_empty() {
                url_path.push('/');
            }
        }

        let kind = if stem.contains('[') && stem.contains(']') {
            RouteKind::Dynamic
        } else {
            RouteKind::Static
        };

        Some(Self {
            url_path,
            source_file,
            kind,
            absolute_path,
        })
    }

    /// Normalized URL path, always starting with `/`.
    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    /// Path relative to the pages root, `/`-separated.
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Static or dynamic classification.
    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    /// Resolved filesystem path of the page.
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Returns true for dynamic routes.
    pub fn is_dynamic(&self) -> bool {
        self.kind == RouteKind::Dynamic
    }

    /// Source extension without the dot.
    pub fn extension(&self) -> &str {
        self.source_file
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default()
    }

    /// Bracket names in the order they appear in the URL path.
    pub fn param_names(&self) -> Vec<&str> {
        matcher::bracket_segments(&self.url_path)
            .filter_map(|piece| match piece {
                matcher::Piece::Param(name) => Some(name),
                matcher::Piece::Literal(_) => None,
            })
            .collect()
    }

    /// Path of the compiled module relative to the output root.
    pub fn compiled_module(&self) -> String {
        let stem = self
            .source_file
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.source_file);
        format!("pages/{}.js", stem)
    }
}

/// Discovers every page under `pages_root`.
///
/// The walk is depth-first with directory entries visited in name order,
/// which makes the result independent of the platform's listing order.
/// Files with unrecognized extensions are ignored.
///
/// # Errors
///
/// Returns [`RouteError::DirectoryNotFound`] if `pages_root` is not a
/// directory. Callers typically treat that as "no routes".
pub fn discover(pages_root: &Path) -> RouteResult<Vec<RouteDescriptor>> {
    if !pages_root.is_dir() {
        return Err(RouteError::DirectoryNotFound(pages_root.to_path_buf()));
    }

    let mut routes = Vec::new();
    // Entries are pushed in reverse so pops come out in name order.
    let mut stack = read_sorted(pages_root)?;
    stack.reverse();

    while let Some((path, is_dir)) = stack.pop() {
        if is_dir {
            let mut children = read_sorted(&path)?;
            children.reverse();
            stack.extend(children);
            continue;
        }

        let relative = path.strip_prefix(pages_root).unwrap_or(&path);
        match RouteDescriptor::from_relative(relative, path.clone()) {
            Some(route) => {
                if route.kind == RouteKind::Static && route.url_path.contains('[') {
                    tracing::debug!(
                        "{} sits under a bracketed directory but is classified static",
                        route.source_file
                    );
                }
                routes.push(route);
            }
            None => tracing::trace!("Ignoring non-page file {}", relative.display()),
        }
    }

    Ok(routes)
}

/// Lists `dir` in name order, flagging subdirectories. Symlinks are not
/// followed.
fn read_sorted(dir: &Path) -> RouteResult<Vec<(PathBuf, bool)>> {
    let entries = fs::read_dir(dir).map_err(|source| RouteError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RouteError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_dir = entry
            .file_type()
            .map_err(|source| RouteError::Io {
                path: entry.path(),
                source,
            })?
            .is_dir();
        paths.push((entry.path(), is_dir));
    }
    paths.sort();
    Ok(paths)
}
