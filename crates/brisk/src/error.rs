// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for route discovery and project compilation.
//!
//! # Error Categories
//!
//! - **Routing**: [`RouteError`], raised while walking `pages/` or compiling
//!   dynamic matchers. A missing pages directory is not fatal for a compile
//!   cycle; it degrades to an empty route table.
//! - **Compilation**: [`CompileError`], raised by the project compiler. Only
//!   [`CompileError::SourceRootMissing`] is meant to stop a process, and only
//!   at startup.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while discovering or building routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The pages directory does not exist.
    #[error("Pages directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// A dynamic route could not be turned into a matcher.
    #[error("Invalid route pattern {url_path}: {message}")]
    InvalidPattern {
        /// URL path of the offending route.
        url_path: String,
        /// Underlying pattern error.
        message: String,
    },

    /// Filesystem I/O error while scanning.
    #[error("IO error while scanning {}: {source}", path.display())]
    Io {
        /// Path being read when the error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors produced by a compile cycle.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The source root does not exist; nothing can be compiled.
    #[error("Source directory not found: {}", .0.display())]
    SourceRootMissing(PathBuf),

    /// The syntax transform rejected a file. Aborts the whole cycle.
    #[error("Failed to compile {}: {message}", path.display())]
    Transform {
        /// Path of the file relative to the source root.
        path: PathBuf,
        /// Message reported by the transform.
        message: String,
    },

    /// Filesystem I/O error while reading or writing compiled output.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Route discovery failed for a reason other than a missing directory.
    #[error(transparent)]
    Route(#[from] RouteError),
}

impl CompileError {
    /// Returns true for errors that should terminate the process at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CompileError::SourceRootMissing(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_source_root_is_fatal() {
        assert!(CompileError::SourceRootMissing(PathBuf::from("src")).is_fatal());
        assert!(!CompileError::Transform {
            path: PathBuf::from("pages/a.jsx"),
            message: "unexpected token".to_string(),
        }
        .is_fatal());
        assert!(!CompileError::from(RouteError::DirectoryNotFound(PathBuf::from("pages"))).is_fatal());
    }

    #[test]
    fn test_transform_error_names_file() {
        let err = CompileError::Transform {
            path: PathBuf::from("pages/b.tsx"),
            message: "Expected \";\"".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("pages/b.tsx"));
        assert!(text.contains("Expected"));
    }
}
