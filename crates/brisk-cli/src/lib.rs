// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! Brisk CLI library.
//!
//! This crate provides the command-line interface around the `brisk`
//! library: configuration, the esbuild toolchain, the file watcher and the
//! development server.
//!
//! # Features
//!
//! - **Development server** with live reload over WebSocket
//! - **File-based routing** from `src/pages/`
//! - **esbuild** download and management for JSX/TSX transforms and bundling
//! - **File watching** with single-flight recompiles
//!
//! # Usage
//!
//! This crate is primarily used through the `brisk` binary:
//!
//! ```bash
//! brisk dev            # Start development server
//! brisk compile        # Compile once
//! brisk watch          # Recompile on change, no server
//! brisk routes /blog/x # Resolve a path against the route table
//! brisk build          # Bundle for production
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `brisk.toml` at the project root.

/// CLI commands (dev, compile, watch, routes, build).
pub mod commands;
/// Project configuration from `brisk.toml`.
pub mod config;
/// Development server with live reload.
pub mod server;
/// esbuild download, transform and bundling.
pub mod toolchain;
/// File system watching for recompiles.
pub mod watcher;
