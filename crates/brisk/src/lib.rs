// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # brisk
//!
//! File-based routing and incremental recompilation for single-page apps.
//!
//! brisk turns a `src/` directory into a routable application: every script
//! under `src/pages/` becomes a route, the route table is serialized into a
//! `router.js` artifact, and a watch-compile-notify loop keeps connected
//! browser tabs in sync with the sources.
//!
//! ## Features
//!
//! - Static and `[param]` dynamic routes discovered from the filesystem
//! - Deterministic route tables with collision reporting
//! - Precompiled dynamic matchers (no per-request regex construction)
//! - Byte-stable router artifact generation
//! - Single-flight recompilation with live-reload broadcasting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use brisk::{Compiler, RouteTable};
//!
//! let compiler = Compiler::for_project(".", Arc::new(my_transform));
//! let report = compiler.compile()?;
//! if let Some(hit) = report.routes.match_path("/blog/hello") {
//!     println!("{} -> {:?}", hit.descriptor.source_file(), hit.params);
//! }
//! ```

/// Router artifact (`router.js`) generation.
pub mod artifact;
/// Project compiler: transforms, copies and skips source files.
pub mod compiler;
/// Error types for routing and compilation.
pub mod error;
/// Live-reload events and the session broadcaster.
pub mod reload;
/// Route discovery, table building and matching.
pub mod route;
/// Single-flight recompile scheduler.
pub mod scheduler;
/// Syntax transform seam for external toolchains.
pub mod transform;

pub use artifact::{render_router, write_router, RouterWrite};
pub use compiler::{CompileReport, CompileStats, Compiler};
pub use error::{CompileError, CompileResult, RouteError, RouteResult};
pub use reload::{Broadcaster, ReloadEvent, SessionId, SessionSendFailure, SessionSink};
pub use route::{discover, MatchResult, RouteCollision, RouteDescriptor, RouteKind, RouteTable};
pub use scheduler::{
    CompileCycle, CycleStatus, Recompile, RecompileScheduler, SchedulerState, TriggerOutcome,
};
pub use transform::{Loader, Transform, TransformError};
