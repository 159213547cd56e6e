// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Development server components.
//!
//! This module provides the HTTP server and live reload functionality
//! for the brisk development experience.
//!
//! # Components
//!
//! - `http`: HTTP server using Axum
//! - `livereload`: WebSocket session bridged to the broadcaster
//! - `shell`: HTML shells and the live-reload client script
//! - `assets`: content types for compiled output

/// Content types for files served from the output root.
pub mod assets;
/// HTTP server implementation using Axum.
pub mod http;
/// Live reload WebSocket server.
pub mod livereload;
/// HTML shells and the live-reload client.
pub mod shell;
