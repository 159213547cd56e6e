// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Router artifact generation.
//!
//! The artifact is an ES module written to `<out>/router.js`. It imports
//! every page, exports the ordered `routes` list and a `matchRoute(path)`
//! function with the same semantics as [`RouteTable::match_path`]: exact
//! static match first, then the first dynamic route whose precompiled
//! pattern matches.
//!
//! Rendering is a pure function of the table, so regenerating from an
//! identical table yields identical bytes. [`write_router`] skips the write
//! when the file on disk already has those bytes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, CompileResult};
use crate::route::matcher::{bracket_segments, Piece};
use crate::route::{RouteDescriptor, RouteTable};

/// File name of the generated router inside the output root.
pub const ROUTER_FILE: &str = "router.js";

const HEADER: &str = "// Auto-generated by brisk. Do not edit.\n";

const MATCH_ROUTE: &str = r#"
export function matchRoute(pathname) {
  for (const route of routes) {
    if (route.type === "static" && route.path === pathname) {
      return { ...route, params: {} };
    }
  }

  for (const route of routes) {
    if (route.type === "dynamic") {
      const match = route.pattern.exec(pathname);
      if (match) {
        const params = {};
        route.params.forEach((name, i) => {
          params[name] = match[i + 1];
        });
        return { ...route, params };
      }
    }
  }

  return null;
}
"#;

/// Outcome of writing the router artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterWrite {
    /// Where the artifact lives.
    pub path: PathBuf,
    /// False when the existing file already had identical content.
    pub changed: bool,
}

/// Renders the router module for a table.
pub fn render_router(table: &RouteTable) -> String {
    let mut out = String::from(HEADER);

    for (i, route) in table.routes().iter().enumerate() {
        out.push_str(&format!(
            "import Page{} from {};\n",
            i,
            js_string(&format!("./{}", route.compiled_module()))
        ));
    }

    out.push_str("\nexport const routes = [\n");
    for (i, route) in table.routes().iter().enumerate() {
        out.push_str(&route_entry(i, route));
    }
    out.push_str("];\n");
    out.push_str(MATCH_ROUTE);

    out
}

/// Writes `router.js` into `out_dir`, creating the directory if needed.
pub fn write_router(table: &RouteTable, out_dir: &Path) -> CompileResult<RouterWrite> {
    let path = out_dir.join(ROUTER_FILE);
    let code = render_router(table);

    if let Ok(existing) = fs::read(&path) {
        if existing == code.as_bytes() {
            tracing::debug!("{} unchanged", path.display());
            return Ok(RouterWrite { path, changed: false });
        }
    }

    fs::create_dir_all(out_dir).map_err(|e| CompileError::io(out_dir, e))?;
    fs::write(&path, code).map_err(|e| CompileError::io(&path, e))?;

    Ok(RouterWrite { path, changed: true })
}

fn route_entry(index: usize, route: &RouteDescriptor) -> String {
    let mut entry = format!(
        "  {{ path: {}, component: Page{}, type: {}, file: {}",
        js_string(route.url_path()),
        index,
        js_string(route.kind().as_str()),
        js_string(route.source_file())
    );

    if route.is_dynamic() {
        let params: Vec<String> = route.param_names().into_iter().map(js_string).collect();
        entry.push_str(&format!(
            ", pattern: {}, params: [{}]",
            js_regex(route.url_path()),
            params.join(", ")
        ));
    }

    entry.push_str(" },\n");
    entry
}

/// Quotes a string as a JavaScript literal. JSON strings are valid JS.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Builds an anchored JavaScript regex literal for a dynamic URL path.
fn js_regex(url_path: &str) -> String {
    let mut source = String::from("/^");
    for piece in bracket_segments(url_path) {
        match piece {
            Piece::Literal(text) => {
                for c in text.chars() {
                    if "\\^$.*+?()[]{}|/".contains(c) {
                        source.push('\\');
                    }
                    source.push(c);
                }
            }
            Piece::Param(_) => source.push_str("([^/]+)"),
        }
    }
    source.push_str("$/");
    source
}
