// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Runtime route matching types.
//!
//! Dynamic routes are compiled once, when the table is built. A `[name]`
//! segment becomes a capture that matches one or more characters other than
//! `/`; everything else in the URL path matches literally.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use super::RouteDescriptor;
use crate::error::{RouteError, RouteResult};

lazy_static! {
    static ref BRACKET: Regex = Regex::new(r"\[([^\]]+)\]").expect("valid bracket regex");
}

/// Result of matching a request path against a route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult<'a> {
    /// Position of the matched route in the table.
    pub index: usize,

    /// The matched route.
    #[serde(rename = "route")]
    pub descriptor: &'a RouteDescriptor,

    /// Captured segments keyed by bracket name. Empty for static routes.
    pub params: BTreeMap<String, String>,
}

impl<'a> MatchResult<'a> {
    /// Get a parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// A piece of a URL path: literal text or a bracketed parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// Splits a URL path into literal text and `[name]` parameters.
pub(crate) fn bracket_segments(url_path: &str) -> impl Iterator<Item = Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in BRACKET.captures_iter(url_path) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            pieces.push(Piece::Literal(&url_path[last..whole.start()]));
        }
        pieces.push(Piece::Param(name.as_str()));
        last = whole.end();
    }
    if last < url_path.len() {
        pieces.push(Piece::Literal(&url_path[last..]));
    }

    pieces.into_iter()
}

/// Precompiled matcher for one dynamic route.
#[derive(Debug, Clone)]
pub(crate) struct DynamicMatcher {
    regex: Regex,
    params: Vec<String>,
}

impl DynamicMatcher {
    /// Compiles the anchored pattern for a dynamic URL path.
    pub(crate) fn compile(url_path: &str) -> RouteResult<Self> {
        let mut pattern = String::from("^");
        let mut params = Vec::new();

        for piece in bracket_segments(url_path) {
            match piece {
                Piece::Literal(text) => pattern.push_str(&regex::escape(text)),
                Piece::Param(name) => {
                    pattern.push_str("([^/]+)");
                    params.push(name.to_string());
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| RouteError::InvalidPattern {
            url_path: url_path.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { regex, params })
    }

    /// Returns captured parameters if the path matches.
    ///
    /// A name that appears twice keeps its last capture.
    pub(crate) fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let mut params = BTreeMap::new();
        for (i, name) in self.params.iter().enumerate() {
            if let Some(value) = caps.get(i + 1) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }
        Some(params)
    }
}
