// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Ordered route table.
//!
//! Static routes come first, then dynamic ones; within a kind routes are
//! sorted by URL path (case-insensitive, raw path as tie-break). The order
//! is what makes matching "first static exact match, else first dynamic
//! match" deterministic, and it is identical across rebuilds.

use serde::Serialize;
use std::cmp::Ordering;

use super::matcher::{DynamicMatcher, MatchResult};
use super::{RouteDescriptor, RouteKind, PAGE_EXTENSIONS};
use crate::error::RouteResult;

/// Two pages that resolved to the same kind and URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCollision {
    /// The shared URL path.
    pub url_path: String,
    /// Source file that stayed in the table.
    pub kept: String,
    /// Source file that was dropped.
    pub dropped: String,
}

/// Deterministically ordered routes with precompiled dynamic matchers.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    /// Index of the first dynamic route; everything before it is static.
    static_end: usize,
    /// Matchers for `routes[static_end..]`, by offset from `static_end`.
    matchers: Vec<DynamicMatcher>,
    collisions: Vec<RouteCollision>,
}

impl RouteTable {
    /// Builds a table from discovered descriptors.
    ///
    /// Descriptors sharing kind and URL path are resolved by extension
    /// precedence (`tsx`, `jsx`, `ts`, `js`), then by source path. Losers
    /// are recorded as [`RouteCollision`]s and logged.
    pub fn build(mut descriptors: Vec<RouteDescriptor>) -> RouteResult<Self> {
        descriptors.sort_by(compare_descriptors);

        let mut routes: Vec<RouteDescriptor> = Vec::with_capacity(descriptors.len());
        let mut collisions = Vec::new();

        for descriptor in descriptors {
            if let Some(previous) = routes.last() {
                if previous.kind() == descriptor.kind() && previous.url_path() == descriptor.url_path() {
                    tracing::warn!(
                        "Route collision on {}: keeping {}, dropping {}",
                        descriptor.url_path(),
                        previous.source_file(),
                        descriptor.source_file()
                    );
                    collisions.push(RouteCollision {
                        url_path: descriptor.url_path().to_string(),
                        kept: previous.source_file().to_string(),
                        dropped: descriptor.source_file().to_string(),
                    });
                    continue;
                }
            }
            routes.push(descriptor);
        }

        let static_end = routes
            .iter()
            .position(RouteDescriptor::is_dynamic)
            .unwrap_or(routes.len());

        let matchers = routes[static_end..]
            .iter()
            .map(|route| DynamicMatcher::compile(route.url_path()))
            .collect::<RouteResult<Vec<_>>>()?;

        Ok(Self {
            routes,
            static_end,
            matchers,
            collisions,
        })
    }

    /// Resolves a request path to a route.
    ///
    /// Static routes are compared exactly (no trailing-slash handling), then
    /// dynamic routes are tried in table order. Returns `None` when nothing
    /// matches.
    pub fn match_path(&self, path: &str) -> Option<MatchResult<'_>> {
        if let Some(index) = self.routes[..self.static_end]
            .iter()
            .position(|route| route.url_path() == path)
        {
            return Some(MatchResult {
                index,
                descriptor: &self.routes[index],
                params: Default::default(),
            });
        }

        self.matchers
            .iter()
            .enumerate()
            .find_map(|(offset, matcher)| {
                let params = matcher.captures(path)?;
                let index = self.static_end + offset;
                Some(MatchResult {
                    index,
                    descriptor: &self.routes[index],
                    params,
                })
            })
    }

    /// All routes in table order.
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Static routes (a prefix of [`routes`](Self::routes)).
    pub fn static_routes(&self) -> &[RouteDescriptor] {
        &self.routes[..self.static_end]
    }

    /// Dynamic routes (a suffix of [`routes`](Self::routes)).
    pub fn dynamic_routes(&self) -> &[RouteDescriptor] {
        &self.routes[self.static_end..]
    }

    /// Collisions resolved while building.
    pub fn collisions(&self) -> &[RouteCollision] {
        &self.collisions
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn compare_descriptors(a: &RouteDescriptor, b: &RouteDescriptor) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| compare_url_paths(a.url_path(), b.url_path()))
        .then_with(|| extension_rank(a).cmp(&extension_rank(b)))
        .then_with(|| a.source_file().cmp(b.source_file()))
}

fn compare_url_paths(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn extension_rank(route: &RouteDescriptor) -> usize {
    PAGE_EXTENSIONS
        .iter()
        .position(|ext| *ext == route.extension())
        .unwrap_or(PAGE_EXTENSIONS.len())
}

impl Serialize for RouteTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.routes.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn descriptor(relative: &str) -> RouteDescriptor {
        RouteDescriptor::from_relative(Path::new(relative), PathBuf::from(relative)).unwrap()
    }

    fn table(files: &[&str]) -> RouteTable {
        RouteTable::build(files.iter().map(|f| descriptor(f)).collect()).unwrap()
    }

    fn url_paths(table: &RouteTable) -> Vec<&str> {
        table.routes().iter().map(|r| r.url_path()).collect()
    }

    #[test]
    fn test_static_before_dynamic() {
        let table = table(&["user/[id].jsx", "about.jsx", "blog/[slug].jsx", "index.jsx"]);
        assert_eq!(url_paths(&table), vec!["/", "/about", "/blog/[slug]", "/user/[id]"]);
        assert_eq!(table.static_routes().len(), 2);
        assert_eq!(table.dynamic_routes().len(), 2);
    }

    #[test]
    fn test_sorted_within_kind() {
        let table = table(&["zeta.jsx", "alpha.jsx", "Beta.jsx", "mid/index.jsx"]);
        assert_eq!(url_paths(&table), vec!["/alpha", "/Beta", "/mid", "/zeta"]);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = table(&["a.jsx", "b/[x].jsx", "c.jsx", "[root].jsx"]);
        let b = table(&["[root].jsx", "c.jsx", "b/[x].jsx", "a.jsx"]);
        assert_eq!(a.routes(), b.routes());
    }

    #[test]
    fn test_collision_prefers_tsx() {
        let table = table(&["a.js", "a.jsx", "a.tsx", "a.ts"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.routes()[0].source_file(), "a.tsx");

        let dropped: Vec<&str> = table.collisions().iter().map(|c| c.dropped.as_str()).collect();
        assert_eq!(dropped, vec!["a.jsx", "a.ts", "a.js"]);
        assert!(table.collisions().iter().all(|c| c.kept == "a.tsx" && c.url_path == "/a"));
    }

    #[test]
    fn test_index_and_named_file_collide() {
        let table = table(&["blog.jsx", "blog/index.jsx"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.routes()[0].source_file(), "blog.jsx");
        assert_eq!(table.collisions().len(), 1);
    }

    #[test]
    fn test_same_path_different_kind_is_not_a_collision() {
        let table = table(&["[slug].jsx", "[slug]/index.jsx"]);
        assert_eq!(table.len(), 2);
        assert!(table.collisions().is_empty());
        assert_eq!(table.routes()[0].kind(), RouteKind::Static);
    }

    #[test]
    fn test_static_precedence_over_dynamic() {
        for files in [
            ["user/[id].jsx", "user/settings.jsx"],
            ["user/settings.jsx", "user/[id].jsx"],
        ] {
            let table = table(&files);
            let hit = table.match_path("/user/settings").unwrap();
            assert_eq!(hit.descriptor.kind(), RouteKind::Static);
            assert!(hit.params.is_empty());

            let hit = table.match_path("/user/42").unwrap();
            assert_eq!(hit.descriptor.url_path(), "/user/[id]");
            assert_eq!(hit.param("id"), Some("42"));
        }
    }

    #[test]
    fn test_match_is_deterministic() {
        let table = table(&["index.jsx", "blog/[slug].jsx", "[page].jsx"]);
        for path in ["/", "/blog/x", "/about", "/nope/nope/nope"] {
            assert_eq!(table.match_path(path), table.match_path(path));
        }
    }

    #[test]
    fn test_first_dynamic_in_table_order_wins() {
        let table = table(&["[b].jsx", "[a].jsx"]);
        let hit = table.match_path("/anything").unwrap();
        assert_eq!(hit.descriptor.url_path(), "/[a]");
        assert_eq!(hit.index, 0);
        assert_eq!(hit.param("a"), Some("anything"));
    }

    #[test]
    fn test_unmatched_path() {
        let table = table(&["index.jsx", "about.jsx", "blog/[slug].jsx"]);
        assert!(table.match_path("/does/not/exist").is_none());
        assert!(table.match_path("/about/").is_none());
        assert!(RouteTable::default().match_path("/").is_none());
    }
}
