// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Project compiler.
//!
//! One call to [`Compiler::compile`] is a full pass over the source root:
//!
//! 1. Discover pages under `src/pages/` and build the route table
//! 2. Write `router.js` into the output root (only when routes exist)
//! 3. Mirror the source tree into the output root:
//!    - `.jsx`, `.tsx`, `.ts` go through the [`Transform`] and land as `.js`
//!    - `.js` and `.css` are copied byte for byte
//!    - everything else is skipped and counted
//!
//! The first transform failure aborts the pass. Files written before the
//! failure stay on disk.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::artifact::{write_router, RouterWrite, ROUTER_FILE};
use crate::error::{CompileError, CompileResult, RouteError};
use crate::route::{discover, RouteTable, PAGE_EXTENSIONS};
use crate::transform::{Loader, Transform};

/// Source directory, relative to the project root.
pub const SRC_DIR: &str = "src";

/// Pages directory, relative to the source root.
pub const PAGES_DIR: &str = "pages";

/// Output directory, relative to the project root.
pub const OUT_DIR: &str = ".brisk/compiled";

/// Extension every transformed script is written with.
pub const OUTPUT_EXTENSION: &str = "js";

/// File counts for one compile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    /// Files transformed or copied.
    pub files: usize,
    /// Files ignored.
    pub skipped: usize,
}

/// Everything a successful compile pass produced.
#[derive(Debug, Clone)]
pub struct CompileReport {
    /// File counts.
    pub stats: CompileStats,
    /// The freshly built route table.
    pub routes: RouteTable,
    /// Router artifact write, if any routes were found.
    pub router: Option<RouterWrite>,
    /// Wall time of the pass.
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileAction {
    Transform(Loader),
    Copy,
    Skip,
}

impl FileAction {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => match Loader::from_extension(ext) {
                Some(loader) => FileAction::Transform(loader),
                None if ext == "js" || ext == "css" => FileAction::Copy,
                None => FileAction::Skip,
            },
            None => FileAction::Skip,
        }
    }
}

/// Compiles a source tree into a browser-runnable output tree.
#[derive(Clone)]
pub struct Compiler {
    src_dir: PathBuf,
    out_dir: PathBuf,
    transform: Arc<dyn Transform>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("src_dir", &self.src_dir)
            .field("out_dir", &self.out_dir)
            .finish_non_exhaustive()
    }
}

impl Compiler {
    /// Creates a compiler with explicit source and output roots.
    pub fn new(
        src_dir: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        transform: Arc<dyn Transform>,
    ) -> Self {
        Self {
            src_dir: src_dir.into(),
            out_dir: out_dir.into(),
            transform,
        }
    }

    /// Creates a compiler for the conventional layout under `root`
    /// (`src/` compiled into `.brisk/compiled/`).
    pub fn for_project(root: impl AsRef<Path>, transform: Arc<dyn Transform>) -> Self {
        let root = root.as_ref();
        Self::new(root.join(SRC_DIR), root.join(OUT_DIR), transform)
    }

    /// Source root.
    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    /// Output root.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Pages root used for route discovery.
    pub fn pages_dir(&self) -> PathBuf {
        self.src_dir.join(PAGES_DIR)
    }

    /// Runs a full compile pass.
    ///
    /// # Errors
    ///
    /// - [`CompileError::SourceRootMissing`] if the source root is absent
    /// - [`CompileError::Transform`] on the first file the transform rejects
    /// - [`CompileError::Io`] on read/write failures
    pub fn compile(&self) -> CompileResult<CompileReport> {
        let start = Instant::now();

        if !self.src_dir.is_dir() {
            return Err(CompileError::SourceRootMissing(self.src_dir.clone()));
        }

        if !self.out_dir.exists() {
            fs::create_dir_all(&self.out_dir).map_err(|e| CompileError::io(&self.out_dir, e))?;
            tracing::info!("Created {}", self.out_dir.display());
        }

        let routes = self.discover_routes()?;
        let router = if routes.is_empty() {
            self.remove_stale_router()?;
            None
        } else {
            let write = write_router(&routes, &self.out_dir)?;
            tracing::info!(
                "Generated {} ({} route(s){})",
                ROUTER_FILE,
                routes.len(),
                if write.changed { "" } else { ", unchanged" }
            );
            Some(write)
        };

        let stats = self.compile_tree()?;
        let duration = start.elapsed();
        tracing::info!(
            "Compiled {} file(s), skipped {} in {}ms",
            stats.files,
            stats.skipped,
            duration.as_millis()
        );

        Ok(CompileReport {
            stats,
            routes,
            router,
            duration,
        })
    }

    /// Discovers pages and builds the route table.
    ///
    /// A missing pages directory yields an empty table.
    pub fn discover_routes(&self) -> CompileResult<RouteTable> {
        match discover(&self.pages_dir()) {
            Ok(descriptors) => {
                let table = RouteTable::build(descriptors)?;
                tracing::info!("Discovered {} route(s)", table.len());
                Ok(table)
            }
            Err(RouteError::DirectoryNotFound(path)) => {
                tracing::debug!("No pages directory at {}, routing disabled", path.display());
                Ok(RouteTable::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove_stale_router(&self) -> CompileResult<()> {
        let path = self.out_dir.join(ROUTER_FILE);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| CompileError::io(&path, e))?;
            tracing::info!("Removed stale {}", ROUTER_FILE);
        }
        Ok(())
    }

    fn compile_tree(&self) -> CompileResult<CompileStats> {
        let mut stats = CompileStats::default();
        let mut pending = vec![self.src_dir.clone()];

        while let Some(dir) = pending.pop() {
            let relative_dir = self.relative(&dir);
            let out_dir = self.out_dir.join(relative_dir);
            fs::create_dir_all(&out_dir).map_err(|e| CompileError::io(&out_dir, e))?;

            let mut files = Vec::new();
            for (path, is_dir) in read_sorted(&dir)? {
                if path == self.out_dir {
                    continue;
                }
                if is_dir {
                    pending.push(path);
                } else {
                    files.push(path);
                }
            }

            let shadowed = shadowed_scripts(&files);
            for path in &files {
                if shadowed.contains(path) {
                    tracing::debug!(
                        "Shadowed: {} (a sibling with the same stem takes precedence)",
                        self.relative(path).display()
                    );
                    stats.skipped += 1;
                    continue;
                }
                self.compile_file(path, &mut stats)?;
            }
        }

        Ok(stats)
    }

    fn compile_file(&self, path: &Path, stats: &mut CompileStats) -> CompileResult<()> {
        let relative = self.relative(path);
        let target = self.out_dir.join(relative);

        match FileAction::for_path(path) {
            FileAction::Transform(loader) => {
                let source = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
                let output = self.transform.transform(&source, loader).map_err(|e| {
                    tracing::error!("Failed to compile {}: {}", relative.display(), e);
                    CompileError::Transform {
                        path: relative.to_path_buf(),
                        message: e.message,
                    }
                })?;
                let target = target.with_extension(OUTPUT_EXTENSION);
                fs::write(&target, output).map_err(|e| CompileError::io(&target, e))?;
                tracing::debug!("Compiled: {} -> {}", relative.display(), target.display());
                stats.files += 1;
            }
            FileAction::Copy => {
                fs::copy(path, &target).map_err(|e| CompileError::io(path, e))?;
                tracing::debug!("Copied: {}", relative.display());
                stats.files += 1;
            }
            FileAction::Skip => {
                tracing::debug!("Skipped: {}", relative.display());
                stats.skipped += 1;
            }
        }

        Ok(())
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.src_dir).unwrap_or(path)
    }
}

/// Lists `dir` in name order, flagging subdirectories. Symlinks are not
/// followed.
fn read_sorted(dir: &Path) -> CompileResult<Vec<(PathBuf, bool)>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CompileError::io(dir, e))? {
        let entry = entry.map_err(|e| CompileError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| CompileError::io(entry.path(), e))?;
        paths.push((entry.path(), file_type.is_dir()));
    }
    paths.sort();
    Ok(paths)
}

/// Scripts in one directory that lose their output file to a sibling with
/// the same stem. Precedence matches the route table: tsx, jsx, ts, js.
fn shadowed_scripts(files: &[PathBuf]) -> HashSet<PathBuf> {
    let mut winners: HashMap<PathBuf, (usize, &PathBuf)> = HashMap::new();
    let mut shadowed = HashSet::new();

    for path in files {
        let Some(rank) = script_rank(path) else {
            continue;
        };
        let target = path.with_extension(OUTPUT_EXTENSION);
        match winners.get(&target).copied() {
            Some((kept, _)) if kept <= rank => {
                shadowed.insert(path.clone());
            }
            Some((_, loser)) => {
                shadowed.insert(loser.clone());
                winners.insert(target, (rank, path));
            }
            None => {
                winners.insert(target, (rank, path));
            }
        }
    }

    shadowed
}

fn script_rank(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?;
    PAGE_EXTENSIONS.iter().position(|candidate| *candidate == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformError;
    use tempfile::tempdir;

    fn marker_transform() -> Arc<dyn Transform> {
        Arc::new(|source: &str, loader: Loader| {
            Ok::<_, TransformError>(format!("/* {} */\n{}", loader.as_str(), source))
        })
    }

    fn setup_project(root: &Path) {
        let src = root.join(SRC_DIR);
        fs::create_dir_all(src.join("pages/blog")).unwrap();
        fs::create_dir_all(src.join("components")).unwrap();
        fs::write(src.join("main.jsx"), "render(<App />)").unwrap();
        fs::write(src.join("util.js"), "export const x = 1;").unwrap();
        fs::write(src.join("app.css"), "body { margin: 0 }").unwrap();
        fs::write(src.join("logo.png"), [0u8, 1, 2]).unwrap();
        fs::write(src.join("components/Nav.tsx"), "export const Nav = () => <nav />").unwrap();
        fs::write(src.join("pages/index.jsx"), "export default () => <h1 />").unwrap();
        fs::write(src.join("pages/blog/[slug].ts"), "export default 1 as number").unwrap();
    }

    #[test]
    fn test_compile_mirrors_tree() {
        let dir = tempdir().unwrap();
        setup_project(dir.path());

        let compiler = Compiler::for_project(dir.path(), marker_transform());
        let report = compiler.compile().unwrap();
        let out = compiler.out_dir();

        assert_eq!(report.stats, CompileStats { files: 6, skipped: 1 });
        assert!(fs::read_to_string(out.join("main.js")).unwrap().starts_with("/* jsx */"));
        assert!(fs::read_to_string(out.join("components/Nav.js")).unwrap().starts_with("/* tsx */"));
        assert!(fs::read_to_string(out.join("pages/blog/[slug].js")).unwrap().starts_with("/* ts */"));
        assert_eq!(fs::read_to_string(out.join("util.js")).unwrap(), "export const x = 1;");
        assert_eq!(fs::read_to_string(out.join("app.css")).unwrap(), "body { margin: 0 }");
        assert!(!out.join("logo.png").exists());
    }

    #[test]
    fn test_compile_generates_router() {
        let dir = tempdir().unwrap();
        setup_project(dir.path());

        let report = Compiler::for_project(dir.path(), marker_transform()).compile().unwrap();
        assert_eq!(report.routes.len(), 2);
        let router = report.router.unwrap();
        assert!(router.changed);
        let code = fs::read_to_string(&router.path).unwrap();
        assert!(code.contains("./pages/blog/[slug].js"));
    }

    #[test]
    fn test_missing_pages_means_no_routes() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.jsx"), "").unwrap();

        let compiler = Compiler::for_project(dir.path(), marker_transform());
        let report = compiler.compile().unwrap();
        assert!(report.routes.is_empty());
        assert!(report.router.is_none());
        assert!(!compiler.out_dir().join(ROUTER_FILE).exists());
    }

    #[test]
    fn test_stale_router_is_removed() {
        let dir = tempdir().unwrap();
        setup_project(dir.path());
        let compiler = Compiler::for_project(dir.path(), marker_transform());
        compiler.compile().unwrap();
        assert!(compiler.out_dir().join(ROUTER_FILE).exists());

        fs::remove_dir_all(dir.path().join("src/pages")).unwrap();
        compiler.compile().unwrap();
        assert!(!compiler.out_dir().join(ROUTER_FILE).exists());
    }

    #[test]
    fn test_missing_source_root() {
        let dir = tempdir().unwrap();
        let err = Compiler::for_project(dir.path(), marker_transform())
            .compile()
            .unwrap_err();
        assert!(matches!(err, CompileError::SourceRootMissing(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_transform_failure_aborts_with_path() {
        let dir = tempdir().unwrap();
        let src = dir.path().join(SRC_DIR);
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.jsx"), "ok").unwrap();
        fs::write(src.join("b.jsx"), "broken").unwrap();
        fs::write(src.join("c.jsx"), "ok").unwrap();

        let transform: Arc<dyn Transform> = Arc::new(|source: &str, _: Loader| {
            if source == "broken" {
                Err(TransformError::new("Unexpected token"))
            } else {
                Ok(source.to_string())
            }
        });
        let compiler = Compiler::for_project(dir.path(), transform);

        match compiler.compile().unwrap_err() {
            CompileError::Transform { path, message } => {
                assert_eq!(path, PathBuf::from("b.jsx"));
                assert_eq!(message, "Unexpected token");
            }
            other => panic!("expected transform error, got {:?}", other),
        }
        // No rollback: a.jsx was compiled before b.jsx failed.
        assert!(compiler.out_dir().join("a.js").exists());
        assert!(!compiler.out_dir().join("c.js").exists());
    }

    #[test]
    fn test_same_stem_sibling_follows_route_precedence() {
        let dir = tempdir().unwrap();
        let pages = dir.path().join("src/pages");
        fs::create_dir_all(&pages).unwrap();
        fs::write(pages.join("a.jsx"), "FROM_JSX").unwrap();
        fs::write(pages.join("a.ts"), "FROM_TS").unwrap();
        fs::write(pages.join("b.js"), "FROM_JS").unwrap();
        fs::write(pages.join("b.tsx"), "FROM_TSX").unwrap();

        let identity: Arc<dyn Transform> =
            Arc::new(|source: &str, _: Loader| Ok::<_, TransformError>(source.to_string()));
        let compiler = Compiler::for_project(dir.path(), identity);
        let report = compiler.compile().unwrap();

        let kept: Vec<&str> = report.routes.collisions().iter().map(|c| c.kept.as_str()).collect();
        assert_eq!(kept, vec!["a.jsx", "b.tsx"]);

        let out = compiler.out_dir().join("pages");
        assert_eq!(fs::read_to_string(out.join("a.js")).unwrap(), "FROM_JSX");
        assert_eq!(fs::read_to_string(out.join("b.js")).unwrap(), "FROM_TSX");
        assert_eq!(report.stats, CompileStats { files: 2, skipped: 2 });
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dirs_are_not_followed() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("main.js"), "").unwrap();
        std::os::unix::fs::symlink(&src, src.join("loop")).unwrap();

        let report = Compiler::for_project(dir.path(), marker_transform())
            .compile()
            .unwrap();
        assert_eq!(report.stats, CompileStats { files: 1, skipped: 1 });
    }

    #[test]
    fn test_output_root_inside_source_is_not_walked() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("main.js"), "").unwrap();

        let compiler = Compiler::new(&src, src.join("out"), marker_transform());
        compiler.compile().unwrap();
        let report = compiler.compile().unwrap();
        assert_eq!(report.stats.files, 1);
    }
}
