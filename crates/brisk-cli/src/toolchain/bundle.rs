// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Production bundling through esbuild.
//!
//! The bundle is split, minified ESM with hashed file names under
//! `<dist>/assets/`. esbuild writes a metafile next to it; the entry chunk
//! is looked up there so the HTML shell can reference it.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command as TokioCommand;

use super::types::{ToolchainError, ToolchainResult};

/// Directory under the dist root receiving the bundle.
pub const ASSETS_DIR: &str = "assets";

const METAFILE: &str = "meta.json";

#[derive(Debug, Deserialize)]
struct Metafile {
    outputs: BTreeMap<String, MetaOutput>,
}

#[derive(Debug, Deserialize)]
struct MetaOutput {
    #[serde(rename = "entryPoint")]
    entry_point: Option<String>,
    #[serde(rename = "cssBundle")]
    css_bundle: Option<String>,
    #[serde(default)]
    bytes: u64,
}

/// One file written by the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    /// Path relative to the dist root, `/`-separated.
    pub path: String,
    /// Size in bytes.
    pub bytes: u64,
}

/// What a bundle run produced.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    /// Entry chunk, relative to the dist root.
    pub entry: String,
    /// Stylesheet collected from CSS the entry imports, if any.
    pub stylesheet: Option<String>,
    /// Every output file, in path order.
    pub files: Vec<BundleFile>,
}

/// Runs esbuild in bundle mode for one entry point.
#[derive(Debug, Clone)]
pub struct Bundler {
    binary: PathBuf,
    root: PathBuf,
}

impl Bundler {
    /// Creates a bundler that runs `binary` from the project `root`.
    pub fn new(binary: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            root: root.into(),
        }
    }

    /// Bundles `entry` into `dist_dir/assets`.
    pub async fn bundle(&self, entry: &Path, dist_dir: &Path) -> ToolchainResult<BundleOutput> {
        let assets_dir = dist_dir.join(ASSETS_DIR);
        fs::create_dir_all(&assets_dir)?;
        let metafile = dist_dir.join(METAFILE);

        let start = Instant::now();
        let output = TokioCommand::new(&self.binary)
            .current_dir(&self.root)
            .arg(entry)
            .args(bundle_args(&assets_dir, &metafile))
            .output()
            .await?;

        if !output.status.success() {
            return Err(ToolchainError::ExecutionFailed(format!(
                "esbuild bundle failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        tracing::debug!("esbuild bundle completed in {:?}", start.elapsed());

        let meta = fs::read_to_string(&metafile)?;
        fs::remove_file(&metafile)?;
        parse_metafile(&meta, &self.root, dist_dir)
    }
}

fn bundle_args(assets_dir: &Path, metafile: &Path) -> Vec<String> {
    vec![
        "--bundle".to_string(),
        "--minify".to_string(),
        "--splitting".to_string(),
        "--format=esm".to_string(),
        "--platform=browser".to_string(),
        "--sourcemap=external".to_string(),
        "--jsx=automatic".to_string(),
        format!("--outdir={}", assets_dir.display()),
        "--entry-names=[name]-[hash]".to_string(),
        "--chunk-names=chunks/[name]-[hash]".to_string(),
        "--asset-names=[name]-[hash]".to_string(),
        format!("--metafile={}", metafile.display()),
        "--log-level=warning".to_string(),
    ]
}

/// Reads an esbuild metafile. Output keys are relative to `root`.
fn parse_metafile(content: &str, root: &Path, dist_dir: &Path) -> ToolchainResult<BundleOutput> {
    let meta: Metafile = serde_json::from_str(content)?;

    let relative = |key: &str| -> String {
        let absolute = root.join(key);
        let path = absolute.strip_prefix(dist_dir).unwrap_or(&absolute);
        path.to_string_lossy().replace('\\', "/")
    };

    let (entry, stylesheet) = meta
        .outputs
        .iter()
        .find(|(key, output)| output.entry_point.is_some() && key.ends_with(".js"))
        .map(|(key, output)| (relative(key), output.css_bundle.as_deref().map(relative)))
        .ok_or_else(|| {
            ToolchainError::ExecutionFailed("esbuild produced no entry chunk".to_string())
        })?;

    let files = meta
        .outputs
        .iter()
        .map(|(key, output)| BundleFile {
            path: relative(key),
            bytes: output.bytes,
        })
        .collect();

    Ok(BundleOutput {
        entry,
        stylesheet,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"{
        "inputs": {},
        "outputs": {
            "dist/assets/chunks/chunk-ABC.js": { "bytes": 120, "imports": [], "exports": [] },
            "dist/assets/main-X7Y2.js.map": { "bytes": 900 },
            "dist/assets/main-X7Y2.css": { "bytes": 512 },
            "dist/assets/main-X7Y2.js": {
                "bytes": 4096,
                "entryPoint": "src/main.jsx",
                "cssBundle": "dist/assets/main-X7Y2.css"
            }
        }
    }"#;

    #[test]
    fn test_entry_is_found_in_metafile() {
        let root = Path::new("/project");
        let output = parse_metafile(META, root, &root.join("dist")).unwrap();
        assert_eq!(output.entry, "assets/main-X7Y2.js");
        assert_eq!(output.stylesheet.as_deref(), Some("assets/main-X7Y2.css"));
        assert_eq!(output.files.len(), 4);
        assert_eq!(output.files[0].path, "assets/chunks/chunk-ABC.js");
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let root = Path::new("/project");
        let meta = r#"{ "outputs": { "dist/assets/chunk.js": { "bytes": 1 } } }"#;
        assert!(parse_metafile(meta, root, &root.join("dist")).is_err());
    }

    #[test]
    fn test_entry_without_css_has_no_stylesheet() {
        let root = Path::new("/project");
        let meta = r#"{ "outputs": { "dist/assets/main-A.js": { "bytes": 1, "entryPoint": "src/main.jsx" } } }"#;
        let output = parse_metafile(meta, root, &root.join("dist")).unwrap();
        assert_eq!(output.stylesheet, None);
    }

    #[test]
    fn test_bundle_args() {
        let args = bundle_args(Path::new("dist/assets"), Path::new("dist/meta.json"));
        assert!(args.contains(&"--splitting".to_string()));
        assert!(args.contains(&"--outdir=dist/assets".to_string()));
        assert!(args.contains(&"--metafile=dist/meta.json".to_string()));
    }
}
