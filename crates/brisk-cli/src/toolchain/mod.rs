// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! esbuild toolchain for brisk-cli.
//!
//! This module locates an esbuild binary (configured path, per-user cache,
//! or a fresh download from the npm registry) and wraps it twice: as the
//! [`brisk::Transform`] used by the compiler, and as the production bundler.

pub mod bundle;
mod download;
pub mod transform;
pub mod types;

use console::style;
use directories::ProjectDirs;
use parking_lot::Mutex;
use std::{fs, path::PathBuf};

pub use self::bundle::{BundleOutput, Bundler};
pub use self::transform::EsbuildTransform;
pub use self::types::{
    Platform, ToolPath, ToolchainConfig, ToolchainError, ToolchainResult, TOOL_NAME,
};

/// Versions whose download already failed during this CLI execution
pub(crate) static FAILED_DOWNLOADS: Mutex<Vec<String>> = parking_lot::const_mutex(Vec::new());

/// Manages esbuild downloads and caching
pub struct ToolchainManager {
    cache_dir: PathBuf,
}

impl ToolchainManager {
    /// Creates a manager backed by the per-user cache directory
    pub fn new() -> ToolchainResult<Self> {
        let cache_dir = Self::get_cache_dir()?;
        fs::create_dir_all(&cache_dir)?;

        Ok(Self { cache_dir })
    }

    /// Creates a manager backed by an explicit cache directory
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn get_cache_dir() -> ToolchainResult<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "maravilla-labs", "brisk").ok_or_else(|| {
            ToolchainError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine cache directory",
            ))
        })?;

        Ok(proj_dirs.cache_dir().join("tools"))
    }

    /// Ensures esbuild is available, downloading it if necessary
    pub async fn ensure_esbuild(&self, version: &str) -> ToolchainResult<ToolPath> {
        let platform = Platform::current().ok_or_else(|| {
            ToolchainError::UnsupportedPlatform("Current platform is not supported".to_string())
        })?;

        if FAILED_DOWNLOADS.lock().iter().any(|v| v == version) {
            return Err(ToolchainError::DownloadFailed(
                "Previous download attempt failed, skipping retry".to_string(),
            ));
        }

        if let Some(tool_path) = self.find_cached(platform, version) {
            return Ok(tool_path);
        }

        let (version, path) =
            download::download_and_extract(platform, version, &self.cache_dir).await?;
        Ok(ToolPath { version, path })
    }

    /// Finds a cached esbuild if it exists
    pub fn find_cached(&self, platform: Platform, version: &str) -> Option<ToolPath> {
        let tool_dir = self.cache_dir.join(TOOL_NAME);

        let actual_version = if version == "latest" {
            let latest_link = tool_dir.join("latest");
            if !latest_link.is_symlink() {
                return None;
            }
            let target = fs::read_link(&latest_link).ok()?;
            target.file_name()?.to_string_lossy().to_string()
        } else {
            version.to_string()
        };

        let executable = tool_dir
            .join(&actual_version)
            .join(platform.executable_path());
        if !executable.exists() {
            return None;
        }

        Some(ToolPath {
            version: actual_version,
            path: executable,
        })
    }
}

/// Returns the esbuild binary to use for this project.
///
/// An explicit `esbuild_path` wins; otherwise the configured version is
/// taken from the cache or downloaded.
pub async fn resolve_esbuild(config: &ToolchainConfig, quiet: bool) -> ToolchainResult<PathBuf> {
    if let Some(path) = &config.esbuild_path {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(ToolchainError::BinaryNotFound(path));
        }
        tracing::debug!("Using configured esbuild at {}", path.display());
        return Ok(path);
    }

    let manager = ToolchainManager::new()?;
    let tool_path = manager.ensure_esbuild(&config.esbuild_version).await?;

    if !quiet {
        println!(
            "{} {} {}",
            style("✓").green(),
            style(TOOL_NAME).cyan(),
            style(format!("v{}", tool_path.version)).dim()
        );
    }

    Ok(tool_path.path)
}
