// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Type definitions for the esbuild toolchain.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Name used for the cache directory, checksum file and log output.
pub const TOOL_NAME: &str = "esbuild";

/// Represents the target platform for binary downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux x86_64
    LinuxX64,
    /// Linux ARM64/AArch64
    LinuxArm64,
    /// macOS x86_64 (Intel)
    DarwinX64,
    /// macOS ARM64 (Apple Silicon)
    DarwinArm64,
    /// Windows x86_64
    WindowsX64,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Option<Self> {
        #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
        {
            Some(Platform::LinuxX64)
        }
        #[cfg(all(target_os = "linux", target_arch = "aarch64"))]
        {
            Some(Platform::LinuxArm64)
        }
        #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
        {
            Some(Platform::DarwinX64)
        }
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            Some(Platform::DarwinArm64)
        }
        #[cfg(all(target_os = "windows", target_arch = "x86_64"))]
        {
            Some(Platform::WindowsX64)
        }
        #[cfg(not(any(
            all(target_os = "linux", target_arch = "x86_64"),
            all(target_os = "linux", target_arch = "aarch64"),
            all(target_os = "macos", target_arch = "x86_64"),
            all(target_os = "macos", target_arch = "aarch64"),
            all(target_os = "windows", target_arch = "x86_64")
        )))]
        {
            None
        }
    }

    /// npm package carrying the esbuild binary for this platform.
    pub fn package_name(&self) -> String {
        let os = match self {
            Platform::LinuxX64 | Platform::LinuxArm64 => "linux",
            Platform::DarwinX64 | Platform::DarwinArm64 => "darwin",
            Platform::WindowsX64 => "win32",
        };

        let arch = match self {
            Platform::LinuxX64 | Platform::DarwinX64 | Platform::WindowsX64 => "x64",
            Platform::LinuxArm64 | Platform::DarwinArm64 => "arm64",
        };

        format!("@esbuild/{}-{}", os, arch)
    }

    /// Get the executable path inside the extracted package
    pub fn executable_path(&self) -> &'static str {
        match self {
            Platform::WindowsX64 => "package/esbuild.exe",
            _ => "package/bin/esbuild",
        }
    }
}

/// `[toolchain]` section of `brisk.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// esbuild version - specific version number or "latest"
    #[serde(default = "default_esbuild_version")]
    pub esbuild_version: String,

    /// Explicit esbuild binary; skips the download when set
    #[serde(default)]
    pub esbuild_path: Option<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            esbuild_version: default_esbuild_version(),
            esbuild_path: None,
        }
    }
}

fn default_esbuild_version() -> String {
    "latest".to_string()
}

/// Path to a cached esbuild executable.
#[derive(Debug, Clone)]
pub struct ToolPath {
    /// Version string.
    pub version: String,
    /// Path to the executable.
    pub path: PathBuf,
}

/// Errors related to toolchain operations
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The current platform is not supported by the toolchain
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// An error occurred during tool download
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// An error occurred while extracting a downloaded archive
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Failed to fetch the latest release information from the npm registry
    #[error("Failed to fetch release information: {0}")]
    ReleaseFetchFailed(String),

    /// A configured binary does not exist
    #[error("esbuild binary not found at {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// A tool execution failed (non-zero exit code or other error)
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    /// An I/O error occurred (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A network request error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing failed (registry responses, esbuild metafiles)
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for toolchain operations
pub type ToolchainResult<T> = Result<T, ToolchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_names() {
        assert_eq!(Platform::LinuxX64.package_name(), "@esbuild/linux-x64");
        assert_eq!(Platform::DarwinArm64.package_name(), "@esbuild/darwin-arm64");
        assert_eq!(Platform::WindowsX64.package_name(), "@esbuild/win32-x64");
    }

    #[test]
    fn test_executable_paths() {
        assert_eq!(Platform::LinuxArm64.executable_path(), "package/bin/esbuild");
        assert_eq!(Platform::WindowsX64.executable_path(), "package/esbuild.exe");
    }
}
