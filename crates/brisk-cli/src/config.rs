// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Brisk project configuration.
//!
//! Configuration is loaded from `brisk.toml` at the project root. Every
//! section and every field is optional; missing values fall back to the
//! defaults below one field at a time.
//!
//! # Example Configuration
//!
//! ```toml
//! [meta]
//! title = "My App"
//! theme_color = "#10b981"
//!
//! [app_shell]
//! loading = true
//! loading_text = "Loading..."
//!
//! [dev]
//! port = 3000
//! host = "127.0.0.1"
//!
//! [paths]
//! src_dir = "src"
//! out_dir = ".brisk/compiled"
//! entry = "src/main.jsx"
//!
//! [toolchain]
//! esbuild_version = "latest"
//! ```

use crate::toolchain::ToolchainConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up at the project root.
pub const CONFIG_FILE: &str = "brisk.toml";

/// Main configuration structure loaded from `brisk.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Document metadata for the HTML shell.
    #[serde(default)]
    pub meta: MetaConfig,
    /// Loading placeholder shown before the app mounts.
    #[serde(default)]
    pub app_shell: AppShellConfig,
    /// Development server settings.
    #[serde(default)]
    pub dev: DevConfig,
    /// Project layout.
    #[serde(default)]
    pub paths: PathsConfig,
    /// esbuild binary selection.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Document metadata rendered into `<head>`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaConfig {
    /// Document title.
    #[serde(default = "default_title")]
    pub title: String,
    /// `<meta name="description">` content.
    #[serde(default = "default_description")]
    pub description: String,
    /// `<meta name="keywords">` content; omitted when empty.
    #[serde(default)]
    pub keywords: String,
    /// `<meta name="author">` content; omitted when empty.
    #[serde(default)]
    pub author: String,
    /// `<meta name="theme-color">` content.
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    /// `<html lang>` attribute.
    #[serde(default = "default_lang")]
    pub lang: String,
}

/// Placeholder rendered inside the mount node.
#[derive(Debug, Clone, Deserialize)]
pub struct AppShellConfig {
    /// Whether to render the loading placeholder at all.
    #[serde(default = "default_true")]
    pub loading: bool,
    /// Text of the loading placeholder.
    #[serde(default = "default_loading_text")]
    pub loading_text: String,
    /// Page background color.
    #[serde(default = "default_background_color")]
    pub background_color: String,
}

/// Development server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DevConfig {
    /// Server port (default: 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Server host (default: "127.0.0.1").
    #[serde(default = "default_host")]
    pub host: String,
}

/// Project layout, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Source root (default: "src").
    #[serde(default = "default_src_dir")]
    pub src_dir: String,
    /// Compiled output root (default: ".brisk/compiled").
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    /// Static assets served under `/public` (default: "public").
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    /// Production build output (default: "dist").
    #[serde(default = "default_dist_dir")]
    pub dist_dir: String,
    /// Bundle entry point (default: "src/main.jsx").
    #[serde(default = "default_entry")]
    pub entry: String,
}

fn default_title() -> String {
    "Brisk App".to_string()
}

fn default_description() -> String {
    "Built with Brisk".to_string()
}

fn default_theme_color() -> String {
    "#10b981".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

fn default_loading_text() -> String {
    "Loading...".to_string()
}

fn default_background_color() -> String {
    "#ffffff".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_src_dir() -> String {
    brisk::compiler::SRC_DIR.to_string()
}

fn default_out_dir() -> String {
    brisk::compiler::OUT_DIR.to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_dist_dir() -> String {
    "dist".to_string()
}

fn default_entry() -> String {
    "src/main.jsx".to_string()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
            keywords: String::new(),
            author: String::new(),
            theme_color: default_theme_color(),
            lang: default_lang(),
        }
    }
}

impl Default for AppShellConfig {
    fn default() -> Self {
        Self {
            loading: true,
            loading_text: default_loading_text(),
            background_color: default_background_color(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            out_dir: default_out_dir(),
            public_dir: default_public_dir(),
            dist_dir: default_dist_dir(),
            entry: default_entry(),
        }
    }
}

impl Config {
    /// Loads configuration from `brisk.toml` under `root`.
    ///
    /// If no configuration file exists, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load_from(root: &Path) -> anyhow::Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            tracing::debug!("No {} found, using defaults", CONFIG_FILE);
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", config_path.display(), e))?;
        tracing::info!("Loaded {}", CONFIG_FILE);
        Ok(config)
    }
}

impl PathsConfig {
    /// Absolute source root.
    pub fn src_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.src_dir)
    }

    /// Absolute compiled output root.
    pub fn out_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.out_dir)
    }

    /// Absolute public assets directory.
    pub fn public_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.public_dir)
    }

    /// Absolute production output directory.
    pub fn dist_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.dist_dir)
    }

    /// Absolute bundle entry point.
    pub fn entry(&self, root: &Path) -> PathBuf {
        root.join(&self.entry)
    }
}
