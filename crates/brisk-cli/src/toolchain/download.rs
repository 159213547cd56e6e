// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! esbuild downloading and extraction.

use super::types::{Platform, ToolchainError, ToolchainResult, TOOL_NAME};
use super::FAILED_DOWNLOADS;
use console::style;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time::sleep;

/// Maximum number of retry attempts for downloads
const MAX_RETRIES: u32 = 3;

/// Base delay in milliseconds for exponential backoff
const BASE_DELAY_MS: u64 = 500;

const REGISTRY: &str = "https://registry.npmjs.org";

const USER_AGENT: &str = "brisk-cli";

/// Download and extract esbuild for the specified platform and version.
///
/// Returns the resolved version and the executable path.
pub async fn download_and_extract(
    platform: Platform,
    version: &str,
    cache_dir: &Path,
) -> ToolchainResult<(String, PathBuf)> {
    let tool_dir = cache_dir.join(TOOL_NAME);
    fs::create_dir_all(&tool_dir)?;

    let actual_version = if version == "latest" {
        fetch_latest_version().await?
    } else {
        version.to_string()
    };

    let version_dir = tool_dir.join(&actual_version);
    fs::create_dir_all(&version_dir)?;

    let (download_path, checksum) =
        download_with_retry(platform, &actual_version, &version_dir).await?;

    let executable_path = extract_archive(platform, &download_path, &version_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if executable_path.exists() {
            let mut perms = fs::metadata(&executable_path)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&executable_path, perms)?;
        }
    }

    let checksum_file = version_dir.join(format!("{}.sha256", TOOL_NAME));
    fs::write(checksum_file, checksum)?;

    let latest_link = tool_dir.join("latest");
    if latest_link.is_symlink() {
        let _ = fs::remove_file(&latest_link);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::symlink;
        if version == "latest" {
            let _ = symlink(&actual_version, &latest_link);
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::symlink_dir;
        if version == "latest" {
            let _ = symlink_dir(&actual_version, &latest_link);
        }
    }

    Ok((actual_version, executable_path))
}

/// Fetch the latest esbuild version from the npm registry
async fn fetch_latest_version() -> ToolchainResult<String> {
    let resp = Client::new()
        .get(format!("{}/esbuild", REGISTRY))
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    latest_from_registry(&resp)
}

fn latest_from_registry(resp: &serde_json::Value) -> ToolchainResult<String> {
    resp["dist-tags"]["latest"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ToolchainError::ReleaseFetchFailed(
                "Failed to parse esbuild latest version from dist-tags".to_string(),
            )
        })
}

async fn tarball_url(client: &Client, platform: Platform, version: &str) -> ToolchainResult<String> {
    let pkg = platform.package_name();
    let pkg_info = client
        .get(format!("{}/{}/{}", REGISTRY, pkg, version))
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    pkg_info["dist"]["tarball"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ToolchainError::DownloadFailed(format!(
                "Failed to extract tarball URL from package metadata: {}",
                pkg
            ))
        })
}

/// Download the platform package with retry logic
async fn download_with_retry(
    platform: Platform,
    version: &str,
    version_dir: &Path,
) -> ToolchainResult<(PathBuf, String)> {
    let client = Client::new();
    let mut retries = 0;

    loop {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(bar_style.progress_chars("#>-"));
        }
        pb.set_message(format!(
            "Downloading {} v{}...",
            style(TOOL_NAME).cyan(),
            style(version).cyan()
        ));

        let result = async {
            let url = tarball_url(&client, platform, version).await?;
            let resp = client
                .get(&url)
                .header("User-Agent", USER_AGENT)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(ToolchainError::DownloadFailed(format!(
                    "HTTP error: {} when downloading from URL: {}",
                    status, url
                )));
            }

            pb.set_length(resp.content_length().unwrap_or(0));

            let download_path = version_dir.join(format!("{}.tar.gz", TOOL_NAME));
            let mut file = File::create(&download_path)?;
            let mut hasher = Sha256::new();

            let mut stream = resp.bytes_stream();
            let mut downloaded = 0;

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                downloaded += chunk.len() as u64;
                pb.set_position(downloaded);
                hasher.update(&chunk);
                file.write_all(&chunk)?;
            }

            pb.finish_with_message(format!(
                "Downloaded {} v{}",
                style(TOOL_NAME).green(),
                style(version).green()
            ));

            let hash = format!("{:x}", hasher.finalize());
            Ok::<_, ToolchainError>((download_path, hash))
        }
        .await;

        match result {
            Ok(res) => return Ok(res),
            Err(err) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    // Don't try again during this run
                    FAILED_DOWNLOADS.lock().push(version.to_string());
                    return Err(err);
                }

                let delay = BASE_DELAY_MS * 2_u64.pow(retries - 1);
                pb.finish_with_message(format!(
                    "Download failed, retrying in {}ms ({}/{})",
                    style(delay).yellow(),
                    style(retries).yellow(),
                    style(MAX_RETRIES).yellow()
                ));
                tracing::warn!("esbuild download attempt {} failed: {}", retries, err);

                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

fn extract_archive(
    platform: Platform,
    archive_path: &Path,
    extract_dir: &Path,
) -> ToolchainResult<PathBuf> {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner);
    }
    pb.set_message(format!("Extracting {}...", style(TOOL_NAME).cyan()));
    pb.enable_steady_tick(Duration::from_millis(100));

    match extract_tar_gz(archive_path, extract_dir) {
        Ok(()) => {
            pb.finish_with_message(format!("Extracted {}", style(TOOL_NAME).green()));
            let executable = extract_dir.join(platform.executable_path());
            if !executable.exists() {
                return Err(ToolchainError::ExtractionFailed(format!(
                    "{} missing from package",
                    platform.executable_path()
                )));
            }
            Ok(executable)
        }
        Err(err) => {
            pb.finish_with_message(format!(
                "Extraction failed: {}",
                style(err.to_string()).red()
            ));
            Err(err)
        }
    }
}

/// Extract a .tar.gz archive, then delete it
fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> ToolchainResult<()> {
    let file = File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(extract_dir)?;

    fs::remove_file(archive_path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    #[test]
    fn test_latest_from_registry() {
        let resp = serde_json::json!({ "dist-tags": { "latest": "0.24.0" } });
        assert_eq!(latest_from_registry(&resp).unwrap(), "0.24.0");

        let err = latest_from_registry(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolchainError::ReleaseFetchFailed(_)));
    }

    #[test]
    fn test_extract_package_layout() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("esbuild.tar.gz");

        let mut builder = tar::Builder::new(GzEncoder::new(
            File::create(&archive_path).unwrap(),
            Compression::default(),
        ));
        let body = b"#!/bin/sh\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "package/bin/esbuild", &body[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let exe = extract_archive(Platform::LinuxX64, &archive_path, dir.path()).unwrap();
        assert_eq!(exe, dir.path().join("package/bin/esbuild"));
        assert!(exe.exists());
        assert!(!archive_path.exists());
    }
}
