// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! esbuild-backed syntax transform.

use brisk::{Loader, Transform, TransformError};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Pipes one source file at a time through `esbuild` on stdin.
///
/// Output is ESM with the automatic JSX runtime.
#[derive(Debug, Clone)]
pub struct EsbuildTransform {
    binary: PathBuf,
}

impl EsbuildTransform {
    /// Wraps the esbuild binary at `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments passed for a given loader.
    pub fn args(loader: Loader) -> Vec<String> {
        vec![
            format!("--loader={}", loader.as_str()),
            "--format=esm".to_string(),
            "--jsx=automatic".to_string(),
            "--log-level=error".to_string(),
        ]
    }
}

impl Transform for EsbuildTransform {
    fn transform(&self, source: &str, loader: Loader) -> Result<String, TransformError> {
        let mut child = Command::new(&self.binary)
            .args(Self::args(loader))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TransformError::new(format!("failed to run {}: {}", self.binary.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransformError::new("esbuild stdin unavailable"))?;
        let input = source.to_string();
        // Written from a separate thread so a full stdout pipe cannot stall us.
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| TransformError::new(format!("esbuild did not finish: {}", e)))?;

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(TransformError::new(format!("failed to write to esbuild: {}", e)))
            }
            Err(_) => return Err(TransformError::new("esbuild writer thread panicked")),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransformError::new(stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| TransformError::new(format!("esbuild emitted invalid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_per_loader() {
        assert_eq!(EsbuildTransform::args(Loader::Tsx)[0], "--loader=tsx");
        assert!(EsbuildTransform::args(Loader::Jsx).contains(&"--jsx=automatic".to_string()));
        assert!(EsbuildTransform::args(Loader::Ts).contains(&"--format=esm".to_string()));
    }

    #[test]
    fn test_missing_binary_is_a_transform_error() {
        let transform = EsbuildTransform::new("/definitely/not/here/esbuild");
        let err = transform.transform("const a = 1;", Loader::Ts).unwrap_err();
        assert!(err.message.contains("failed to run"));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipes_through_binary() {
        use std::os::unix::fs::PermissionsExt;

        // A stand-in "esbuild" that echoes stdin back.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("esbuild");
        std::fs::write(&script, "#!/bin/sh\ncat\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let transform = EsbuildTransform::new(&script);
        assert_eq!(
            transform.transform("export const x = 1;", Loader::Jsx).unwrap(),
            "export const x = 1;"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("esbuild");
        std::fs::write(&script, "#!/bin/sh\ncat >/dev/null\necho 'Unexpected \"<\"' >&2\nexit 1\n")
            .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = EsbuildTransform::new(&script)
            .transform("<div", Loader::Jsx)
            .unwrap_err();
        assert_eq!(err.message, "Unexpected \"<\"");
    }
}
