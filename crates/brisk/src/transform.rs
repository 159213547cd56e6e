// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Syntax transform seam.
//!
//! brisk does not parse JSX or TypeScript itself. The compiler hands each
//! transformable source to a [`Transform`] implementation (the CLI ships one
//! backed by esbuild) and writes whatever comes back as plain JavaScript.

use thiserror::Error;

/// Source dialect of a file handed to a [`Transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loader {
    /// JavaScript with JSX.
    Jsx,
    /// TypeScript with JSX.
    Tsx,
    /// TypeScript.
    Ts,
}

impl Loader {
    /// Picks a loader from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jsx" => Some(Loader::Jsx),
            "tsx" => Some(Loader::Tsx),
            "ts" => Some(Loader::Ts),
            _ => None,
        }
    }

    /// Returns the loader name as external toolchains spell it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Jsx => "jsx",
            Loader::Tsx => "tsx",
            Loader::Ts => "ts",
        }
    }
}

/// Failure reported by a transform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    /// Human-readable diagnostic from the toolchain.
    pub message: String,
}

impl TransformError {
    /// Creates a transform error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns one source file into browser-runnable JavaScript.
///
/// Implementations are called from blocking worker threads and must be
/// shareable across them.
pub trait Transform: Send + Sync {
    /// Transforms `source` written in the `loader` dialect.
    fn transform(&self, source: &str, loader: Loader) -> Result<String, TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&str, Loader) -> Result<String, TransformError> + Send + Sync,
{
    fn transform(&self, source: &str, loader: Loader) -> Result<String, TransformError> {
        self(source, loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_from_extension() {
        assert_eq!(Loader::from_extension("jsx"), Some(Loader::Jsx));
        assert_eq!(Loader::from_extension("tsx"), Some(Loader::Tsx));
        assert_eq!(Loader::from_extension("ts"), Some(Loader::Ts));
        assert_eq!(Loader::from_extension("js"), None);
        assert_eq!(Loader::from_extension("css"), None);
    }

    #[test]
    fn test_closure_transform() {
        let upper = |source: &str, _: Loader| Ok::<_, TransformError>(source.to_uppercase());
        assert_eq!(upper.transform("abc", Loader::Jsx).unwrap(), "ABC");
    }
}
