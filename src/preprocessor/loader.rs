// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! The include-loading seam.
//!
//! The core performs no I/O of its own: every `#include` path is handed
//! to a host-supplied [`IncludeLoader`]. A loader failure is reported as
//! a per-directive diagnostic and never aborts the scan.

use std::collections::HashMap;

use thiserror::Error;

use super::unit::SourceFile;

/// Why an include could not be loaded.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IncludeError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Message(String),
}

/// Resolves `#include` paths to source files.
///
/// Hosts must resolve project-root-relative paths and, for files with a
/// non-empty uri, paths relative to the including file.
pub trait IncludeLoader {
    fn load(&mut self, path: &str, from_uri: &str) -> Result<SourceFile, IncludeError>;
}

/// Refuses every include. For embedded snippets that must not reach
/// the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLoader;

impl IncludeLoader for NullLoader {
    fn load(&mut self, path: &str, _from_uri: &str) -> Result<SourceFile, IncludeError> {
        Err(IncludeError::NotFound(path.to_string()))
    }
}

/// Serves includes from an in-memory path → code map.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, code: impl Into<String>) {
        self.files.insert(path.into(), code.into());
    }
}

impl IncludeLoader for MemoryLoader {
    fn load(&mut self, path: &str, _from_uri: &str) -> Result<SourceFile, IncludeError> {
        self.files
            .get(path)
            .map(|code| SourceFile::new(path, code.clone()))
            .ok_or_else(|| IncludeError::NotFound(path.to_string()))
    }
}
