// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! Source-mapped shader preprocessor for editor tooling.
//!
//! The [`preprocessor`] module expands `#define`/`#undef`/`#include`
//! directives and macros in shader source while keeping an exact map
//! from every output offset back to the original files, so downstream
//! parsers and editor providers can place diagnostics and navigation
//! targets precisely.

pub mod preprocessor;

pub const APP_NAME: &str = "shaderpp";
pub const APP_ABOUT: &str = "Source-mapped shader preprocessor for editor tooling";
pub const APP_AUTHOR: &str = "Harlen Batagelo, hbatagelo@gmail.com";
pub const APP_SEMVER: &str = "1.0.0";
