// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! Source-mapped shader preprocessor.
//!
//! Expands `#define`/`#undef`/`#include` directives and object- and
//! function-like macros into a flat output stream while keeping an
//! exact, recursively-resolvable mapping from every output offset back
//! to the original (possibly multi-file) source.
//!
//! Responsibilities:
//! - Scan shader source a UTF-16 code unit at a time, preserving
//!   everything that is not a directive or macro invocation
//! - Expand macros with argument collection, arity checking, token
//!   pasting and self-exclusion guarded recursion
//! - Recurse into includes through a host-supplied [`IncludeLoader`],
//!   sharing one mutable [`MacroTable`] across the whole call tree
//! - Accumulate recoverable [`Diagnostic`]s instead of failing; the
//!   scan always runs to completion
//! - Expose chunk-exact source mapping on the resulting
//!   [`PreprocessedUnit`]
//!
//! Conditional compilation directives are balance-checked but not
//! evaluated; their contents always pass through.
//!
//! The main entry points are [`preprocess`] and [`preprocess_with`].

#[cfg(test)]
mod tests {
    mod directives;
    mod include;
    mod macros;
    mod scanner;
    mod sourcemap;
}
mod construct;
mod diagnostic;
mod directives;
mod loader;
mod macros;
mod scanner;
mod span;
mod unit;

pub use construct::{Construct, ConstructKind, DirectiveKind, MacroExpansion};
pub use diagnostic::{Diagnostic, DiagnosticId};
pub use loader::{IncludeError, IncludeLoader, MemoryLoader, NullLoader};
pub use macros::{MacroDef, MacroSite, MacroTable};
pub use span::{Position, Span};
pub use unit::{Chunk, MappedLocation, PreprocessedUnit, Replacement, SourceFile};

/// Default number of nested `#include` levels before the engine refuses
/// to recurse further.
pub const DEFAULT_INCLUDE_DEPTH: usize = 25;

/// Preprocesses `file` with an empty macro table and the default include
/// depth.
pub fn preprocess(file: SourceFile, loader: &mut dyn IncludeLoader) -> PreprocessedUnit {
    let mut macros = MacroTable::new();
    preprocess_with(file, &mut macros, loader, DEFAULT_INCLUDE_DEPTH)
}

/// Preprocesses `file` with a caller-provided macro table and include
/// depth limit.
///
/// The table is shared by reference across the whole include tree:
/// definitions made anywhere are visible to all code scanned afterward,
/// and whatever the table holds when the call returns is what textual
/// inclusion left behind.
pub fn preprocess_with(
    file: SourceFile,
    macros: &mut MacroTable,
    loader: &mut dyn IncludeLoader,
    include_depth: usize,
) -> PreprocessedUnit {
    scanner::Scanner::new(file, macros, loader, include_depth).run()
}
