// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! Constructs attached to replacement chunks.
//!
//! A closed set of variants: the source-mapping and outline layers only
//! ever need to distinguish these finite cases.

use super::span::Span;
use super::unit::PreprocessedUnit;

/// A macro invocation and its outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct MacroExpansion {
    /// Invoked macro name.
    pub name: String,
    /// Collected argument texts; empty for object-like invocations.
    pub args: Vec<String>,
    /// Final replacement text after substitution, pasting and re-scan.
    pub result: String,
}

/// What a replacement chunk stands for.
#[derive(Clone, Debug, PartialEq)]
pub struct Construct {
    /// Full input span of the directive or expansion.
    pub span: Span,
    /// Most semantically relevant sub-range, e.g. the identifier or the
    /// include path literal.
    pub main_span: Span,
    pub kind: ConstructKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstructKind {
    /// Malformed directive or line; the output is the line commented
    /// out.
    Problem,
    Expansion(MacroExpansion),
    Directive(DirectiveKind),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DirectiveKind {
    Include {
        /// Unescaped include path.
        path: String,
        /// Preprocessed content of the included file.
        unit: Box<PreprocessedUnit>,
    },
    Define {
        name: String,
    },
    Undef {
        name: String,
    },
    /// Balance-counted only; branch evaluation is not implemented.
    If,
    IfDef,
    IfNDef,
    Else,
    ElseIf,
    EndIf,
}
