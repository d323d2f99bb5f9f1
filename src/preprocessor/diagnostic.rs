// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! Preprocessing diagnostics.
//!
//! Diagnostics are ordinary data, not error values: every malformed
//! construct is recovered locally and scanning always runs to completion.
//! A diagnostic raised inside an included file or an expansion body is
//! re-reported on the parent with the original attached as its `cause`,
//! so one entry can be followed back through nested includes to where it
//! actually originated.

use serde::{Serialize, Serializer};

use super::span::Span;

/// Identifies a class of preprocessing problem.
///
/// [`DiagnosticId::Info`] is the empty id used for informational entries
/// such as expansion records; everything else is an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticId {
    /// Unterminated block comment at end of input.
    EndComment,
    /// End of input while collecting macro call arguments.
    EndExpansion,
    /// Macro call argument count does not match the definition.
    ExpansionArity,
    /// Directive not at the start of its line.
    DirectivePos,
    /// Unknown directive keyword.
    DirectiveMiss,
    /// `defined` used as a macro name.
    DefinedMisnomer,
    /// Malformed `#include` path.
    IncludeForm,
    /// Include nesting depth exhausted.
    IncludeDeep,
    /// Include loader failed to resolve the path.
    IncludePath,
    /// `#define` without a macro name.
    DefineWho,
    /// Redefinition of an existing macro.
    DefineClash,
    /// Malformed macro parameter list.
    DefineParams,
    /// Macro name not separated from its body.
    DefineTouchy,
    /// `#undef` without a macro name.
    UndefWho,
    /// Trailing tokens after the `#undef` name.
    UndefExtra,
    /// `#endif` without an open conditional.
    EndifUnmatched,
    /// Conditional block still open at end of input.
    EndifMissing,
    /// Informational entry; carries the empty id code.
    Info,
}

impl DiagnosticId {
    /// Stable wire code of this id; empty for informational entries.
    pub fn code(self) -> &'static str {
        match self {
            Self::EndComment => "PEndComment",
            Self::EndExpansion => "PEndExpansion",
            Self::ExpansionArity => "PExpansionArity",
            Self::DirectivePos => "PDirectivePos",
            Self::DirectiveMiss => "PDirectiveMiss",
            Self::DefinedMisnomer => "PDefinedMisnomer",
            Self::IncludeForm => "PIncludeForm",
            Self::IncludeDeep => "PIncludeDeep",
            Self::IncludePath => "PIncludePath",
            Self::DefineWho => "PDefineWho",
            Self::DefineClash => "PDefineClash",
            Self::DefineParams => "PDefineParams",
            Self::DefineTouchy => "PDefineTouchy",
            Self::UndefWho => "PUndefWho",
            Self::UndefExtra => "PUndefExtra",
            Self::EndifUnmatched => "PEndifUnmatched",
            Self::EndifMissing => "PEndifMissing",
            Self::Info => "",
        }
    }

    /// Whether this id reports an actual problem.
    pub fn is_error(self) -> bool {
        self != Self::Info
    }
}

impl Serialize for DiagnosticId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A single preprocessing diagnostic.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub message: String,
    /// Uri of the file the `span` indexes; empty for embedded code.
    pub uri: String,
    /// Range within that file's input code, in UTF-16 code units.
    pub span: Span,
    /// Nested diagnostic this one was propagated from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<Diagnostic>>,
}

impl Diagnostic {
    pub(crate) fn new(
        id: DiagnosticId,
        message: impl Into<String>,
        uri: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            uri: uri.into(),
            span,
            cause: None,
        }
    }

    /// Innermost diagnostic of the cause chain.
    pub fn origin(&self) -> &Diagnostic {
        let mut diagnostic = self;
        while let Some(cause) = diagnostic.cause.as_deref() {
            diagnostic = cause;
        }
        diagnostic
    }
}
