// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! Preprocessed units: the chunk list, the joined output, and the
//! recursive source mapping from output offsets back to the input.
//!
//! Chunks partition the input contiguously and in order; concatenating
//! each chunk's output yields the full preprocessed code. That exact,
//! gap-free coverage is the load-bearing invariant of the whole mapping
//! structure. Offset resolution is a linear scan over the chunk list,
//! which is fine at shader-file sizes.

use super::construct::{Construct, ConstructKind, DirectiveKind};
use super::diagnostic::Diagnostic;
use super::span::{line_starts, utf16_len, Position, Span};

/// An input document for preprocessing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceFile {
    /// Empty for code embedded directly in a host document.
    pub uri: String,
    pub code: String,
}

impl SourceFile {
    pub fn new(uri: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            code: code.into(),
        }
    }

    /// Embedded snippet without a backing file.
    pub fn embedded(code: impl Into<String>) -> Self {
        Self::new(String::new(), code)
    }
}

/// Replacement text for a chunk, plus the construct that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Replacement {
    pub code: String,
    pub construct: Construct,
}

/// A contiguous slice of input code paired with its output text.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    /// Verbatim input slice covered by this chunk.
    pub input: String,
    /// Span of `input` within the unit's source code.
    pub input_span: Span,
    /// Substituted output; the chunk passes through verbatim when
    /// absent.
    pub replacement: Option<Replacement>,
}

impl Chunk {
    /// Output text this chunk contributes.
    pub fn output(&self) -> &str {
        self.replacement
            .as_ref()
            .map_or(self.input.as_str(), |replacement| replacement.code.as_str())
    }
}

/// Result of resolving an output offset back to the input.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedLocation<'a> {
    /// Unit whose input the offset resolved into.
    pub unit: &'a PreprocessedUnit,
    /// Offset into the unit's input code.
    pub input_offset: usize,
    /// Length of the mapped input range; 0 for point mappings inside
    /// verbatim chunks.
    pub input_length: usize,
    /// Index of the owning chunk in the unit's chunk list.
    pub chunk_index: usize,
    /// Replacement owning the offset, when the chunk is not verbatim.
    pub replacement: Option<&'a Replacement>,
    /// Deeper mapping when the owning chunk is an `#include`; walking
    /// this chain recovers the full include stack.
    pub original: Option<Box<MappedLocation<'a>>>,
}

/// One preprocessed file: chunks, diagnostics and the joined output.
#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessedUnit {
    pub file: SourceFile,
    pub chunks: Vec<Chunk>,
    pub diagnostics: Vec<Diagnostic>,
    /// Fully preprocessed output code.
    pub code: String,
    input_line_starts: Vec<usize>,
    output_line_starts: Vec<usize>,
}

impl PreprocessedUnit {
    pub(crate) fn new(
        file: SourceFile,
        chunks: Vec<Chunk>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let code: String = chunks.iter().map(Chunk::output).collect();
        let input_line_starts = line_starts(&file.code);
        let output_line_starts = line_starts(&code);
        Self {
            file,
            chunks,
            diagnostics,
            code,
            input_line_starts,
            output_line_starts,
        }
    }

    /// Output offset of a 1-based line and 0-based column, clamped to
    /// the output length.
    pub fn output_offset_at(&self, line: usize, column: usize) -> usize {
        let index = line
            .saturating_sub(1)
            .min(self.output_line_starts.len() - 1);
        (self.output_line_starts[index] + column).min(utf16_len(&self.code))
    }

    /// Line/column of an offset into the input code.
    pub fn input_position_at(&self, offset: usize) -> Position {
        let index = self.input_line_starts.partition_point(|&start| start <= offset) - 1;
        Position {
            line: index + 1,
            column: offset - self.input_line_starts[index],
        }
    }

    /// Resolves an offset in the preprocessed output back to the input
    /// location it came from.
    ///
    /// Offsets inside a verbatim chunk map to the exact input offset.
    /// Offsets inside a replacement map to the construct's main range,
    /// e.g. the macro name at the call site. For `#include` replacements
    /// the mapping recurses into the included unit and the deeper result
    /// is attached as `original`.
    ///
    /// Returns `None` when the offset lies past the end of the output.
    pub fn sourcemap(&self, output_offset: usize) -> Option<MappedLocation<'_>> {
        let mut out_pos = 0;
        for (index, chunk) in self.chunks.iter().enumerate() {
            let out_len = utf16_len(chunk.output());
            if output_offset < out_pos + out_len {
                let delta = output_offset - out_pos;
                return Some(self.map_within(index, chunk, delta));
            }
            out_pos += out_len;
        }
        None
    }

    fn map_within<'a>(
        &'a self,
        chunk_index: usize,
        chunk: &'a Chunk,
        delta: usize,
    ) -> MappedLocation<'a> {
        match &chunk.replacement {
            None => MappedLocation {
                unit: self,
                input_offset: chunk.input_span.start + delta,
                input_length: 0,
                chunk_index,
                replacement: None,
                original: None,
            },
            Some(replacement) => {
                let main = replacement.construct.main_span;
                let original = match &replacement.construct.kind {
                    ConstructKind::Directive(DirectiveKind::Include { unit, .. }) => {
                        unit.sourcemap(delta).map(Box::new)
                    }
                    _ => None,
                };
                MappedLocation {
                    unit: self,
                    input_offset: main.start,
                    input_length: main.len(),
                    chunk_index,
                    replacement: Some(replacement),
                    original,
                }
            }
        }
    }
}
