// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! The character-level scanner and macro expansion driver.
//!
//! A single forward pass over the input's UTF-16 code units. Most text
//! flows through untouched and is flushed as verbatim chunks; directives
//! and macro invocations interrupt the flow and emit replacement chunks
//! in their place. Directive handling itself lives in `directives`.

use super::construct::{Construct, ConstructKind, MacroExpansion};
use super::diagnostic::{Diagnostic, DiagnosticId};
use super::loader::IncludeLoader;
use super::macros::{apply_token_paste, substitute_params, MacroDef, MacroTable};
use super::span::Span;
use super::unit::{Chunk, PreprocessedUnit, Replacement, SourceFile};

pub(crate) const HASH: u16 = b'#' as u16;
pub(crate) const QUOTE: u16 = b'"' as u16;
pub(crate) const SLASH: u16 = b'/' as u16;
pub(crate) const STAR: u16 = b'*' as u16;
pub(crate) const BACKSLASH: u16 = b'\\' as u16;
pub(crate) const LPAREN: u16 = b'(' as u16;
pub(crate) const RPAREN: u16 = b')' as u16;
pub(crate) const COMMA: u16 = b',' as u16;
pub(crate) const SPACE: u16 = b' ' as u16;

pub(crate) fn is_word_start(unit: u16) -> bool {
    matches!(unit, 0x41..=0x5A | 0x61..=0x7A) || unit == b'_' as u16
}

pub(crate) fn is_word(unit: u16) -> bool {
    is_word_start(unit) || (0x30..=0x39).contains(&unit)
}

pub(crate) fn is_line_break(unit: u16) -> bool {
    unit == 0x0A || unit == 0x0D
}

/// Horizontal whitespace; line breaks are tracked separately.
pub(crate) fn is_inline_space(unit: u16) -> bool {
    unit == SPACE || unit == 0x09 || unit == 0x0B || unit == 0x0C
}

pub(crate) struct Scanner<'a> {
    pub(crate) file: SourceFile,
    pub(crate) units: Vec<u16>,
    pub(crate) pos: usize,
    /// Non-comment, non-whitespace content seen on the current line;
    /// gates the directive-position check.
    pub(crate) line_has_code: bool,
    /// Open `#if`/`#ifdef`/`#ifndef` blocks awaiting their `#endif`.
    pub(crate) conditional_depth: usize,
    /// Input offset where the pending verbatim run began.
    pub(crate) chunk_start: usize,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) macros: &'a mut MacroTable,
    pub(crate) loader: &'a mut dyn IncludeLoader,
    /// Remaining permitted levels of nested `#include`.
    pub(crate) includes_left: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(
        file: SourceFile,
        macros: &'a mut MacroTable,
        loader: &'a mut dyn IncludeLoader,
        include_depth: usize,
    ) -> Self {
        let units = file.code.encode_utf16().collect();
        Self {
            file,
            units,
            pos: 0,
            line_has_code: false,
            conditional_depth: 0,
            chunk_start: 0,
            chunks: Vec::new(),
            diagnostics: Vec::new(),
            macros,
            loader,
            includes_left: include_depth,
        }
    }

    pub(crate) fn run(mut self) -> PreprocessedUnit {
        while let Some(unit) = self.at(self.pos) {
            let next = self.at(self.pos + 1);
            if unit == SLASH && next == Some(SLASH) {
                self.skip_line_comment();
            } else if unit == SLASH && next == Some(STAR) {
                self.skip_block_comment();
            } else if unit == HASH {
                self.scan_directive();
            } else if unit == QUOTE {
                self.line_has_code = true;
                self.scan_string();
            } else if is_word_start(unit) {
                self.line_has_code = true;
                self.scan_identifier();
            } else if is_line_break(unit) {
                self.skip_line_break();
                self.line_has_code = false;
            } else {
                if !is_inline_space(unit) {
                    self.line_has_code = true;
                }
                self.pos += 1;
            }
        }

        if self.conditional_depth > 0 {
            let end = self.units.len();
            self.diagnose(
                DiagnosticId::EndifMissing,
                format!(
                    "{} conditional block(s) missing #endif at end of input",
                    self.conditional_depth
                ),
                Span::new(end, end),
            );
        }

        self.flush_verbatim(self.pos);
        PreprocessedUnit::new(self.file, self.chunks, self.diagnostics)
    }

    pub(crate) fn at(&self, index: usize) -> Option<u16> {
        self.units.get(index).copied()
    }

    /// Length of the line-break sequence at `index`; 0 when not at one.
    /// `\r\n` is a single two-unit break.
    pub(crate) fn line_break_len(&self, index: usize) -> usize {
        match self.at(index) {
            Some(0x0D) => {
                if self.at(index + 1) == Some(0x0A) {
                    2
                } else {
                    1
                }
            }
            Some(0x0A) => 1,
            _ => 0,
        }
    }

    pub(crate) fn skip_line_break(&mut self) {
        self.pos += self.line_break_len(self.pos);
    }

    pub(crate) fn text(&self, span: Span) -> String {
        String::from_utf16_lossy(&self.units[span.start..span.end])
    }

    pub(crate) fn diagnose(&mut self, id: DiagnosticId, message: impl Into<String>, span: Span) {
        self.diagnostics
            .push(Diagnostic::new(id, message, self.file.uri.clone(), span));
    }

    /// Flushes pending verbatim input up to `upto` as a pass-through
    /// chunk.
    pub(crate) fn flush_verbatim(&mut self, upto: usize) {
        if upto > self.chunk_start {
            let span = Span::new(self.chunk_start, upto);
            self.chunks.push(Chunk {
                input: self.text(span),
                input_span: span,
                replacement: None,
            });
            self.chunk_start = upto;
        }
    }

    /// Emits a replacement chunk covering `span`.
    pub(crate) fn replace(&mut self, span: Span, code: String, construct: Construct) {
        self.flush_verbatim(span.start);
        self.chunks.push(Chunk {
            input: self.text(span),
            input_span: span,
            replacement: Some(Replacement { code, construct }),
        });
        self.chunk_start = span.end;
    }

    /// `//` comment: skipped to the line end, left verbatim in the
    /// output.
    pub(crate) fn skip_line_comment(&mut self) {
        self.pos += 2;
        while let Some(unit) = self.at(self.pos) {
            if is_line_break(unit) {
                break;
            }
            self.pos += 1;
        }
    }

    /// `/* */` comment, possibly spanning lines. The text stays in place
    /// for ordinary code; directive and argument contexts collapse it to
    /// a space at their call sites.
    pub(crate) fn skip_block_comment(&mut self) {
        let start = self.pos;
        self.pos += 2;
        loop {
            match self.at(self.pos) {
                None => {
                    self.diagnose(
                        DiagnosticId::EndComment,
                        "unterminated block comment",
                        Span::new(start, self.pos),
                    );
                    break;
                }
                Some(STAR) if self.at(self.pos + 1) == Some(SLASH) => {
                    self.pos += 2;
                    break;
                }
                Some(unit) if is_line_break(unit) => self.skip_line_break(),
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Atomic single-line string. A backslash immediately before a line
    /// terminator ends the string at that backslash (consuming it); a
    /// raw line break ends it without being consumed. Returns whether
    /// the closing quote was found.
    pub(crate) fn scan_string(&mut self) -> bool {
        self.pos += 1;
        while let Some(unit) = self.at(self.pos) {
            if unit == BACKSLASH {
                if self.line_break_len(self.pos + 1) > 0 {
                    self.pos += 1;
                    return false;
                }
                self.pos = (self.pos + 2).min(self.units.len());
                continue;
            }
            if unit == QUOTE {
                self.pos += 1;
                return true;
            }
            if is_line_break(unit) {
                return false;
            }
            self.pos += 1;
        }
        false
    }

    /// Full run of word characters starting at the cursor. Empty when
    /// the cursor is not at a word character.
    pub(crate) fn read_word(&mut self) -> Span {
        let start = self.pos;
        while let Some(unit) = self.at(self.pos) {
            if is_word(unit) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Span::new(start, self.pos)
    }

    /// Identifier in ordinary code: expansion candidate.
    fn scan_identifier(&mut self) {
        let name_span = self.read_word();
        let name = self.text(name_span);
        let Some(def) = self.macros.get(&name) else {
            return;
        };
        let def = def.clone();

        let Some(params) = def.params.clone() else {
            self.expand(name_span, name_span, &name, &def, Vec::new());
            return;
        };

        // Function-like: only a `(` turns the identifier into a call.
        let rewind = self.pos;
        let Some(args) = self.collect_args(name_span) else {
            self.pos = rewind;
            return;
        };

        let call_span = Span::new(name_span.start, self.pos);
        if args.len() != params.len() {
            self.diagnose(
                DiagnosticId::ExpansionArity,
                format!(
                    "macro `{name}` expects {} argument(s), got {}",
                    params.len(),
                    args.len()
                ),
                name_span,
            );
            // Degrade to the bare name; the call syntax is dropped.
            let construct = Construct {
                span: call_span,
                main_span: name_span,
                kind: ConstructKind::Expansion(MacroExpansion {
                    name: name.clone(),
                    args,
                    result: name.clone(),
                }),
            };
            self.replace(call_span, name, construct);
            return;
        }

        self.expand(call_span, name_span, &name, &def, args);
    }

    /// Walks to the call's opening paren and collects arguments until
    /// the matching close. Returns `None` when the identifier turns out
    /// not to be a call, or when the call never terminates.
    fn collect_args(&mut self, name_span: Span) -> Option<Vec<String>> {
        loop {
            match self.at(self.pos) {
                Some(unit) if is_inline_space(unit) => self.pos += 1,
                Some(unit) if is_line_break(unit) => self.skip_line_break(),
                Some(SLASH) if self.at(self.pos + 1) == Some(SLASH) => self.skip_line_comment(),
                Some(SLASH) if self.at(self.pos + 1) == Some(STAR) => self.skip_block_comment(),
                Some(LPAREN) => break,
                _ => return None,
            }
        }
        self.pos += 1;

        let mut depth = 1usize;
        let mut args: Vec<Vec<u16>> = vec![Vec::new()];
        loop {
            let Some(unit) = self.at(self.pos) else {
                self.diagnose(
                    DiagnosticId::EndExpansion,
                    format!(
                        "end of input inside the argument list of macro `{}`",
                        self.text(name_span)
                    ),
                    Span::new(name_span.start, self.pos),
                );
                return None;
            };

            if unit == QUOTE {
                let start = self.pos;
                let closed = self.scan_string();
                let text = Span::new(start, self.pos);
                args.last_mut().unwrap().extend(&self.units[text.start..text.end]);
                if !closed {
                    // A broken string cancels the call; the identifier
                    // stays a plain occurrence.
                    return None;
                }
            } else if unit == SLASH && self.at(self.pos + 1) == Some(SLASH) {
                self.skip_line_comment();
                args.last_mut().unwrap().push(SPACE);
            } else if unit == SLASH && self.at(self.pos + 1) == Some(STAR) {
                self.skip_block_comment();
                args.last_mut().unwrap().push(SPACE);
            } else if unit == LPAREN {
                depth += 1;
                args.last_mut().unwrap().push(unit);
                self.pos += 1;
            } else if unit == RPAREN {
                depth -= 1;
                self.pos += 1;
                if depth == 0 {
                    break;
                }
                args.last_mut().unwrap().push(unit);
            } else if unit == COMMA && depth == 1 {
                args.push(Vec::new());
                self.pos += 1;
            } else if is_line_break(unit) {
                args.last_mut().unwrap().push(0x0A);
                self.skip_line_break();
            } else {
                args.last_mut().unwrap().push(unit);
                self.pos += 1;
            }
        }

        let args: Vec<String> = args
            .iter()
            .map(|raw| String::from_utf16_lossy(raw).trim().to_string())
            .collect();
        // A single all-whitespace argument is an empty call.
        if args.len() == 1 && args[0].is_empty() {
            return Some(Vec::new());
        }
        Some(args)
    }

    /// Substitutes, pastes, pads and recursively re-scans an expansion,
    /// then emits the replacement chunk.
    fn expand(
        &mut self,
        call_span: Span,
        name_span: Span,
        name: &str,
        def: &MacroDef,
        args: Vec<String>,
    ) {
        let params = def.params.as_deref().unwrap_or(&[]);
        let substituted = substitute_params(&def.body, params, &args);
        let pasted = apply_token_paste(&substituted);
        // Padding keeps the result from fusing with adjacent tokens.
        let padded = format!(" {pasted} ");

        // Re-scan with a per-expansion table copy minus this macro, so a
        // self-referential body expands exactly one level.
        let mut reduced = self.macros.without(name);
        let sub = Scanner::new(
            SourceFile::new(self.file.uri.clone(), padded),
            &mut reduced,
            &mut *self.loader,
            self.includes_left,
        )
        .run();

        for diagnostic in &sub.diagnostics {
            self.diagnostics.push(Diagnostic {
                id: diagnostic.id,
                message: format!("in expansion of macro `{name}`"),
                uri: self.file.uri.clone(),
                span: name_span,
                cause: Some(Box::new(diagnostic.clone())),
            });
        }

        log::debug!("expanded macro `{name}` to {:?}", sub.code);
        self.diagnose(
            DiagnosticId::Info,
            format!("macro `{name}` expanded to `{}`", sub.code),
            name_span,
        );

        let result = sub.code;
        let construct = Construct {
            span: call_span,
            main_span: name_span,
            kind: ConstructKind::Expansion(MacroExpansion {
                name: name.to_string(),
                args,
                result: result.clone(),
            }),
        };
        self.replace(call_span, result, construct);
    }
}
