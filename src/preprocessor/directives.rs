// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! Directive recognition and handling.
//!
//! A directive occupies one logical line: backslash-newline continues
//! it, comments inside it collapse to a single space, and strings may
//! span physical lines via continuation. Every directive is replaced in
//! the output — successful ones by a commented-out copy of themselves,
//! includes by the included file's preprocessed code, malformed ones by
//! a commented-out problem line plus a diagnostic.
//!
//! `#if`/`#ifdef`/`#ifndef`/`#else`/`#elif`/`#endif` are recognized only
//! enough to balance-check nesting; their evaluation is not implemented
//! and their contents always pass through.

use super::construct::{Construct, ConstructKind, DirectiveKind};
use super::diagnostic::{Diagnostic, DiagnosticId};
use super::macros::{MacroDef, MacroSite};
use super::scanner::{
    is_inline_space, is_line_break, Scanner, BACKSLASH, COMMA, LPAREN, QUOTE, RPAREN, SLASH,
    SPACE, STAR,
};
use super::span::Span;

/// A string token scanned inside a directive line.
struct DirectiveString {
    /// Logical token text including quotes, continuations spliced out.
    raw: String,
    /// Unescaped content between the quotes.
    content: String,
    closed: bool,
}

/// Prefixes every physical line of `text` with `//`, keeping the line
/// structure intact so continued directives stay fully inert.
pub(crate) fn comment_out(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    out.push_str("//");
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    out.push('\n');
                    chars.next();
                }
                out.push_str("//");
            }
            '\n' => out.push_str("//"),
            _ => {}
        }
    }
    out
}

impl Scanner<'_> {
    /// Scans one full directive line starting at `#`.
    pub(crate) fn scan_directive(&mut self) {
        let hash = self.pos;

        if self.line_has_code {
            self.pos += 1;
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                Span::new(hash, hash + 1),
                DiagnosticId::DirectivePos,
                "directives must start their own line",
            );
            return;
        }

        self.pos += 1;
        self.directive_skip_space();
        let keyword_span = self.read_word();
        let keyword = self.text(keyword_span);
        match keyword.as_str() {
            "include" => self.handle_include(hash),
            "define" => self.handle_define(hash, keyword_span),
            "undef" => self.handle_undef(hash, keyword_span),
            "if" => self.handle_conditional(hash, keyword_span, DirectiveKind::If, true),
            "ifdef" => self.handle_conditional(hash, keyword_span, DirectiveKind::IfDef, true),
            "ifndef" => self.handle_conditional(hash, keyword_span, DirectiveKind::IfNDef, true),
            "else" => self.handle_conditional(hash, keyword_span, DirectiveKind::Else, false),
            "elif" => self.handle_conditional(hash, keyword_span, DirectiveKind::ElseIf, false),
            "endif" => self.handle_endif(hash, keyword_span),
            _ => {
                self.directive_skip_rest();
                let main = if keyword_span.is_empty() {
                    Span::new(hash, hash + 1)
                } else {
                    keyword_span
                };
                self.problem(
                    Span::new(hash, self.pos),
                    main,
                    DiagnosticId::DirectiveMiss,
                    format!("unknown directive `#{keyword}`"),
                );
            }
        }
    }

    /// True at end of input or at an unescaped line break, i.e. at the
    /// end of the logical directive line.
    fn at_directive_end(&self) -> bool {
        match self.at(self.pos) {
            None => true,
            Some(unit) => is_line_break(unit),
        }
    }

    /// Skips separators inside a directive: inline whitespace,
    /// backslash-newline continuations and comments.
    fn directive_skip_space(&mut self) {
        loop {
            match self.at(self.pos) {
                Some(unit) if is_inline_space(unit) => self.pos += 1,
                Some(BACKSLASH) if self.line_break_len(self.pos + 1) > 0 => {
                    self.pos += 1;
                    self.skip_line_break();
                }
                Some(SLASH) if self.at(self.pos + 1) == Some(SLASH) => self.skip_line_comment(),
                Some(SLASH) if self.at(self.pos + 1) == Some(STAR) => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    /// Consumes the remainder of the logical directive line.
    fn directive_skip_rest(&mut self) {
        loop {
            match self.at(self.pos) {
                None => return,
                Some(unit) if is_line_break(unit) => return,
                Some(BACKSLASH) if self.line_break_len(self.pos + 1) > 0 => {
                    self.pos += 1;
                    self.skip_line_break();
                }
                Some(SLASH) if self.at(self.pos + 1) == Some(SLASH) => self.skip_line_comment(),
                Some(SLASH) if self.at(self.pos + 1) == Some(STAR) => self.skip_block_comment(),
                Some(QUOTE) => {
                    self.scan_directive_string();
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// String token inside a directive. Unlike ordinary code strings,
    /// backslash-newline continues the token across physical lines.
    fn scan_directive_string(&mut self) -> DirectiveString {
        let mut raw = vec![QUOTE];
        let mut content: Vec<u16> = Vec::new();
        self.pos += 1;
        while let Some(unit) = self.at(self.pos) {
            if unit == BACKSLASH {
                if self.line_break_len(self.pos + 1) > 0 {
                    self.pos += 1;
                    self.skip_line_break();
                    continue;
                }
                raw.push(unit);
                if let Some(escaped) = self.at(self.pos + 1) {
                    raw.push(escaped);
                    content.push(escaped);
                }
                self.pos = (self.pos + 2).min(self.units.len());
                continue;
            }
            if unit == QUOTE {
                raw.push(unit);
                self.pos += 1;
                return DirectiveString {
                    raw: String::from_utf16_lossy(&raw),
                    content: String::from_utf16_lossy(&content),
                    closed: true,
                };
            }
            if is_line_break(unit) {
                break;
            }
            raw.push(unit);
            content.push(unit);
            self.pos += 1;
        }
        DirectiveString {
            raw: String::from_utf16_lossy(&raw),
            content: String::from_utf16_lossy(&content),
            closed: false,
        }
    }

    /// Collects the remaining logical line as a macro body:
    /// continuations spliced, comments collapsed to one space, strings
    /// kept whole, surrounding whitespace trimmed.
    fn directive_read_body(&mut self) -> String {
        let mut body: Vec<u16> = Vec::new();
        loop {
            match self.at(self.pos) {
                None => break,
                Some(unit) if is_line_break(unit) => break,
                Some(BACKSLASH) if self.line_break_len(self.pos + 1) > 0 => {
                    self.pos += 1;
                    self.skip_line_break();
                }
                Some(SLASH) if self.at(self.pos + 1) == Some(SLASH) => {
                    self.skip_line_comment();
                    body.push(SPACE);
                }
                Some(SLASH) if self.at(self.pos + 1) == Some(STAR) => {
                    self.skip_block_comment();
                    body.push(SPACE);
                }
                Some(QUOTE) => {
                    let string = self.scan_directive_string();
                    body.extend(string.raw.encode_utf16());
                }
                Some(unit) => {
                    body.push(unit);
                    self.pos += 1;
                }
            }
        }
        String::from_utf16_lossy(&body).trim().to_string()
    }

    /// Emits the diagnostic and a commented-out problem chunk covering
    /// `span`.
    fn problem(
        &mut self,
        span: Span,
        main: Span,
        id: DiagnosticId,
        message: impl Into<String>,
    ) {
        let message: String = message.into();
        log::warn!("{}: {message}", self.file.uri);
        self.diagnose(id, message, main);
        let code = comment_out(&self.text(span));
        self.replace(
            span,
            code,
            Construct {
                span,
                main_span: main,
                kind: ConstructKind::Problem,
            },
        );
    }

    fn handle_include(&mut self, hash: usize) {
        self.directive_skip_space();
        if self.at(self.pos) != Some(QUOTE) {
            self.directive_skip_rest();
            let span = Span::new(hash, self.pos);
            self.problem(
                span,
                span,
                DiagnosticId::IncludeForm,
                "#include expects a quoted path",
            );
            return;
        }

        let literal_start = self.pos;
        let string = self.scan_directive_string();
        let literal_span = Span::new(literal_start, self.pos);
        if !string.closed {
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                literal_span,
                DiagnosticId::IncludeForm,
                "unterminated include path",
            );
            return;
        }

        self.directive_skip_space();
        if !self.at_directive_end() {
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                literal_span,
                DiagnosticId::IncludeForm,
                "unexpected tokens after the include path",
            );
            return;
        }

        let span = Span::new(hash, self.pos);
        let path = string.content;
        if self.includes_left == 0 {
            self.problem(
                span,
                literal_span,
                DiagnosticId::IncludeDeep,
                format!("include depth limit reached at \"{path}\""),
            );
            return;
        }

        let loaded = match self.loader.load(&path, &self.file.uri) {
            Ok(loaded) => loaded,
            Err(err) => {
                self.problem(
                    span,
                    literal_span,
                    DiagnosticId::IncludePath,
                    format!("cannot include \"{path}\": {err}"),
                );
                return;
            }
        };

        log::debug!("including \"{path}\" from \"{}\"", self.file.uri);
        let sub = Scanner::new(loaded, &mut *self.macros, &mut *self.loader, self.includes_left - 1)
            .run();

        for diagnostic in &sub.diagnostics {
            self.diagnostics.push(Diagnostic {
                id: diagnostic.id,
                message: format!("from included file \"{path}\""),
                uri: self.file.uri.clone(),
                span: literal_span,
                cause: Some(Box::new(diagnostic.clone())),
            });
        }

        let code = sub.code.clone();
        let construct = Construct {
            span,
            main_span: literal_span,
            kind: ConstructKind::Directive(DirectiveKind::Include {
                path,
                unit: Box::new(sub),
            }),
        };
        self.replace(span, code, construct);
    }

    fn handle_define(&mut self, hash: usize, keyword_span: Span) {
        self.directive_skip_space();
        let name_span = self.read_word();
        if name_span.is_empty() {
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                keyword_span,
                DiagnosticId::DefineWho,
                "#define expects a macro name",
            );
            return;
        }
        let name = self.text(name_span);
        if name == "defined" {
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                name_span,
                DiagnosticId::DefinedMisnomer,
                "`defined` cannot be used as a macro name",
            );
            return;
        }

        // A parameter list only counts when the paren touches the name.
        let params = if self.at(self.pos) == Some(LPAREN) {
            match self.read_param_list() {
                Some(list) => Some(list),
                None => {
                    self.directive_skip_rest();
                    self.problem(
                        Span::new(hash, self.pos),
                        name_span,
                        DiagnosticId::DefineParams,
                        format!("malformed parameter list for macro `{name}`"),
                    );
                    return;
                }
            }
        } else {
            let touchy = match self.at(self.pos) {
                None => false,
                Some(unit) if is_inline_space(unit) || is_line_break(unit) => false,
                Some(BACKSLASH) if self.line_break_len(self.pos + 1) > 0 => false,
                Some(SLASH)
                    if matches!(self.at(self.pos + 1), Some(next) if next == SLASH || next == STAR) =>
                {
                    false
                }
                Some(_) => true,
            };
            if touchy {
                self.directive_skip_rest();
                self.problem(
                    Span::new(hash, self.pos),
                    name_span,
                    DiagnosticId::DefineTouchy,
                    format!("macro name `{name}` must be separated from its body"),
                );
                return;
            }
            None
        };

        let body = self.directive_read_body();
        let span = Span::new(hash, self.pos);

        if let Some(previous) = self.macros.get(&name) {
            let cause = match &previous.site {
                Some(site) => Diagnostic::new(
                    DiagnosticId::Info,
                    "previously defined here",
                    site.uri.clone(),
                    site.span,
                ),
                None => Diagnostic::new(
                    DiagnosticId::Info,
                    format!("`{name}` was defined externally"),
                    self.file.uri.clone(),
                    name_span,
                ),
            };
            self.diagnostics.push(Diagnostic {
                id: DiagnosticId::DefineClash,
                message: format!("macro `{name}` redefined"),
                uri: self.file.uri.clone(),
                span: name_span,
                cause: Some(Box::new(cause)),
            });
        }

        self.macros.define(
            name.clone(),
            MacroDef {
                params,
                body,
                site: Some(MacroSite {
                    uri: self.file.uri.clone(),
                    span: name_span,
                }),
            },
        );

        let code = comment_out(&self.text(span));
        self.replace(
            span,
            code,
            Construct {
                span,
                main_span: name_span,
                kind: ConstructKind::Directive(DirectiveKind::Define { name }),
            },
        );
    }

    /// Parses `(a, b, c)` after a macro name; the empty list is valid.
    fn read_param_list(&mut self) -> Option<Vec<String>> {
        self.pos += 1;
        let mut params = Vec::new();
        self.directive_skip_space();
        if self.at(self.pos) == Some(RPAREN) {
            self.pos += 1;
            return Some(params);
        }
        loop {
            self.directive_skip_space();
            let span = self.read_word();
            if span.is_empty() {
                return None;
            }
            params.push(self.text(span));
            self.directive_skip_space();
            match self.at(self.pos) {
                Some(COMMA) => self.pos += 1,
                Some(RPAREN) => {
                    self.pos += 1;
                    return Some(params);
                }
                _ => return None,
            }
        }
    }

    fn handle_undef(&mut self, hash: usize, keyword_span: Span) {
        self.directive_skip_space();
        let name_span = self.read_word();
        if name_span.is_empty() {
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                keyword_span,
                DiagnosticId::UndefWho,
                "#undef expects a macro name",
            );
            return;
        }
        let name = self.text(name_span);
        if name == "defined" {
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                name_span,
                DiagnosticId::DefinedMisnomer,
                "`defined` cannot be used as a macro name",
            );
            return;
        }

        self.directive_skip_space();
        if !self.at_directive_end() {
            let extra_start = self.pos;
            self.directive_skip_rest();
            self.problem(
                Span::new(hash, self.pos),
                Span::new(extra_start, self.pos),
                DiagnosticId::UndefExtra,
                format!("unexpected tokens after `#undef {name}`"),
            );
            return;
        }

        self.macros.undefine(&name);
        let span = Span::new(hash, self.pos);
        let code = comment_out(&self.text(span));
        self.replace(
            span,
            code,
            Construct {
                span,
                main_span: name_span,
                kind: ConstructKind::Directive(DirectiveKind::Undef { name }),
            },
        );
    }

    /// `#if`/`#ifdef`/`#ifndef`/`#else`/`#elif` stub: counts nesting for
    /// balance checking, comments the line out and lets the surrounding
    /// code pass through unconditionally.
    fn handle_conditional(
        &mut self,
        hash: usize,
        keyword_span: Span,
        kind: DirectiveKind,
        opens_block: bool,
    ) {
        if opens_block {
            self.conditional_depth += 1;
        }
        self.directive_skip_rest();
        let span = Span::new(hash, self.pos);
        let keyword = self.text(keyword_span);
        self.diagnose(
            DiagnosticId::Info,
            format!("`#{keyword}` is not evaluated; its contents always pass through"),
            keyword_span,
        );
        let code = comment_out(&self.text(span));
        self.replace(
            span,
            code,
            Construct {
                span,
                main_span: keyword_span,
                kind: ConstructKind::Directive(kind),
            },
        );
    }

    fn handle_endif(&mut self, hash: usize, keyword_span: Span) {
        self.directive_skip_rest();
        let span = Span::new(hash, self.pos);
        if self.conditional_depth == 0 {
            self.problem(
                span,
                keyword_span,
                DiagnosticId::EndifUnmatched,
                "#endif without a matching #if",
            );
            return;
        }
        self.conditional_depth -= 1;
        self.diagnose(
            DiagnosticId::Info,
            "`#endif` closes a conditional that is not evaluated",
            keyword_span,
        );
        let code = comment_out(&self.text(span));
        self.replace(
            span,
            code,
            Construct {
                span,
                main_span: keyword_span,
                kind: ConstructKind::Directive(DirectiveKind::EndIf),
            },
        );
    }
}
