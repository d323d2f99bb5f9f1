// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command-line interface of the shaderpp host tool.
//!
//! Hosts the preprocessor the way an editor integration would: reads a
//! shader source file, preprocesses it with a filesystem-backed include
//! loader, and reports diagnostics either colorized per line/column or
//! as a JSON document.
//!
//! The preprocessed code goes to stdout and human-readable diagnostics
//! to stderr; `--json` replaces both with a JSON diagnostics report on
//! stdout.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use clap::{Arg, ArgAction, Command};
use owo_colors::OwoColorize;
use thiserror::Error;

use shaderpp::preprocessor::{
    preprocess_with, Diagnostic, IncludeError, IncludeLoader, MacroDef, MacroTable,
    PreprocessedUnit, SourceFile, DEFAULT_INCLUDE_DEPTH,
};
use shaderpp::{APP_ABOUT, APP_AUTHOR, APP_NAME, APP_SEMVER};

/// Errors that may occur during CLI parsing or preprocessing setup.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON report error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Runtime configuration chosen at startup.
#[derive(Debug)]
pub struct CliConfig {
    /// Shader source file to preprocess.
    pub input: PathBuf,

    /// Macros seeded before preprocessing, as `(name, body)` pairs.
    pub defines: Vec<(String, String)>,

    /// Report diagnostics as JSON instead of human-readable text.
    pub json: bool,

    /// Suppress the preprocessed output.
    pub no_output: bool,

    /// Maximum nested include depth.
    pub include_depth: usize,
}

/// Parses command-line arguments.
pub fn parse_args() -> Result<CliConfig, CliError> {
    let matches = Command::new(APP_NAME)
        .author(APP_AUTHOR)
        .version(APP_SEMVER)
        .about(APP_ABOUT)
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .required(true)
                .help("Shader source file to preprocess")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .value_name("NAME[=VALUE]")
                .action(ArgAction::Append)
                .help("Seed an object-like macro before preprocessing"),
        )
        .arg(
            Arg::new("include-depth")
                .long("include-depth")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Maximum nested include depth"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Report diagnostics as JSON on stdout"),
        )
        .arg(
            Arg::new("no-output")
                .long("no-output")
                .action(ArgAction::SetTrue)
                .help("Suppress the preprocessed output, report diagnostics only"),
        )
        .get_matches();

    let input = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .ok_or_else(|| CliError::InvalidInput("missing input file".into()))?;

    let mut defines = Vec::new();
    if let Some(values) = matches.get_many::<String>("define") {
        for value in values {
            defines.push(parse_define(value)?);
        }
    }

    Ok(CliConfig {
        input,
        defines,
        json: matches.get_flag("json"),
        no_output: matches.get_flag("no-output"),
        include_depth: matches
            .get_one::<usize>("include-depth")
            .copied()
            .unwrap_or(DEFAULT_INCLUDE_DEPTH),
    })
}

/// Splits `NAME[=VALUE]` into a seeded macro; a bare name defines `1`.
fn parse_define(value: &str) -> Result<(String, String), CliError> {
    let (name, body) = match value.split_once('=') {
        Some((name, body)) => (name, body),
        None => (value, "1"),
    };
    let valid = !name.is_empty()
        && name
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if !valid {
        return Err(CliError::InvalidInput(format!(
            "`{name}` is not a valid macro name"
        )));
    }
    Ok((name.to_string(), body.to_string()))
}

/// Preprocesses the input file and reports the result.
///
/// Returns whether the diagnostics contained actual errors.
pub fn run(config: &CliConfig) -> Result<bool, CliError> {
    let code = fs::read_to_string(&config.input)?;
    let uri = config.input.display().to_string();

    let mut macros = MacroTable::new();
    for (name, body) in &config.defines {
        macros.define(name.clone(), MacroDef::object(body.clone()));
    }

    let mut loader = FsLoader {
        root: env::current_dir()?,
    };

    let unit = preprocess_with(
        SourceFile::new(uri, code),
        &mut macros,
        &mut loader,
        config.include_depth,
    );

    if config.json {
        println!("{}", serde_json::to_string_pretty(&unit.diagnostics)?);
    } else {
        for diagnostic in &unit.diagnostics {
            print_diagnostic(&unit, diagnostic);
        }
        if !config.no_output {
            print!("{}", unit.code);
        }
    }

    Ok(unit.diagnostics.iter().any(|d| d.id.is_error()))
}

fn print_diagnostic(unit: &PreprocessedUnit, diagnostic: &Diagnostic) {
    let position = unit.input_position_at(diagnostic.span.start);
    let label = if diagnostic.id.is_error() {
        format!("error[{}]", diagnostic.id.code())
            .red()
            .bold()
            .to_string()
    } else {
        "note".dimmed().to_string()
    };
    eprintln!(
        "{label} {}:{}:{}: {}",
        diagnostic.uri.bold(),
        position.line,
        position.column,
        diagnostic.message
    );

    let mut cause = diagnostic.cause.as_deref();
    while let Some(inner) = cause {
        eprintln!("  {} {}", "caused by:".dimmed(), inner.message);
        cause = inner.cause.as_deref();
    }
}

/// Filesystem-backed include loader.
///
/// Resolves paths relative to the including file's directory first, then
/// the project root the tool was started in.
struct FsLoader {
    root: PathBuf,
}

impl IncludeLoader for FsLoader {
    fn load(&mut self, path: &str, from_uri: &str) -> Result<SourceFile, IncludeError> {
        let mut candidates = Vec::new();
        if !from_uri.is_empty() {
            if let Some(parent) = Path::new(from_uri).parent() {
                candidates.push(parent.join(path));
            }
        }
        candidates.push(self.root.join(path));

        for candidate in candidates {
            if candidate.is_file() {
                let code = fs::read_to_string(&candidate)
                    .map_err(|err| IncludeError::Message(format!("{}: {err}", candidate.display())))?;
                return Ok(SourceFile::new(candidate.display().to_string(), code));
            }
        }
        Err(IncludeError::NotFound(path.to_string()))
    }
}
