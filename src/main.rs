// ShaderPP
// Copyright (c) 2025 Harlen Batagelo
// https://github.com/hbatagelo/shaderpp
// SPDX-License-Identifier: GPL-3.0-or-later

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    simple_logger::SimpleLogger::new()
        .with_level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init()
        .unwrap();

    let config = match cli::parse_args() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::from(2);
        }
    };

    match cli::run(&config) {
        Ok(had_errors) => {
            if had_errors {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(2)
        }
    }
}
