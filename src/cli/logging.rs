// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tracing setup for the command-line tool

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directive for a `-v` count; `RUST_LOG` takes precedence when set
pub fn filter_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "windtunnel=info",
        2 => "windtunnel=debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber. Nothing is installed when `quiet`.
pub fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(filter_directive(verbose)).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}
