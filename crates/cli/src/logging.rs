// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup

use crate::config::Config;
use crate::error::TallyError;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Install the global subscriber.
///
/// Logs go to stderr unless `log_file` is set. The returned guard flushes
/// the file writer on drop and must outlive every log call.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, TallyError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let Some(log_file) = &config.log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| {
        TallyError::new(format!("Cannot create log directory '{}'", dir.display())).with_source(e)
    })?;
    let file_name = log_file.file_name().ok_or_else(|| {
        TallyError::new(format!("Log file '{}' has no file name", log_file.display()))
            .with_suggestion("Set log_file to a file path in tally.toml")
    })?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(Some(guard))
}
