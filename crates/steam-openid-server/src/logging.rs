//! Installs the global [`tracing`] subscriber.

use std::{env, fs, io};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, Rotation};
use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::LoggingConfig;

#[derive(Debug, Display, Error)]
pub enum InitLoggingError {
    #[display("invalid filter directives: {_0}")]
    Filter(ParseError),

    #[display("failed to create log directory: {_0}")]
    CreateLogDir(io::Error),

    #[display("failed to open log file: {_0}")]
    OpenLogFile(rolling::InitError),

    #[display("{_0}")]
    SetGlobalDefault(TryInitError),
}

/// Logs to stderr, and to files in [`LoggingConfig::log_dir`] if set.
///
/// `RUST_LOG` takes precedence over [`LoggingConfig::filter`]. The returned guard flushes the
/// log files when dropped, so it has to be held until the server exits.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, InitLoggingError> {
    let directives = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| config.filter.clone());
    let env_filter = EnvFilter::try_new(directives).map_err(InitLoggingError::Filter)?;

    let stderr = tracing_subscriber::fmt::layer()
        .with_ansi(config.ansi)
        .with_writer(io::stderr);

    let (files, guard) = match config.log_dir {
        None => (None, None),
        Some(ref log_dir) => {
            fs::create_dir_all(log_dir).map_err(InitLoggingError::CreateLogDir)?;

            let (writer, guard) = rolling::Builder::new()
                .rotation(Rotation::DAILY)
                .filename_prefix("steam-openid")
                .filename_suffix("log")
                .build(log_dir)
                .map(tracing_appender::non_blocking)
                .map_err(InitLoggingError::OpenLogFile)?;

            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(writer);

            (Some(layer), Some(guard))
        },
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr)
        .with(files)
        .try_init()
        .map_err(InitLoggingError::SetGlobalDefault)?;

    Ok(guard)
}
