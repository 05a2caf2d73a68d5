use crate::config::settings::{LogFormat, LoggingSettings};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Verbose: debug to stdout and to the log file. Otherwise: errors to stdout only.
pub fn init_cli_logger(verbose: bool, logging: &LoggingSettings) -> std::io::Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("pitcher_rating=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };

    let file_layer = if verbose {
        Some(file_layer(logging)?)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .with(file_layer)
        .init();

    tracing::info!("initialized logger for pitcher_rating");
    Ok(())
}

fn file_layer<S>(logging: &LoggingSettings) -> std::io::Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fs::create_dir_all(&logging.directory)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(&logging.directory).join(&logging.file_name))?;

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file));

    Ok(match logging.format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    })
}
