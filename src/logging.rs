use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::{AppError, InitializationError, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const LOG_FILE_PREFIX: &str = "serial-interface.log";

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, InitializationError> {
    let mut env_filter = EnvFilter::default().add_directive(config.get_level_filter().into());

    // Byte-level traffic is logged at trace level by the port drivers
    if config.trace_bytes {
        for directive in ["serial_interface::port=trace", "serial_interface::channel=trace"] {
            let directive = directive.parse().map_err(|e| {
                InitializationError::logging(format!("Invalid filter directive {}: {}", directive, e))
            })?;
            env_filter = env_filter.add_directive(directive);
        }
    }

    Ok(env_filter)
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file sink on drop and must outlive logging.
pub fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, AppError> {
    config.validate()?;

    let timer = OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        time::format_description::well_known::Rfc3339,
    );

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(config.thread_ids)
        .with_thread_names(config.thread_names)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_level(true)
        .with_timer(timer.clone());

    if config.is_json() {
        layers.push(console.json().with_filter(build_filter(config)?).boxed());
    } else {
        layers.push(console.with_filter(build_filter(config)?).boxed());
    }

    let guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(config.thread_ids)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_timer(timer)
                .with_writer(writer);

            layers.push(file.with_filter(build_filter(config)?).boxed());
            Some(guard)
        }
        None => None,
    };

    Registry::default().with(layers).try_init().map_err(|e| {
        AppError::Init(InitializationError::logging(format!(
            "Failed to initialize logging: {}",
            e
        )))
    })?;

    Ok(guard)
}
