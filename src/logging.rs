use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "auto-ingress-operator.log";

/// Installs the global subscriber: console output always, plus a daily-rolling
/// file when `log_dir` is set. `RUST_LOG` overrides the default level.
///
/// The returned guard must be kept alive for the file writer to flush.
pub fn init_tracing(log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let console_layer = fmt::layer().with_target(true).with_level(true);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = non_blocking(rolling::daily(dir, LOG_FILE_NAME));
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
