use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::AppEnv;

/// Initialize the logging system with daily-rotated file output plus
/// a console layer.
pub fn init_logging(
    env: &AppEnv,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&env.logs_path)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("portals")
        .filename_suffix("log")
        .build(&env.logs_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Fallback to UTC when the local offset cannot be determined.
    let timer = OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
        OffsetTime::new(
            time::UtcOffset::UTC,
            time::format_description::well_known::Rfc3339,
        )
    });

    let subscriber = tracing_subscriber::registry()
        // File layer with full details
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_timer(timer.clone())
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        // Console layer for development
        .with(
            fmt::layer()
                .with_timer(timer)
                .with_target(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    subscriber.init();

    tracing::info!("Logging initialized, files under {:?}", env.logs_path);

    Ok(guard)
}

pub fn log_shutdown() {
    tracing::info!("=== Portals dashboard shutdown complete ===");
}
