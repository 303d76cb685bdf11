use crate::config::Config;
use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::{
        EnvFilter,
        LevelFilter,
    },
    layer::SubscriberExt,
};

/// Try to setup a logger.
///
/// Logs go to the stderr and to daily log files in the log file dir.
/// The returned guard must be kept alive until logging is no longer needed.
pub fn setup(config: &Config) -> anyhow::Result<WorkerGuard> {
    tracing_log::LogTracer::init().context("failed to init log tracer")?;

    let file_appender = tracing_appender::rolling::daily(config.log_file_dir(), "rhelp.log");
    let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    for directive in config.log.directives.iter() {
        let directive = directive
            .parse()
            .with_context(|| format!("invalid log directive \"{directive}\""))?;
        env_filter = env_filter.add_directive(directive);
    }

    let stderr_formatting_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_formatting_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(file_formatting_layer)
        .with(stderr_formatting_layer);

    tracing::subscriber::set_global_default(subscriber).context("failed to set subscriber")?;

    Ok(worker_guard)
}
