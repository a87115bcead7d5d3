use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logging switches exposed by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOpts {
    /// Lower the default level from `info` to `debug`.
    pub verbose: bool,

    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

/// Initialize logging to stdout.
///
/// Defaults to `info` (or `debug` when verbose) unless overridden by `TRMAKER_LOG`.
pub fn init(opts: LogOpts) {
    let default_level = if opts.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_env_var("TRMAKER_LOG")
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if opts.json {
        registry
            .with(fmt.json().with_current_span(true).with_span_list(true))
            .try_init()
    } else {
        registry.with(fmt).try_init()
    };
}
