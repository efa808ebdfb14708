use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
}

fn default_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "swapi_rank=debug,info"
    } else {
        "swapi_rank=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logger(verbose: bool, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(default_filter(verbose));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let installed = match format {
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init(),
        LogFormat::Json => registry.with(fmt_layer.json()).try_init(),
    };

    if let Err(e) = installed {
        eprintln!("logger already initialised: {}", e);
    }
}
