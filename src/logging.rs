use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Diagnostic logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbosity`
/// (0 = warn, 1 = info, 2+ = debug). The user-facing progress text is
/// printed by [`crate::terminal::Console`] and is not affected.
pub fn init(verbosity: u8, use_color: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(use_color)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
