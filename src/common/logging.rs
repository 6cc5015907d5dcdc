//! Logging and tracing configuration
//!
//! Logs go to stderr so reports on stdout stay machine-parseable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a `-v` count
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "peerattr=warn",
        1 => "peerattr=info,warn",
        2 => "peerattr=debug,warn",
        _ => "peerattr=trace,info",
    }
}

/// Initialize tracing for the CLI (stderr logging)
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbosity`.
pub fn init_cli(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_level() {
        assert_eq!(default_directive(0), "peerattr=warn");
        assert!(default_directive(2).starts_with("peerattr=debug"));
        assert_eq!(default_directive(9), default_directive(3));
    }
}
