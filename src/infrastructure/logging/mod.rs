// Logging module - Logging infrastructure
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Build the filter: `RUST_LOG` wins, otherwise `level` for this crate
/// (`debug` when verbose) and warnings for everything else.
pub fn build_filter(level: &str, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { level };
        EnvFilter::new(format!("warn,tartsmon={}", level))
    })
}

/// Initialize logging system.
///
/// Logs go to stderr so that event output on stdout stays machine readable.
pub fn init_logging(level: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(build_filter(level, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true)
                .with_thread_names(verbose)
                .with_file(false)
                .with_line_number(false)
        )
        .try_init()?;

    tracing::debug!("TartsMon logging system initialized");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init() {
        // A second initialization in the same process reports an error
        // instead of panicking
        let _ = init_logging("info", false);
        let second = init_logging("info", false);
        assert!(second.is_err());
    }

    #[test]
    fn test_build_filter() {
        let filter = build_filter("trace", false);
        assert!(!filter.to_string().is_empty());
    }
}
