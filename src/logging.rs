use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup logging.
///
/// Logs go to stderr so stdout only carries the command output. By default only our crate logs
/// at the info level, `--debug` raises it to debug.
///
/// The level can be overridden with the `QOVERY_LOG` environment variable. When `QOVERY_LOG_ALL`
/// is set, logs of all crates are shown at that level.
pub fn setup_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let log_level = std::env::var("QOVERY_LOG").unwrap_or_else(|_| default_level.to_string());
    let show_all_logs = std::env::var("QOVERY_LOG_ALL").is_ok();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::new(filter(&log_level, show_all_logs)))
        .init();
}

fn filter(log_level: &str, show_all_logs: bool) -> String {
    if show_all_logs {
        log_level.to_string()
    } else {
        format!("qovery={log_level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_only_our_crate() {
        assert_eq!(filter("debug", false), "qovery=debug");
    }

    #[test]
    fn test_filter_all_crates() {
        assert_eq!(filter("warn", true), "warn");
    }
}
