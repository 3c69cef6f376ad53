use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// 執行檔的 target 是 issue_tokens / audit_instances，不在 trustkit 底下
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "trustkit=debug,issue_tokens=debug,audit_instances=debug,info"
    } else {
        "trustkit=info,issue_tokens=info,audit_instances=info"
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON lines, for runs whose output is collected by a log shipper.
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

pub fn init(verbose: bool, json: bool) {
    if json {
        init_json_logger(verbose);
    } else {
        init_cli_logger(verbose);
    }
}


#[cfg(test)]
mod tests {
    use super::capture::LogBuffer;
    use super::*;

    fn emit_sample_events() {
        tracing::error!(target: "issue_tokens", "tokens-bin-error");
        tracing::info!(target: "audit_instances", "audit-bin-info");
        tracing::info!(target: "trustkit::adapters::http", "lib-info");
        tracing::debug!(target: "trustkit::adapters::http", "lib-debug");
        tracing::debug!(target: "issue_tokens", "tokens-bin-debug");
        tracing::info!(target: "httpmock", "foreign-info");
    }

    #[test]
    fn test_default_filter_keeps_binary_targets() {
        let logs = LogBuffer::default();
        tracing::subscriber::with_default(
            logs.subscriber(EnvFilter::new(default_directives(false))),
            emit_sample_events,
        );

        let output = logs.contents();
        assert!(output.contains("tokens-bin-error"));
        assert!(output.contains("audit-bin-info"));
        assert!(output.contains("lib-info"));
        assert!(!output.contains("lib-debug"));
        assert!(!output.contains("tokens-bin-debug"));
        assert!(!output.contains("foreign-info"));
    }

    #[test]
    fn test_verbose_filter_enables_debug() {
        let logs = LogBuffer::default();
        tracing::subscriber::with_default(
            logs.subscriber(EnvFilter::new(default_directives(true))),
            emit_sample_events,
        );

        let output = logs.contents();
        assert!(output.contains("lib-debug"));
        assert!(output.contains("tokens-bin-debug"));
        assert!(output.contains("foreign-info"));
    }
}
