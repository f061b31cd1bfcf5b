use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_cli_logger(verbose: bool) {
    init_cli_logger_with_level(verbose, None);
}

/// `RUST_LOG` wins; otherwise `verbose` beats the configured crate level.
pub fn init_cli_logger_with_level(verbose: bool, level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, level)));

    tracing_subscriber::registry()
        .with(filter)
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

fn default_directive(verbose: bool, level: Option<&str>) -> String {
    match (verbose, level.map(str::trim).filter(|l| !l.is_empty())) {
        (true, _) => "synth_data=debug,info".to_string(),
        (false, Some(level)) => format!("synth_data={},info", level.to_lowercase()),
        (false, None) => "synth_data=info".to_string(),
    }
}

pub fn init_lambda_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("synth_data=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .json(), // CloudWatch parses JSON lines
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, None), "synth_data=info");
        assert_eq!(default_directive(false, Some("WARN")), "synth_data=warn,info");
        assert_eq!(default_directive(false, Some(" ")), "synth_data=info");
        assert_eq!(default_directive(true, Some("warn")), "synth_data=debug,info");
    }
}
