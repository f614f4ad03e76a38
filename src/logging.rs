use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. `RUST_LOG` wins when set; otherwise the
/// verbosity flag picks the default level for this crate's targets.
pub fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "browserd=info",
        1 => "browserd=debug",
        _ => "browserd=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
