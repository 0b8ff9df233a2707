use tracing_subscriber::EnvFilter;

/// Initializes structured logging.
///
/// Verbosity comes from `RUST_LOG` (for example `RUST_LOG=shopdesk=debug`) and
/// defaults to `warn`. Output goes to stderr so CSV written to stdout stays
/// machine readable.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
