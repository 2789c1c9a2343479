use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "form_downloader=info";
const VERBOSE_FILTER: &str = "form_downloader=debug";

/// `RUST_LOG` wins when set; otherwise `verbose` picks between info and debug.
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }))
}

pub fn init_tracing(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
