//! Log output for the binaries. The library only emits `tracing` events.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV_VAR: &str = "CODON_OPTIMIZER_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

static INIT: Once = Once::new();

/// Installs a stderr subscriber filtered by `CODON_OPTIMIZER_LOG`, e.g.
/// `CODON_OPTIMIZER_LOG=codon_optimizer::resolver=debug`. Falls back to `warn`.
///
/// Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    install(filter);
}

/// Like [`init_tracing`] with an explicit filter directive, as used by `--verbose`.
pub fn init_tracing_with_filter(directives: &str) {
    let filter =
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    install(filter);
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        // Another subscriber may already be installed by an embedding application
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init();
    });
}
