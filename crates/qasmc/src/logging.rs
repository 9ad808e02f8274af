//! Tracing setup for the `qasmc` binary
//!
//! ```bash
//! # everything the resolver does
//! QASMC_LOG=qasm_compiler::sema=trace qasmc program.qasm
//!
//! # RUST_LOG works too; QASMC_LOG wins when both are set
//! RUST_LOG=debug qasmc program.qasm
//! ```
//!
//! Without either variable the subscriber is only installed for `--verbose`,
//! which logs the library at debug level.

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "QASMC_LOG";
const VERBOSE_FILTER: &str = "qasm_compiler=debug";

fn build_filter(verbose: bool) -> Option<EnvFilter> {
    if let Ok(val) = std::env::var(LOG_ENV) {
        return Some(EnvFilter::builder().parse_lossy(val));
    }
    if std::env::var("RUST_LOG").is_ok() {
        return Some(EnvFilter::from_default_env());
    }
    verbose.then(|| EnvFilter::new(VERBOSE_FILTER))
}

/// Install the global subscriber. Output goes to stderr so dumps on stdout
/// stay clean.
pub fn init_tracing(verbose: bool) {
    let Some(filter) = build_filter(verbose) else {
        return;
    };
    // A second initialisation (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}
