//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the per-target filter directives.
pub const LOG_ENV_VAR: &str = "MDTD_LOG";

const DEFAULT_FILTER: &str = "mdtd=info";

/// Initialize the MDTD tracing system.
///
/// Reads `MDTD_LOG` for per-subsystem log levels, for example
/// `MDTD_LOG=mdtd_analysis::parsers=debug,mdtd_analysis=info`.
/// Falls back to `mdtd=info` if `MDTD_LOG` is not set or is invalid.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        install(filter);
    });
}

/// Initialize tracing with explicit directives; `MDTD_LOG` still wins when set.
pub fn init_tracing_with_filter(directives: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_new(directives))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        install(filter);
    });
}

fn install(filter: EnvFilter) {
    // Logs go to stderr so JSON on stdout stays machine-readable.
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();
}
