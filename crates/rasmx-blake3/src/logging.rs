//! Logging setup for hosts that do not install their own subscriber.
//!
//! The engine itself only emits `tracing` events; nothing is printed unless
//! a subscriber is installed, either by the host or by [`init_logger`].

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info` when `RUST_LOG` is unset or invalid. Returns
/// `false` if a global subscriber was already installed.
pub fn init_logger() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter)
}

/// Install a formatting subscriber with an explicit filter directive,
/// e.g. `"debug"` or `"rasmx_blake3=trace"`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logger_with(directive: &str) -> bool {
    install(EnvFilter::new(directive))
}

fn install(filter: EnvFilter) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "rasmx-blake3 logging initialized");
    }
    installed
}
