//! Subscriber setup for binaries and tests.
//!
//! The library itself only emits `tracing` events; nothing here runs unless
//! the embedding application asks for it.

use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Filter used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_FILTER: &str = "appraiser=info";

/// Installs a formatted subscriber filtered by `RUST_LOG`.
///
/// Falls back to [`DEFAULT_FILTER`]. Safe to call more than once, and a
/// no-op if another global subscriber is already installed.
pub fn init_tracing() {
    init_tracing_with_filter(None);
}

/// Like [`init_tracing`] but with an explicit filter directive, e.g.
/// `"appraiser=debug"`. `None` reads `RUST_LOG`.
pub fn init_tracing_with_filter(directive: Option<&str>) {
    INIT.call_once(|| {
        let filter = match directive {
            Some(d) => EnvFilter::try_new(d).ok(),
            None => EnvFilter::try_from_default_env().ok(),
        }
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

        let installed = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .with(filter)
            .try_init();
        if installed.is_err() {
            tracing::debug!("global subscriber already set; keeping it");
        }
    });
}
