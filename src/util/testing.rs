//! Test logging: one tracing subscriber per test binary, writing through the test harness

use std::sync::Once;

use tracing::debug;
use tracing_subscriber::{filter::filter_fn, fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Install the test subscriber once. `RUST_LOG` overrides the default `eaog_editor=trace`.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("eaog_editor=trace"));
        let quiet = filter_fn(|metadata| !metadata.target().starts_with("walkdir"));

        let installed = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_filter(quiet)
                    .with_filter(env_filter),
            )
            .try_init();
        if installed.is_ok() {
            debug!("test logging ready");
        }
    });
}
