// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, local engine access, and a fake engine API.

use hauler::runtime::Engine;
use std::sync::Once;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod engine_api;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("hauler=debug".parse().unwrap())
            .add_directive("bollard=info".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// The local engine, or `None` when this machine has none running.
#[allow(dead_code)]
pub async fn local_engine() -> Option<Engine> {
    init_tracing();
    Engine::open_local().await.ok()
}
