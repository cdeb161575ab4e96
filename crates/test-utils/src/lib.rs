pub mod builders;
pub mod fake_backend;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound on any single async test, script runs included.
pub const TEST_DEADLINE: Duration = Duration::from_secs(10);

/// Install a test-writer subscriber once per test binary.
///
/// Output shows up only for failing tests; `RUST_LOG` picks the filter and
/// defaults to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Fail the test if `f` has not finished within [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .unwrap_or_else(|_| panic!("test did not finish within {TEST_DEADLINE:?}"))
}
