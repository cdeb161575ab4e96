#![allow(dead_code)]

pub use scriptrun_test_utils::builders;
pub use scriptrun_test_utils::fake_backend;
pub use scriptrun_test_utils::{init_tracing, with_timeout};
