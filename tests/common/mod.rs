// vim: tw=80

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs `env_logger` once per test binary, matching this codebase's
/// `env_logger::init()` convention at its one binary entry point. Safe to
/// call from every test; only the first call has any effect.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
