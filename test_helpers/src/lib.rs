//! Shared test-only utilities: opt-in logging for test runs and (behind
//! `future_timeout`) a future timeout wrapper.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::clone_on_ref_ptr)]

use parking_lot::Once;

static LOG_SETUP: Once = Once::new();

/// Enables `tracing` output for the current test binary if `LOG_FILTER` (or
/// `RUST_LOG`) is set in the environment; otherwise a no-op. Safe to call
/// from every test — only the first call installs the subscriber.
pub fn maybe_start_logging() {
    if std::env::var("LOG_FILTER").is_err() && std::env::var("RUST_LOG").is_err() {
        return;
    }
    LOG_SETUP.call_once(|| {
        let _ = dotenvy::dotenv();
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A temp directory whose contents are removed on drop, for tests that
/// persist the catalog to disk.
pub fn tmp_dir() -> std::io::Result<tempfile::TempDir> {
    tempfile::Builder::new().prefix("polydb-test").tempdir()
}

#[cfg(feature = "future_timeout")]
pub mod timeout {
    use std::time::Duration;

    /// Await `fut`, panicking with a clear message if it doesn't resolve
    /// within `duration`. Used in lock manager and migrator tests where a
    /// bug would otherwise hang the test suite instead of failing it.
    pub async fn timeout_panic<F, T>(duration: Duration, fut: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        match tokio::time::timeout(duration, fut).await {
            Ok(value) => value,
            Err(_) => panic!("future did not complete within {duration:?}"),
        }
    }
}
