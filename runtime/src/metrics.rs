//! Prometheus metrics for observability and monitoring.
//!
//! The store records its own counters and histograms through the `metrics`
//! facade; [`MetricsServer`] installs the Prometheus recorder that collects
//! them and renders the scrape payload.
//!
//! # Example
//!
//! ```rust,no_run
//! use inscriptions_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! let payload = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
///
/// Owns the recorder handle; the binary exposes [`MetricsServer::render`]
/// on `addr` for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address the scrape endpoint should bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint binds to
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Describe the runtime metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] or [`MetricsError::Install`] if the
    /// exporter cannot be set up.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), this logs a warning
    /// and leaves [`MetricsServer::handle`] empty.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                register_metrics();
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Describe the metrics recorded by the store runtime.
fn register_metrics() {
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_counter!(
        "store.effects.executed",
        "Total number of effects executed, by effect type"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside reducers"
    );
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:9100".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
        assert_eq!(server.addr(), addr);
    }

    #[test]
    fn test_metrics_server_start_and_render() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        counter!("store.commands.total").increment(1);

        // Another test may have installed the global recorder first
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("store_commands_total"));
        }
    }
}
