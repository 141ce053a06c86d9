use camino::Utf8Path;

use crate::error::DdragonError;
use crate::version::{Locale, Version};

/// Observer interface for download notifications and log routing.
///
/// All notifications are fire-and-forget. The three severity channels have
/// default methods routing to the generic `log` channel, so an implementor
/// that only cares about one severity still sees everything else.
pub trait EventSink: Send + Sync {
    /// A (locale, version) pair finished downloading.
    fn downloaded(&self, locale: &Locale, version: &Version, path: &Utf8Path) {
        let _ = (locale, version, path);
    }

    fn error(&self, error: &DdragonError) {
        self.log(&format!("error: {error}"));
    }

    fn log(&self, message: &str) {
        let _ = message;
    }

    fn log_info(&self, message: &str) {
        self.log(message);
    }

    fn log_debug(&self, message: &str) {
        self.log(message);
    }

    fn log_error(&self, message: &str) {
        self.log(message);
    }
}

/// Default sink routing everything into `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn downloaded(&self, locale: &Locale, version: &Version, path: &Utf8Path) {
        tracing::info!(%locale, %version, %path, "static data downloaded");
    }

    fn error(&self, error: &DdragonError) {
        tracing::error!(%error, "download error");
    }

    fn log(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn log_info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn log_debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn log_error(&self, message: &str) {
        tracing::error!("{message}");
    }
}
