//! Progress-callback trait for per-label batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::CollageConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the LinkMap.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a WebSocket, a log line, or a terminal
//! progress bar without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so the same
//! callback can be shared with other tasks while a batch runs.

use std::sync::Arc;

/// Called by the batch loop as it processes each label.
///
/// Labels are processed strictly sequentially, so events for one batch
/// arrive in order and never overlap. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any label is fetched.
    fn on_batch_start(&self, total_labels: usize) {
        let _ = total_labels;
    }

    /// Called just before a label's page fetch begins.
    ///
    /// `index` is 0-based position in LinkMap iteration order.
    fn on_label_start(&self, label: &str, index: usize, total: usize) {
        let _ = (label, index, total);
    }

    /// Called when a label resolved and encoded successfully.
    ///
    /// `encoded_len` is the byte length of the base64 string.
    fn on_label_complete(&self, label: &str, index: usize, total: usize, encoded_len: usize) {
        let _ = (label, index, total, encoded_len);
    }

    /// Called when a label failed and was dropped from the output.
    fn on_label_failed(&self, label: &str, index: usize, total: usize, error: &str) {
        let _ = (label, index, total, error);
    }

    /// Called once after every label has been attempted.
    fn on_batch_complete(&self, total_labels: usize, resolved: usize) {
        let _ = (total_labels, resolved);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CollageConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
