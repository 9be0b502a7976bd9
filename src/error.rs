//! Error types for the plan2collage library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CollageError`] — **Fatal**: the batch cannot proceed at all (bad
//!   configuration, no generation backend, nothing resolved). Returned as
//!   `Err(CollageError)` from the top-level `compose*` / `encode_images`
//!   entry points.
//!
//! * [`ExtractionError`] — **Non-fatal**: a single label failed (page
//!   unreachable, too few image candidates, undecodable bytes) but the rest
//!   of the batch is fine. The batch folds these away by default — a failed
//!   label is simply absent from the output — but each one is kept in
//!   [`crate::collage::EncodedBatch::failures`] so callers that want
//!   per-label diagnostics can have them without changing the default
//!   best-effort contract.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the plan2collage library.
///
/// Per-label failures use [`ExtractionError`] and are collected in
/// [`crate::collage::EncodedBatch`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CollageError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The label→URL mapping was empty. Maps to HTTP 400 at the boundary.
    #[error("Bad request: empty image urls")]
    EmptyLinkMap,

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {reason}")]
    ClientBuildFailed { reason: String },

    // ── Resolution errors ─────────────────────────────────────────────────
    /// Every label failed to resolve and no augmentation image was added.
    ///
    /// This is the "no images found" condition; the boundary maps it to
    /// HTTP 404, not to an internal error.
    #[error("No images found ({attempted} label(s) attempted, all dropped)")]
    NoImagesResolved { attempted: usize },

    // ── Backend errors ────────────────────────────────────────────────────
    /// No generation backend was injected and none could be built from the
    /// environment.
    #[error("Generation backend is not configured.\n{hint}")]
    BackendNotConfigured { hint: String },

    /// The generation request failed at the transport level.
    #[error("Generation backend request failed: {reason}")]
    BackendRequestFailed { reason: String },

    /// The backend answered but the response body was not the expected shape.
    #[error("Generation backend returned an unexpected response: {detail}")]
    BackendResponseMalformed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write a generated collage to disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single label.
///
/// The batch never aborts on one of these; the label is dropped from the
/// output and the error is retained for the diagnostic report.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// The product page GET failed (DNS, connection, TLS, non-2xx status).
    #[error("Failed to fetch page '{url}': {reason}")]
    PageFetchFailed { url: String, reason: String },

    /// The selected image GET failed.
    #[error("Failed to fetch image '{url}': {reason}")]
    ImageFetchFailed { url: String, reason: String },

    /// A GET exceeded the configured per-fetch timeout.
    #[error("Fetch of '{url}' timed out after {secs}s")]
    FetchTimedOut { url: String, secs: u64 },

    /// The page parsed but no image candidate survived the filter.
    #[error("No image candidates on '{url}' ({img_tags} <img> tag(s) seen, none matched the filter)")]
    NoCandidates { url: String, img_tags: usize },

    /// Fewer filtered candidates than the selection policy requires.
    #[error("Page '{url}' has {found} matching image(s); selection needs at least {needed}")]
    TooFewCandidates {
        url: String,
        found: usize,
        needed: usize,
    },

    /// Downloaded bytes were not a supported image format.
    #[error("Image at '{url}' could not be decoded: {detail}")]
    DecodeFailed { url: String, detail: String },

    /// PNG re-encoding of a decoded bitmap failed.
    #[error("PNG encoding failed: {detail}")]
    EncodeFailed { detail: String },
}
