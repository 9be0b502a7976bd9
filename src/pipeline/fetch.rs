//! HTTP client construction and the two GETs each label needs.
//!
//! One client is built per batch and reused for every page and image GET in
//! it; labels share nothing else. The trust policy decides whether the
//! client verifies certificates — the historical behaviour is **no** — and
//! the per-fetch timeout turns a hung server into a dropped label instead
//! of a hung batch.

use crate::config::{CollageConfig, TrustPolicy};
use crate::error::{CollageError, ExtractionError};
use std::time::Duration;
use tracing::{debug, warn};

/// Build the HTTP client for one batch.
///
/// Under [`TrustPolicy::Insecure`] the client accepts invalid certificates.
/// That is the parity default, not a recommendation; it is logged at `warn!`
/// on every construction so the choice shows up in production logs.
pub fn build_client(config: &CollageConfig) -> Result<reqwest::Client, CollageError> {
    let mut builder =
        reqwest::Client::builder().timeout(Duration::from_secs(config.fetch_timeout_secs));

    match config.trust_policy {
        TrustPolicy::Insecure => {
            warn!(
                "TLS certificate verification is DISABLED for this batch; \
                 set TrustPolicy::VerifyCertificates to opt out of the legacy default"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        TrustPolicy::VerifyCertificates => {
            debug!("TLS certificate verification enabled");
        }
    }

    builder
        .build()
        .map_err(|e| CollageError::ClientBuildFailed {
            reason: e.to_string(),
        })
}

/// GET a product page and return its body as text.
pub async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<String, ExtractionError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractionError::FetchTimedOut {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractionError::PageFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractionError::PageFetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    response
        .text()
        .await
        .map_err(|e| ExtractionError::PageFetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// GET an image URL and return the raw body bytes.
pub async fn fetch_image_bytes(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<Vec<u8>, ExtractionError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractionError::FetchTimedOut {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractionError::ImageFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractionError::ImageFetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ExtractionError::ImageFetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    debug!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}
