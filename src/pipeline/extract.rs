//! The Page Image Extractor: one product URL → one decoded bitmap.
//!
//! Per label this issues exactly two GETs — the product page, then the
//! selected image — and decodes the image bytes in memory. The batch form
//! [`resolve_all`] walks a whole LinkMap **sequentially** (one label's
//! fetch, decode, and encode fully finish before the next label starts) and
//! never aborts on a per-label error; each label's outcome is an explicit
//! `Result` so the caller decides whether failures are dropped or reported.

use crate::config::CollageConfig;
use crate::error::ExtractionError;
use crate::linkmap::LinkMap;
use crate::pipeline::encode::{self, EncodedImage};
use crate::pipeline::{fetch, scrape};
use image::DynamicImage;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Resolve one product-page URL to a decoded bitmap.
///
/// Steps: fetch page → harvest `<img src>` → filter → select one candidate
/// → fetch image bytes → decode. Any step failing yields the corresponding
/// [`ExtractionError`]; the bitmap is owned by the caller and shared with
/// nothing.
pub async fn extract_image(
    client: &reqwest::Client,
    url: &str,
    config: &CollageConfig,
) -> Result<DynamicImage, ExtractionError> {
    let html = fetch::fetch_page(client, url, config.fetch_timeout_secs).await?;

    let sources = scrape::image_sources(&html);
    let candidates = scrape::filter_candidates(&sources, &config.image_format);
    debug!(
        "{}: {} <img> tag(s), {} candidate(s) after filter",
        url,
        sources.len(),
        candidates.len()
    );

    if candidates.is_empty() {
        return Err(ExtractionError::NoCandidates {
            url: url.to_string(),
            img_tags: sources.len(),
        });
    }

    let image_url =
        config
            .selection
            .pick(&candidates)
            .ok_or_else(|| ExtractionError::TooFewCandidates {
                url: url.to_string(),
                found: candidates.len(),
                needed: config.selection.min_candidates(),
            })?;
    debug!("{}: selected candidate '{}'", url, image_url);

    let bytes = fetch::fetch_image_bytes(client, image_url, config.fetch_timeout_secs).await?;

    image::load_from_memory(&bytes).map_err(|e| ExtractionError::DecodeFailed {
        url: image_url.to_string(),
        detail: e.to_string(),
    })
}

/// Resolve and encode every label in the LinkMap, best-effort and strictly
/// sequential.
///
/// The returned map has one entry per input label, in LinkMap iteration
/// order, each holding `Ok(encoded)` or the `Err` that dropped it. Folding
/// the errors away is the caller's job
/// ([`crate::collage::encode_images`] does it by default).
///
/// Encoding happens inside the loop: a label's decoded bitmap is dropped
/// before the next label's fetch starts, so at most one full-resolution
/// bitmap is alive at a time regardless of batch size.
///
/// Fires the full per-label progress sequence: `on_batch_start`, then
/// `on_label_start` and `on_label_complete`/`on_label_failed` per label.
pub async fn resolve_all(
    client: &reqwest::Client,
    links: &LinkMap,
    config: &CollageConfig,
) -> IndexMap<String, Result<EncodedImage, ExtractionError>> {
    let total = links.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut resolved = IndexMap::with_capacity(total);

    for (i, (label, url)) in links.iter().enumerate() {
        debug!("Resolving label '{}' from {}", label, url);
        if let Some(ref cb) = config.progress_callback {
            cb.on_label_start(label, i, total);
        }

        let outcome = match extract_image(client, url, config).await {
            Ok(img) => {
                info!(
                    "Label '{}' resolved to a {}×{} bitmap",
                    label,
                    img.width(),
                    img.height()
                );
                encode::encode_image(&img)
            }
            Err(e) => Err(e),
        };
        match &outcome {
            Ok(encoded) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_label_complete(label, i, total, encoded.as_str().len());
                }
            }
            Err(e) => {
                warn!("Label '{}' dropped: {}", label, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_label_failed(label, i, total, &e.to_string());
                }
            }
        }
        resolved.insert(label.clone(), outcome);
    }

    resolved
}

#[cfg(test)]
mod tests {
    // extract_image needs a live server; its happy path is exercised by the
    // env-gated tests in tests/e2e.rs. The pure stages it composes (scrape,
    // selection, encode, fold) each carry their own unit tests. resolve_all
    // is tested here against loopback URLs that refuse the connection.
    use super::*;
    use crate::progress::BatchProgressCallback;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl BatchProgressCallback for RecordingCallback {
        fn on_batch_start(&self, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("batch_start({total})"));
        }
        fn on_label_start(&self, label: &str, index: usize, _total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start({label},{index})"));
        }
        fn on_label_complete(&self, label: &str, index: usize, _total: usize, _len: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("complete({label},{index})"));
        }
        fn on_label_failed(&self, label: &str, index: usize, _total: usize, _error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failed({label},{index})"));
        }
    }

    #[tokio::test]
    async fn progress_events_fire_per_label_in_linkmap_order() {
        // Port 1 on loopback refuses the connection immediately, so every
        // label fails at the page fetch without leaving the host. The point
        // is the event stream: each label's outcome event arrives before the
        // next label starts, never batched at the end.
        let recorder = Arc::new(RecordingCallback::default());
        let config = CollageConfig::builder()
            .fetch_timeout_secs(5)
            .progress_callback(recorder.clone() as Arc<dyn BatchProgressCallback>)
            .build()
            .unwrap();
        let client = fetch::build_client(&config).unwrap();

        let mut links = LinkMap::new();
        links.insert("sofa".to_string(), "https://127.0.0.1:1/a".to_string());
        links.insert("lamp".to_string(), "https://127.0.0.1:1/b".to_string());

        let resolved = resolve_all(&client, &links, &config).await;
        assert_eq!(resolved.len(), 2);
        assert!(resolved.values().all(|r| r.is_err()));

        let events = recorder.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "batch_start(2)".to_string(),
                "start(sofa,0)".to_string(),
                "failed(sofa,0)".to_string(),
                "start(lamp,1)".to_string(),
                "failed(lamp,1)".to_string(),
            ]
        );
    }
}
