//! Batch orchestration: LinkMap → encoded images → generated collage.
//!
//! This is the Image Encoding Service plus the full compose entry point.
//! The contract is **best-effort**: a label that fails anywhere along its
//! pipeline (fetch, filter, select, download, decode, encode) is dropped
//! from the output and the rest of the batch is unaffected. Output order is
//! LinkMap iteration order; a caller that feeds the same map twice gets the
//! images in the same positions.
//!
//! Failures are not thrown away entirely — each one is kept as a
//! [`LabelFailure`] in [`EncodedBatch::failures`], so diagnostics are an
//! opt-in read, not a contract change.

use crate::backend::resolve_backend;
use crate::config::CollageConfig;
use crate::error::{CollageError, ExtractionError};
use crate::linkmap::LinkMap;
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::{extract, fetch};
use crate::prompts::DEFAULT_COMPOSITE_PROMPT;
use indexmap::IndexMap;
use std::path::Path;
use tracing::{info, warn};

/// One dropped label and the reason it was dropped.
#[derive(Debug, Clone)]
pub struct LabelFailure {
    pub label: String,
    pub error: ExtractionError,
}

/// The Encoding Service's output: encoded successes plus the failure report.
///
/// `images` holds exactly one entry per successfully-resolved label, in
/// LinkMap order, with the optional augmentation image appended last.
#[derive(Debug, Clone, Default)]
pub struct EncodedBatch {
    pub images: Vec<EncodedImage>,
    pub failures: Vec<LabelFailure>,
    /// Whether the trailing entry of `images` is the augmentation image
    /// rather than a label-derived one.
    pub augmented: bool,
}

impl EncodedBatch {
    /// Labels attempted = successes + failures (excludes augmentation).
    pub fn attempted(&self) -> usize {
        self.failures.len() + self.resolved()
    }

    /// Successfully resolved label count (excludes augmentation).
    pub fn resolved(&self) -> usize {
        self.images.len() - usize::from(self.augmented)
    }
}

/// Final output of [`compose`]: what the backend generated, plus the batch
/// diagnostics that produced the request.
#[derive(Debug, Clone)]
pub struct CollageOutput {
    /// One or more generated composite images, as returned by the backend.
    pub images: Vec<EncodedImage>,
    /// Reference images that were sent to the backend.
    pub references_sent: usize,
    /// Labels dropped during resolution, with reasons.
    pub failures: Vec<LabelFailure>,
}

/// Resolve and encode every label in the LinkMap.
///
/// Strictly sequential; each label's two GETs, decode, and encode complete
/// before the next label starts. Per-label errors are folded into
/// [`EncodedBatch::failures`] — never propagated — so the `Err` arm here is
/// reserved for batch-fatal problems (client construction).
pub async fn encode_images(
    links: &LinkMap,
    config: &CollageConfig,
) -> Result<EncodedBatch, CollageError> {
    let client = fetch::build_client(config)?;
    let total = links.len();

    let resolved = extract::resolve_all(&client, links, config).await;
    let mut batch = fold_encoded(resolved);

    if let Some(ref path) = config.augmentation_path {
        if append_augmentation(&mut batch.images, path) {
            batch.augmented = true;
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, batch.resolved());
    }

    info!(
        "Batch complete: {}/{} label(s) resolved, {} image(s) encoded",
        batch.resolved(),
        total,
        batch.images.len()
    );
    Ok(batch)
}

/// Run the whole pipeline: encode the batch, then ask the backend for the
/// composite.
///
/// # Errors
/// - [`CollageError::NoImagesResolved`] when every label was dropped and no
///   augmentation image exists — the boundary's "no images found" condition.
/// - Backend errors from [`crate::backend`], propagated as-is.
pub async fn compose(
    links: &LinkMap,
    config: &CollageConfig,
) -> Result<CollageOutput, CollageError> {
    let batch = encode_images(links, config).await?;

    if batch.images.is_empty() {
        return Err(CollageError::NoImagesResolved {
            attempted: links.len(),
        });
    }

    let backend = resolve_backend(config)?;
    let prompt = config.prompt.as_deref().unwrap_or(DEFAULT_COMPOSITE_PROMPT);

    let generated = backend.generate(prompt, &batch.images).await?;
    info!(
        "Compose complete: {} reference(s) in, {} collage(s) out",
        batch.images.len(),
        generated.len()
    );

    Ok(CollageOutput {
        images: generated,
        references_sent: batch.images.len(),
        failures: batch.failures,
    })
}

/// Synchronous wrapper around [`compose`].
///
/// Creates a temporary tokio runtime internally.
pub fn compose_sync(links: &LinkMap, config: &CollageConfig) -> Result<CollageOutput, CollageError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CollageError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(compose(links, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Fold per-label Results into the success-only encoded sequence.
///
/// Pure: resolution, encoding, logging, and progress events all happened
/// per-label in [`extract::resolve_all`]; this only separates successes
/// from failures while preserving LinkMap order.
fn fold_encoded(resolved: IndexMap<String, Result<EncodedImage, ExtractionError>>) -> EncodedBatch {
    let mut batch = EncodedBatch::default();

    for (label, outcome) in resolved {
        match outcome {
            Ok(encoded) => batch.images.push(encoded),
            Err(error) => batch.failures.push(LabelFailure { label, error }),
        }
    }

    batch
}

/// Append the optional local augmentation image, untranscoded.
///
/// Returns `true` when an image was appended. Missing or unreadable files
/// are logged and skipped — this hook must never fail a batch.
fn append_augmentation(images: &mut Vec<EncodedImage>, path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => {
            images.push(EncodedImage::from_raw_bytes(&bytes));
            info!(
                "Appended augmentation image from {} ({} bytes)",
                path.display(),
                bytes.len()
            );
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Augmentation image not found at {}", path.display());
            false
        }
        Err(e) => {
            warn!("Could not read augmentation image {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerationBackend;
    use crate::config::CollageConfig;
    use crate::pipeline::encode;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Write;
    use std::sync::Arc;

    /// A 4×4 bitmap with a distinctive red shade, encoded the way the
    /// resolution loop encodes its outputs.
    fn encoded_bitmap(shade: u8) -> EncodedImage {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([shade, 0, 0, 255])));
        encode::encode_image(&img).expect("in-memory PNG encode")
    }

    fn drop_error(label: &str) -> ExtractionError {
        ExtractionError::TooFewCandidates {
            url: format!("https://shop.example/{label}"),
            found: 1,
            needed: 2,
        }
    }

    /// Backend stub that hands the references straight back.
    struct EchoBackend;

    #[async_trait]
    impl GenerationBackend for EchoBackend {
        async fn generate(
            &self,
            _prompt: &str,
            images: &[EncodedImage],
        ) -> Result<Vec<EncodedImage>, CollageError> {
            Ok(images.to_vec())
        }
    }

    #[test]
    fn fold_all_success_keeps_length_and_order() {
        let mut resolved = IndexMap::new();
        resolved.insert("sofa".to_string(), Ok(encoded_bitmap(10)));
        resolved.insert("lamp".to_string(), Ok(encoded_bitmap(20)));
        resolved.insert("table".to_string(), Ok(encoded_bitmap(30)));

        let batch = fold_encoded(resolved);
        assert_eq!(batch.images.len(), 3);
        assert!(batch.failures.is_empty());

        // Distinct pixel shades survive the PNG round trip, proving order.
        let shades: Vec<u8> = batch
            .images
            .iter()
            .map(|e| {
                let img = image::load_from_memory(&e.decode().unwrap()).unwrap();
                img.to_rgba8().get_pixel(0, 0)[0]
            })
            .collect();
        assert_eq!(shades, [10, 20, 30]);
    }

    #[test]
    fn fold_drops_failed_labels_without_placeholders() {
        let mut resolved = IndexMap::new();
        resolved.insert("sofa".to_string(), Ok(encoded_bitmap(10)));
        resolved.insert("lamp".to_string(), Err(drop_error("lamp")));
        resolved.insert("table".to_string(), Ok(encoded_bitmap(30)));

        let batch = fold_encoded(resolved);
        assert_eq!(batch.images.len(), 2, "failed label must leave no placeholder");
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].label, "lamp");

        // Neighbouring labels keep their relative order.
        let shades: Vec<u8> = batch
            .images
            .iter()
            .map(|e| {
                let img = image::load_from_memory(&e.decode().unwrap()).unwrap();
                img.to_rgba8().get_pixel(0, 0)[0]
            })
            .collect();
        assert_eq!(shades, [10, 30]);
    }

    #[test]
    fn fold_of_empty_map_is_empty_batch() {
        let batch = fold_encoded(IndexMap::new());
        assert!(batch.images.is_empty());
        assert!(batch.failures.is_empty());
    }

    #[test]
    fn augmentation_appends_raw_file_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not-actually-a-jpeg").unwrap();

        let mut images = vec![EncodedImage::from_base64("aGk=")];
        assert!(append_augmentation(&mut images, file.path()));
        assert_eq!(images.len(), 2);
        // Raw bytes, no transcode.
        assert_eq!(images[1].decode().unwrap(), b"not-actually-a-jpeg");
    }

    #[test]
    fn augmentation_skips_missing_file_silently() {
        let mut images = vec![EncodedImage::from_base64("aGk=")];
        assert!(!append_augmentation(
            &mut images,
            Path::new("/nonexistent/result.jpg")
        ));
        assert_eq!(images.len(), 1);
    }

    #[tokio::test]
    async fn compose_empty_batch_is_no_images_resolved() {
        // Empty LinkMap, no augmentation: nothing can resolve, and the
        // backend must never be called — the error comes first.
        let config = CollageConfig::builder()
            .backend(Arc::new(EchoBackend))
            .build()
            .unwrap();
        let links = LinkMap::new();

        let err = compose(&links, &config).await.unwrap_err();
        assert!(matches!(err, CollageError::NoImagesResolved { attempted: 0 }));
    }

    #[tokio::test]
    async fn compose_forwards_augmentation_only_batch() {
        // A batch that resolved zero labels but has an augmentation image is
        // not empty, so it still reaches the backend. Same 404-avoidance the
        // original deployment relied on.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"demo-collage-bytes").unwrap();

        let config = CollageConfig::builder()
            .backend(Arc::new(EchoBackend))
            .augmentation_path(file.path())
            .build()
            .unwrap();
        let links = LinkMap::new();

        let output = compose(&links, &config).await.unwrap();
        assert_eq!(output.references_sent, 1);
        assert_eq!(output.images.len(), 1);
        assert_eq!(output.images[0].decode().unwrap(), b"demo-collage-bytes");
    }
}
