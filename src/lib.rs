//! # plan2collage
//!
//! Turn a floor plan plus a set of named product-page URLs into a composite
//! photorealistic interior rendering.
//!
//! ## What this crate actually does
//!
//! The interesting part is the **link-to-image resolution pipeline**: each
//! product URL points at a shop page, not an image. The pipeline scrapes the
//! page, picks one embedded photo by a filter-and-select policy, downloads
//! and decodes it, and re-packages it as a base64 PNG. The collected images
//! then go to a generative image backend together with a compositing prompt,
//! and the backend's output is handed back to the caller.
//!
//! ## Pipeline Overview
//!
//! ```text
//! LinkMap {label → URL}
//!  │
//!  ├─ 1. Fetch    GET the product page (trust policy, per-fetch timeout)
//!  ├─ 2. Scrape   harvest <img src>, filter https:// + suffix, select one
//!  ├─ 3. Fetch    GET the selected image URL
//!  ├─ 4. Decode   bytes → in-memory bitmap
//!  ├─ 5. Encode   bitmap → PNG → base64 (order = LinkMap order)
//!  └─ 6. Generate one backend call with prompt + all encoded references
//! ```
//!
//! Resolution is **best-effort**: a label that fails at any stage is dropped
//! from the output and logged; the rest of the batch is unaffected. The
//! per-label reasons stay available in
//! [`collage::EncodedBatch::failures`] for callers that want diagnostics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plan2collage::{compose, parse_link_map, CollageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let links = parse_link_map(r#"{"sofa": "https://shop.example/sofa-3000"}"#)?;
//!     // Backend auto-detected from OPENAI_API_KEY
//!     let config = CollageConfig::default();
//!     let output = compose(&links, &config).await?;
//!     println!("{} collage(s) generated", output.images.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Two deliberately-preserved oddities
//!
//! This crate reproduces the behaviour of an existing deployment, including
//! two choices a fresh design would not make. Both are preserved for parity
//! and surfaced as explicit, overridable configuration:
//!
//! * **Certificate verification is off by default**
//!   ([`TrustPolicy::Insecure`]) — every insecure client logs a `warn!`.
//! * **Selection takes the *second* filtered candidate**
//!   ([`CandidateSelection::SecondMatch`]) — likely meant to skip a logo at
//!   index 0, never confirmed; pages with a single matching image therefore
//!   fail to resolve.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `plan2collage` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod boundary;
pub mod collage;
pub mod config;
pub mod error;
pub mod linkmap;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{resolve_backend, GenerationBackend, OpenAiImageBackend};
pub use boundary::{map_compose_result, reject_empty_links, BoundaryReply, CollageResponse};
pub use collage::{compose, compose_sync, encode_images, CollageOutput, EncodedBatch, LabelFailure};
pub use config::{CandidateSelection, CollageConfig, CollageConfigBuilder, TrustPolicy};
pub use error::{CollageError, ExtractionError};
pub use linkmap::{parse_link_map, LinkMap};
pub use pipeline::encode::EncodedImage;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
