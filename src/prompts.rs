//! Compositing prompt for the generation backend.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tweaking how the backend is asked to
//!    arrange furniture requires editing exactly one place.
//!
//! 2. **No embedded literals in the pipeline** — the orchestration code never
//!    carries prompt text; it reads either this constant or the caller's
//!    override in [`crate::config::CollageConfig::prompt`].

/// Default prompt sent alongside the encoded product images.
///
/// Used when `CollageConfig::prompt` is `None`.
pub const DEFAULT_COMPOSITE_PROMPT: &str = "\
Generate a photorealistic interior scene based on the provided floor plan layout. \
Use only the furniture items shown in the reference images. \
Arrange the furniture exactly according to the layout to create a coherent and realistic living space.";
