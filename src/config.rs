//! Configuration types for the link-to-image pipeline.
//!
//! All behaviour is controlled through [`CollageConfig`], built via its
//! [`CollageConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across calls, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! Two knobs deserve a health warning and get their own enums:
//!
//! * [`TrustPolicy`] — certificate verification is **disabled by default**.
//!   The behaviour this crate reproduces fetched every page and image with
//!   verification off, and changing that silently would change which labels
//!   resolve. It is a deliberate, risky default, surfaced here as an explicit
//!   policy that is logged loudly every time an insecure client is built.
//!
//! * [`CandidateSelection`] — the pipeline historically picked the **second**
//!   filtered candidate, never the first. Probably meant to skip a logo or
//!   header image that sorts first in document order, but nothing confirms
//!   that. The behaviour is preserved as the named default rather than
//!   silently "fixed" to first-match.

use crate::backend::GenerationBackend;
use crate::error::CollageError;
use crate::progress::BatchProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a link-to-collage run.
///
/// Built via [`CollageConfig::builder()`] or using
/// [`CollageConfig::default()`].
///
/// # Example
/// ```rust
/// use plan2collage::{CandidateSelection, CollageConfig, TrustPolicy};
///
/// let config = CollageConfig::builder()
///     .image_format(".jpg")
///     .trust_policy(TrustPolicy::VerifyCertificates)
///     .selection(CandidateSelection::FirstMatch)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CollageConfig {
    /// Suffix a candidate image URL must end with. Default: `".jpg"`.
    ///
    /// Filtering is two independent predicates joined by logical AND:
    /// `starts_with("https://") && ends_with(image_format)`. Only the suffix
    /// half is configurable; the secure-scheme half is fixed.
    pub image_format: String,

    /// Certificate verification policy for every page and image GET.
    /// Default: [`TrustPolicy::Insecure`] — see the module docs.
    pub trust_policy: TrustPolicy,

    /// Which filtered candidate to download. Default:
    /// [`CandidateSelection::SecondMatch`] — see the module docs.
    pub selection: CandidateSelection,

    /// Optional local file whose raw bytes are base64-encoded and appended
    /// as one extra trailing image after the batch. Default: `None`.
    ///
    /// A demo/debugging artifact of one observed deployment. The file is not
    /// transcoded; a missing or unreadable file is logged and skipped.
    pub augmentation_path: Option<PathBuf>,

    /// Per-fetch timeout in seconds, applied to page and image GETs alike.
    /// Default: 30. A timeout is an extraction failure: the label is dropped,
    /// the batch continues.
    pub fetch_timeout_secs: u64,

    /// Compositing prompt sent to the generation backend. If `None`, uses
    /// [`crate::prompts::DEFAULT_COMPOSITE_PROMPT`].
    pub prompt: Option<String>,

    /// Pre-constructed generation backend. Takes precedence over any
    /// environment-based construction; lifecycle is owned by the caller,
    /// never by module-level state.
    pub backend: Option<Arc<dyn GenerationBackend>>,

    /// Generation model identifier. If `None`, the backend default applies
    /// (`"gpt-image-1"` for the built-in OpenAI backend).
    pub model: Option<String>,

    /// Base URL of the generation API. If `None`, the backend default
    /// applies. Useful for proxies and API-compatible local servers.
    pub api_base: Option<String>,

    /// Optional per-label progress callback for the batch loop.
    pub progress_callback: Option<Arc<dyn BatchProgressCallback>>,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            image_format: ".jpg".to_string(),
            trust_policy: TrustPolicy::default(),
            selection: CandidateSelection::default(),
            augmentation_path: None,
            fetch_timeout_secs: 30,
            prompt: None,
            backend: None,
            model: None,
            api_base: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CollageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollageConfig")
            .field("image_format", &self.image_format)
            .field("trust_policy", &self.trust_policy)
            .field("selection", &self.selection)
            .field("augmentation_path", &self.augmentation_path)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn GenerationBackend>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CollageConfig {
    /// Create a new builder for `CollageConfig`.
    pub fn builder() -> CollageConfigBuilder {
        CollageConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CollageConfig`].
#[derive(Debug)]
pub struct CollageConfigBuilder {
    config: CollageConfig,
}

impl CollageConfigBuilder {
    pub fn image_format(mut self, suffix: impl Into<String>) -> Self {
        self.config.image_format = suffix.into();
        self
    }

    pub fn trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.config.trust_policy = policy;
        self
    }

    pub fn selection(mut self, selection: CandidateSelection) -> Self {
        self.config.selection = selection;
        self
    }

    pub fn augmentation_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.augmentation_path = Some(path.into());
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = Some(base.into());
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn BatchProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CollageConfig, CollageError> {
        let c = &self.config;
        if c.image_format.is_empty() {
            return Err(CollageError::InvalidConfig(
                "image_format suffix must not be empty".into(),
            ));
        }
        if !c.image_format.starts_with('.') {
            return Err(CollageError::InvalidConfig(format!(
                "image_format must be a file-extension suffix starting with '.', got '{}'",
                c.image_format
            )));
        }
        if c.fetch_timeout_secs == 0 {
            return Err(CollageError::InvalidConfig(
                "fetch_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Certificate-verification policy for outbound GETs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrustPolicy {
    /// Accept invalid certificates. (default — parity with observed behaviour)
    ///
    /// Every client built under this policy logs a `warn!` so the choice is
    /// visible in production logs rather than buried in a default.
    #[default]
    Insecure,
    /// Verify certificates normally; a TLS failure drops the label.
    VerifyCertificates,
}

/// Which entry of the filtered candidate list gets downloaded.
///
/// The historical behaviour indexes the list at 1 — the *second* match —
/// and fails when fewer than two candidates survive the filter. That is
/// preserved as the default; callers who know their pages can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CandidateSelection {
    /// Index 1 of the filtered list. (default — historical behaviour,
    /// likely meant to skip a logo/header image at index 0)
    #[default]
    SecondMatch,
    /// Index 0 of the filtered list.
    FirstMatch,
    /// An arbitrary 0-based index into the filtered list.
    Nth(usize),
}

impl CandidateSelection {
    /// The 0-based index this policy selects.
    pub fn index(&self) -> usize {
        match self {
            CandidateSelection::SecondMatch => 1,
            CandidateSelection::FirstMatch => 0,
            CandidateSelection::Nth(n) => *n,
        }
    }

    /// The smallest candidate-list length this policy can pick from.
    ///
    /// Saturates so `Nth(usize::MAX)` (reachable from `--select-index`)
    /// stays a plain "too few candidates" failure.
    pub fn min_candidates(&self) -> usize {
        self.index().saturating_add(1)
    }

    /// Pick from the filtered candidate list, `None` if it is too short.
    pub fn pick<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        candidates.get(self.index()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_observed_behaviour() {
        let config = CollageConfig::default();
        assert_eq!(config.image_format, ".jpg");
        assert_eq!(config.trust_policy, TrustPolicy::Insecure);
        assert_eq!(config.selection, CandidateSelection::SecondMatch);
        assert!(config.augmentation_path.is_none());
    }

    #[test]
    fn builder_rejects_empty_suffix() {
        let err = CollageConfig::builder().image_format("").build();
        assert!(matches!(err, Err(CollageError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_suffix_without_dot() {
        let err = CollageConfig::builder().image_format("jpg").build();
        assert!(matches!(err, Err(CollageError::InvalidConfig(_))));
    }

    #[test]
    fn builder_clamps_timeout_to_one() {
        let config = CollageConfig::builder()
            .fetch_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.fetch_timeout_secs, 1);
    }

    #[test]
    fn selection_indices() {
        assert_eq!(CandidateSelection::SecondMatch.index(), 1);
        assert_eq!(CandidateSelection::FirstMatch.index(), 0);
        assert_eq!(CandidateSelection::Nth(4).index(), 4);
    }

    #[test]
    fn min_candidates_saturates_at_usize_max() {
        assert_eq!(CandidateSelection::SecondMatch.min_candidates(), 2);
        assert_eq!(CandidateSelection::FirstMatch.min_candidates(), 1);
        assert_eq!(
            CandidateSelection::Nth(usize::MAX).min_candidates(),
            usize::MAX
        );
        assert_eq!(
            CandidateSelection::Nth(usize::MAX).pick(&["https://a.jpg".to_string()]),
            None
        );
    }

    #[test]
    fn selection_pick_out_of_range() {
        let one = vec!["https://a.jpg".to_string()];
        assert_eq!(CandidateSelection::SecondMatch.pick(&one), None);
        assert_eq!(CandidateSelection::FirstMatch.pick(&one), Some("https://a.jpg"));
        assert_eq!(CandidateSelection::SecondMatch.pick(&[]), None);
    }
}
