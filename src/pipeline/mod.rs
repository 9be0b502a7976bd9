//! Pipeline stages for link-to-image resolution.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different candidate filter) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ scrape ──▶ fetch ──▶ extract ──▶ encode
//! (page)    (filter+    (image    (decode)    (PNG → base64)
//!            select)     bytes)
//! ```
//!
//! 1. [`fetch`]   — build the HTTP client (trust policy, timeout) and issue
//!    the two GETs each label needs
//! 2. [`scrape`]  — harvest `<img src>` in document order, filter on the
//!    secure-scheme + suffix predicates, pick one candidate
//! 3. [`extract`] — per-URL orchestration: page → candidate → bitmap;
//!    batch form resolves a whole LinkMap best-effort
//! 4. [`encode`]  — PNG-encode and base64-wrap each bitmap for the
//!    generation request body

pub mod encode;
pub mod extract;
pub mod fetch;
pub mod scrape;
