//! Error taxonomy for the extraction engine.
//!
//! Only genuinely exceptional conditions are errors here: timeouts, frames
//! that never produced a document, and broken configuration. A date that
//! cannot be parsed is *not* an error — the normalizer returns `None` and the
//! record is produced without a publication date.

use thiserror::Error;

/// Failures raised by scope resolution and the extraction pipeline.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A required selector string is empty or does not parse as CSS.
    /// Raised immediately; never retried.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// An awaited element never attached within the allotted time.
    ///
    /// Fatal for the whole run only when it occurs resolving the title
    /// root; per-row lookups that come up empty are row-local skips.
    #[error("timed out after {timeout_ms}ms waiting for `{selector}` to attach")]
    ScopeTimeout { selector: String, timeout_ms: u64 },

    /// The iframe wrapper attached but its embedded document never became
    /// available. Distinct from [`ScrapeError::ScopeTimeout`]: the wrapper
    /// exists, its content does not. Fatal for the run — there is no
    /// fallback to the top-level scope.
    #[error("iframe `{selector}` is attached but its document is not available")]
    FrameUnresolved { selector: String },

    /// A site definition that cannot be acted on (unparseable base URL,
    /// broken date regex, and the like).
    #[error("invalid configuration: {0}")]
    Config(String),
}
