//! Failure taxonomy for a single page resolution.

use thiserror::Error;

/// Result type for the pure resolution pipeline.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// The four ways resolving a content page can fail.
///
/// Resolution is all-or-nothing: a failing page produces exactly one of these
/// and no partial record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Embedded state blob absent/unparseable, or the record is not in it.
    #[error("missing data: {0}")]
    MissingData(String),

    /// The record exists but is not a video or podcast.
    #[error("content is not a video/podcast (content type: {content_type})")]
    UnsupportedContent { content_type: String },

    /// Playable content gated behind a membership tier.
    #[error(
        "this video/podcast is for members only (tier: {tier}); log in with a membership account"
    )]
    AuthRequired { tier: String },

    /// Playable content whose payload matched none of the known page shapes.
    #[error("failed to extract content: {0}")]
    ExtractionFailed(String),
}

impl ExtractionError {
    /// Expected conditions are reported to the user plainly rather than as bugs.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::UnsupportedContent { .. } | Self::AuthRequired { .. })
    }
}
