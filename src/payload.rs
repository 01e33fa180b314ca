//! Decoding the player payload stored inside a content record.
//!
//! The payload is JSON serialized twice: the player widget serializes its
//! configuration to a string, and the page state then stores that string as a
//! field value.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ExtractionError, Result};
use crate::query::{Kind, Path};
use crate::resolver::Record;

/// Decoded player configuration, handed opaquely to a normalizer.
pub type MediaDescriptor = Map<String, Value>;

/// Content types that carry a player payload.
pub const PLAYABLE_CONTENT_TYPES: [&str; 3] = ["videoPodcast", "video", "podcast"];

/// Tier every visitor can watch without logging in.
pub const FREE_TIER_ID: &str = "MemberTier:65b258d178f89be87b4dc0a4";

fn payload_query() -> Path {
    Path::new()
        .branch([
            Path::at(["contentVideo", "video", "videoData"]),
            Path::at(["contentPodcast", "podcast", "audioData"]),
        ])
        .kind(Kind::String)
        .json()
        .kind(Kind::Object)
        .any()
}

/// First of the video or audio payload fields that decodes to a mapping.
pub fn decode_payload(record: &Record<'_>) -> Option<MediaDescriptor> {
    match payload_query().first(record.value()).map(Cow::into_owned) {
        Some(Value::Object(descriptor)) => Some(descriptor),
        _ => None,
    }
}

/// Explain why a record has no decodable payload.
pub fn diagnose(record: &Record<'_>, free_tier_id: &str) -> ExtractionError {
    let content_type = record.str_field("contentType");
    if !content_type.is_some_and(|t| PLAYABLE_CONTENT_TYPES.contains(&t)) {
        return ExtractionError::UnsupportedContent {
            content_type: content_type.unwrap_or("unknown").to_owned(),
        };
    }
    match record.reference("contentTier") {
        Some(tier) if tier == free_tier_id => {
            warn!(tier, "free-tier content without a known payload shape");
            ExtractionError::ExtractionFailed("no decodable videoData/audioData payload".into())
        }
        tier => ExtractionError::AuthRequired { tier: tier.unwrap_or("unknown").to_owned() },
    }
}

/// Decode the payload or fail with the diagnosed reason.
pub fn resolve_payload(record: &Record<'_>, free_tier_id: &str) -> Result<MediaDescriptor> {
    match decode_payload(record) {
        Some(descriptor) => {
            debug!(fields = descriptor.len(), "decoded player payload");
            Ok(descriptor)
        }
        None => Err(diagnose(record, free_tier_id)),
    }
}
