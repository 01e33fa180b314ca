use url::Url;

use crate::query::{Kind, Path};
use crate::resolver::Record;
use crate::time::parse_iso8601;
use crate::types::{MediaFragment, OutputRecord, Playlist, PlaylistEntry};
use crate::urls::content_url;

/// Tag of the extractor a [`PlaylistEntry`] should be resolved with.
pub const CONTENT_EXTRACTOR_TAG: &str = "BeaconTv";

/// Scalar fields read straight off a content record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<i64>,
}

pub fn direct_fields_from(record: &Record<'_>) -> DirectFields {
    let value = record.value();
    DirectFields {
        title: Path::new().key("title").kind(Kind::String).string(value),
        description: Path::new().key("description").kind(Kind::String).string(value),
        timestamp: Path::new()
            .key("publishedAt")
            .string(value)
            .and_then(|s| parse_iso8601(&s)),
    }
}

/// Merge the normalizer output with the record's own fields. Fields present on
/// the record win over whatever the normalizer produced.
pub fn output_record_from(id: &str, fragment: MediaFragment, direct: DirectFields) -> OutputRecord {
    OutputRecord {
        id: id.to_string(),
        title: direct.title.or(fragment.title),
        description: direct.description.or(fragment.description),
        timestamp: direct.timestamp.or(fragment.timestamp),
        media_sources: fragment.sources,
        thumbnail: fragment.thumbnail,
        duration: fragment.duration,
    }
}

pub fn playlist_entry_from(base: &Url, slug: &str) -> PlaylistEntry {
    PlaylistEntry {
        reference_url: content_url(base, slug),
        extractor_tag: CONTENT_EXTRACTOR_TAG.to_string(),
        id: slug.to_string(),
    }
}

pub fn playlist_from(
    base: &Url,
    series_slug: &str,
    title: String,
    slugs: &[String],
) -> Playlist {
    Playlist {
        id: series_slug.to_string(),
        title,
        entries: slugs.iter().map(|s| playlist_entry_from(base, s)).collect(),
    }
}
