//! Media metadata and playlist extraction for beacon.tv pages.
//!
//! Pages embed their data as a normalized Apollo cache inside the Next.js
//! `__NEXT_DATA__` script. [`graph`] loads it, [`query`] walks it,
//! [`resolver`] and [`payload`] find and decode a content record, and
//! [`relations`] lists the members of a series. [`BeaconExtractor`] ties the
//! pipeline to page fetching.

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod graph;
pub mod mapping;
pub mod normalizer;
pub mod payload;
pub mod query;
pub mod relations;
pub mod resolver;
pub mod time;
pub mod types;
pub mod urls;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::ExtractionError;
    pub use crate::extractor::BeaconExtractor;
    pub use crate::fetch::PageFetcher;
    pub use crate::normalizer::DescriptorNormalizer;
    pub use crate::types::{
        Extraction, MediaSource, OutputRecord, Playlist, PlaylistEntry, SourceKind,
    };
}

pub use crate::config::Config;
pub use crate::error::ExtractionError;
pub use crate::extractor::{content_from_page, series_from_page, BeaconExtractor};
