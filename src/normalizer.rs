//! Turning a decoded player payload into playable sources.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::{ExtractionError, Result};
use crate::payload::MediaDescriptor;
use crate::types::{MediaFragment, MediaSource, SourceKind};

/// Converts a vendor player payload into a [`MediaFragment`].
pub trait DescriptorNormalizer: Send + Sync {
    fn normalize(&self, descriptor: &MediaDescriptor, id: &str) -> Result<MediaFragment>;
}

/// JW Player setup/playlist payloads.
#[derive(Debug, Clone, Default)]
pub struct JwPlayerNormalizer {
    base_url: Option<Url>,
}

impl JwPlayerNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative source and image URLs against `base_url`.
    pub fn with_base_url(base_url: Url) -> Self {
        Self { base_url: Some(base_url) }
    }

    fn absolute(&self, file: &str) -> Option<String> {
        match Url::parse(file) {
            Ok(url) => Some(url.into()),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(file).ok().map(String::from),
                None if file.starts_with("//") => Some(format!("https:{file}")),
                None => None,
            },
            Err(_) => None,
        }
    }

    fn source(&self, entry: &Map<String, Value>) -> Option<MediaSource> {
        let url = self.absolute(text(entry, "file")?)?;
        let declared = text(entry, "type").map(str::to_ascii_lowercase);
        let ext = Url::parse(&url)
            .ok()
            .and_then(|u| u.path().rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()))
            .filter(|e| !e.is_empty() && !e.contains('/'));
        Some(MediaSource {
            kind: classify(declared.as_deref(), ext.as_deref()),
            mime: declared.filter(|t| t.contains('/')),
            label: text(entry, "label").map(str::to_owned),
            width: number(entry, "width").and_then(|n| u32::try_from(n).ok()),
            height: number(entry, "height").and_then(|n| u32::try_from(n).ok()),
            bitrate: number(entry, "bitrate"),
            url,
            ext,
        })
    }
}

impl DescriptorNormalizer for JwPlayerNormalizer {
    fn normalize(&self, descriptor: &MediaDescriptor, id: &str) -> Result<MediaFragment> {
        let item = descriptor
            .get("playlist")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(Value::as_object)
            .unwrap_or(descriptor);

        let mut seen = HashSet::new();
        let sources: Vec<MediaSource> = item
            .get("sources")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .filter_map(|entry| self.source(entry))
            .filter(|s| seen.insert(s.url.clone()))
            .collect();
        if sources.is_empty() {
            return Err(ExtractionError::ExtractionFailed(format!(
                "no playable sources in player data for {id}"
            )));
        }
        debug!(id, sources = sources.len(), "normalized player data");

        Ok(MediaFragment {
            title: text(item, "title").map(str::to_owned),
            description: text(item, "description").map(str::to_owned),
            thumbnail: text(item, "image").and_then(|i| self.absolute(i)),
            duration: item.get("duration").and_then(Value::as_f64).filter(|d| *d > 0.0),
            timestamp: item.get("pubdate").and_then(Value::as_i64),
            sources,
        })
    }
}

fn text<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn number(map: &Map<String, Value>, key: &str) -> Option<u64> {
    map.get(key).and_then(|v| {
        v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    })
}

fn classify(declared: Option<&str>, ext: Option<&str>) -> SourceKind {
    match (declared.unwrap_or_default(), ext.unwrap_or_default()) {
        (t, e) if t.contains("mpegurl") || t == "hls" || e == "m3u8" => SourceKind::Hls,
        (t, e) if t.contains("dash") || e == "mpd" => SourceKind::Dash,
        (t, e)
            if t.starts_with("audio/")
                || matches!(e, "mp3" | "m4a" | "aac" | "ogg" | "oga" | "opus") =>
        {
            SourceKind::Audio
        }
        _ => SourceKind::Video,
    }
}
