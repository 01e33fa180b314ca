use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use beacon_extract::prelude::*;
use beacon_extract::normalizer::JwPlayerNormalizer;
use beacon_extract::payload::{MediaDescriptor, FREE_TIER_ID};
use beacon_extract::types::MediaFragment;
use beacon_extract::{content_from_page, series_from_page};
use serde_json::{json, Value};
use url::Url;

#[derive(Default)]
struct StaticFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    fn with(mut self, url: &str, body: String) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| anyhow!("404 for {url}"))
    }
}

fn page(state: &Value, body: &str) -> String {
    let data = json!({
        "props": {"pageProps": {"__APOLLO_STATE__": state}},
        "buildId": "b"
    });
    format!(
        "<!DOCTYPE html><html><body><div id=\"__next\">{body}</div>\
         <script id=\"__NEXT_DATA__\" type=\"application/json\">{data}</script></body></html>"
    )
}

fn player(media_id: &str, title: &str) -> String {
    json!({
        "playlist": [{
            "title": title,
            "mediaid": media_id,
            "image": format!("https://cdn.jwplayer.com/v2/media/{media_id}/poster.jpg?width=720"),
            "duration": 105.494,
            "sources": [
                {"file": format!("https://cdn.jwplayer.com/manifests/{media_id}.m3u8"),
                 "type": "application/vnd.apple.mpegurl"},
                {"file": format!("https://cdn.jwplayer.com/videos/{media_id}-x.mp4"),
                 "type": "video/mp4", "height": 720, "width": 1280}
            ]
        }]
    })
    .to_string()
}

fn welcome_state() -> Value {
    json!({
        "ROOT_QUERY": {"__typename": "Query"},
        "MemberTier:65b258d178f89be87b4dc0a4": {"name": "Free"},
        "Content:663d0a1d": {
            "slug": "welcome-to-beacon",
            "contentType": "video",
            "title": "Welcome",
            "description": "Your home for Critical Role!",
            "publishedAt": "2024-05-09T00:00:00Z",
            "contentTier": {"__ref": FREE_TIER_ID},
            "contentVideo": {"video": {"videoData": player("I4CkkEvN", "Player title")}}
        }
    })
}

fn extractor(fetcher: Arc<StaticFetcher>) -> BeaconExtractor {
    BeaconExtractor::with_fetcher(Config::default(), fetcher).unwrap()
}

fn content(page: &str, slug: &str) -> Result<OutputRecord, ExtractionError> {
    content_from_page(page, slug, &JwPlayerNormalizer::new(), FREE_TIER_ID)
}

fn base() -> Url {
    Url::parse("https://beacon.tv").unwrap()
}

#[tokio::test]
async fn content_page_resolves_to_record() {
    let fetcher = Arc::new(StaticFetcher::default().with(
        "https://beacon.tv/content/welcome-to-beacon",
        page(&welcome_state(), ""),
    ));
    let ex = extractor(fetcher);
    assert_eq!(ex.config().base_url, "https://beacon.tv");
    let record = ex.extract_content("welcome-to-beacon").await.unwrap();
    assert_eq!(record.id, "welcome-to-beacon");
    assert_eq!(record.timestamp, Some(1_715_227_200));
    assert_eq!(record.title.as_deref(), Some("Welcome"));
    assert_eq!(record.description.as_deref(), Some("Your home for Critical Role!"));
    assert_eq!(record.duration, Some(105.494));
    assert_eq!(
        record.thumbnail.as_deref(),
        Some("https://cdn.jwplayer.com/v2/media/I4CkkEvN/poster.jpg?width=720")
    );
    assert_eq!(record.media_sources.len(), 2);
    assert_eq!(record.media_sources[0].kind, SourceKind::Hls);
}

#[test]
fn podcast_payload_is_used_when_video_is_absent() {
    let state = json!({
        "Content:1": {
            "slug": "cr-podcast",
            "contentType": "podcast",
            "contentPodcast": {"podcast": {"audioData": json!({
                "sources": [{"file": "https://cdn.example.com/ep.mp3", "type": "audio/mpeg"}]
            }).to_string()}}
        }
    });
    let record = content(&page(&state, ""), "cr-podcast").unwrap();
    assert_eq!(record.media_sources[0].kind, SourceKind::Audio);
    assert_eq!(record.title, None);
}

#[test]
fn article_is_unsupported_content() {
    let state = json!({
        "Content:1": {"slug": "news", "contentType": "article", "title": "News"}
    });
    let err = content(&page(&state, ""), "news").unwrap_err();
    assert_eq!(
        err,
        ExtractionError::UnsupportedContent { content_type: "article".into() }
    );
    assert!(err.is_expected());
}

#[tokio::test]
async fn members_only_video_requires_auth() {
    let state = json!({
        "Content:1": {
            "slug": "c4e1",
            "contentType": "video",
            "contentTier": {"__ref": "MemberTier:premium"}
        }
    });
    let fetcher = Arc::new(
        StaticFetcher::default().with("https://beacon.tv/content/c4e1", page(&state, "")),
    );
    let err = extractor(fetcher)
        .extract("https://beacon.tv/content/c4e1")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExtractionError>(),
        Some(ExtractionError::AuthRequired { tier }) if tier == "MemberTier:premium"
    ));
}

#[test]
fn page_without_state_is_missing_data() {
    let err = content("<html><body><h1>Beacon</h1></body></html>", "welcome-to-beacon")
        .unwrap_err();
    assert!(matches!(err, ExtractionError::MissingData(_)));
}

#[test]
fn unknown_slug_is_missing_data() {
    let err = content(&page(&welcome_state(), ""), "not-here").unwrap_err();
    assert!(matches!(err, ExtractionError::MissingData(_)));
}

fn cooldown_state() -> Value {
    json!({
        "Series:critical-cooldown": {"slug": "critical-cooldown", "title": "Critical Cooldown"},
        "Content:b": {"slug": "cooldown-ep-2", "series": {"__ref": "Series:critical-cooldown"}},
        "Content:x": {"slug": "unrelated", "series": {"__ref": "Series:4-sided-dive"}},
        "Content:a": {"slug": "cooldown-ep-1", "series": {"__ref": "Series:critical-cooldown"}},
        "Content:c": {"slug": "cooldown-ep-3", "series": {"__ref": "Series:critical-cooldown"}}
    })
}

#[test]
fn series_falls_back_to_graph_back_references() {
    let html = page(&cooldown_state(), "<p>Loading…</p>");
    let playlist = series_from_page(&html, "critical-cooldown", &base()).unwrap();
    assert_eq!(playlist.title, "Critical Cooldown");
    let ids: Vec<_> = playlist.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["cooldown-ep-2", "cooldown-ep-1", "cooldown-ep-3"]);
    assert_eq!(playlist.entries[0].reference_url, "https://beacon.tv/content/cooldown-ep-2");
    assert_eq!(playlist.entries[0].extractor_tag, "BeaconTv");
}

#[test]
fn role_links_short_circuit_other_tiers() {
    let body = r#"<a role="link" href="/content/from-links">x</a>
                  <a href="/content/plain">y</a>"#;
    let html = page(&cooldown_state(), body);
    let playlist = series_from_page(&html, "critical-cooldown", &base()).unwrap();
    let ids: Vec<_> = playlist.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["from-links"]);
}

#[test]
fn series_without_state_is_missing_data() {
    let html = r#"<html><a href="/content/ep-1">1</a></html>"#;
    let err = series_from_page(html, "critical-cooldown", &base()).unwrap_err();
    assert!(matches!(err, ExtractionError::MissingData(_)));

    let broken = r#"<a href="/content/ep-1">1</a>
        <script id="__NEXT_DATA__" type="application/json">{"props": </script>"#;
    let err = series_from_page(broken, "critical-cooldown", &base()).unwrap_err();
    assert!(matches!(err, ExtractionError::MissingData(_)));
}

#[tokio::test]
async fn series_fetch_without_state_fails() {
    let fetcher = Arc::new(StaticFetcher::default().with(
        "https://beacon.tv/series/critical-cooldown",
        r#"<html><a href="/content/ep-1">1</a></html>"#.to_string(),
    ));
    let err = extractor(fetcher).extract_series("critical-cooldown").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExtractionError>(),
        Some(ExtractionError::MissingData(_))
    ));
}

#[test]
fn series_with_state_but_no_members_is_empty() {
    let state = json!({"Series:s": {"slug": "s", "title": "S"}});
    let playlist = series_from_page(&page(&state, "<p>soon</p>"), "s", &base()).unwrap();
    assert_eq!(playlist.title, "S");
    assert!(playlist.entries.is_empty());
}

struct FixedNormalizer;

impl DescriptorNormalizer for FixedNormalizer {
    fn normalize(
        &self,
        _descriptor: &MediaDescriptor,
        _id: &str,
    ) -> Result<MediaFragment, ExtractionError> {
        Ok(MediaFragment {
            title: Some("From normalizer".into()),
            duration: Some(1.0),
            ..MediaFragment::default()
        })
    }
}

#[tokio::test]
async fn custom_normalizer_replaces_player_parsing() {
    let fetcher = Arc::new(StaticFetcher::default().with(
        "https://beacon.tv/content/welcome-to-beacon",
        page(&welcome_state(), ""),
    ));
    let ex = extractor(fetcher).with_normalizer(Arc::new(FixedNormalizer));
    let record = ex.extract_content("welcome-to-beacon").await.unwrap();
    assert_eq!(record.title.as_deref(), Some("Welcome"));
    assert_eq!(record.duration, Some(1.0));
    assert!(record.media_sources.is_empty());
}

#[tokio::test]
async fn playlist_entries_resolve_lazily_in_order() {
    let mut state = welcome_state();
    state["Content:second"] = json!({
        "slug": "second",
        "contentType": "video",
        "title": "Second",
        "contentVideo": {"video": {"videoData": player("Zz9", "Second")}}
    });
    let series = json!({
        "Series:s": {"slug": "s", "title": "S"},
    });
    let body = r#"<a role="link" href="/content/second">2</a>
                  <a role="link" href="/content/welcome-to-beacon">1</a>
                  <a role="link" href="/content/gone">x</a>"#;
    let fetcher = Arc::new(
        StaticFetcher::default()
            .with("https://beacon.tv/series/s", page(&series, body))
            .with("https://beacon.tv/content/second", page(&state, ""))
            .with("https://beacon.tv/content/welcome-to-beacon", page(&state, "")),
    );
    let ex = extractor(fetcher.clone());

    let playlist = match ex.extract("https://www.beacon.tv/series/s").await.unwrap() {
        Extraction::Playlist(p) => p,
        other => panic!("expected playlist, got {other:?}"),
    };
    assert_eq!(playlist.title, "S");
    assert_eq!(playlist.entries.len(), 3);
    // listing a series fetches only the series page
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    let resolved = ex.resolve_entries(&playlist).await;
    let ids: Vec<_> = resolved.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["second", "welcome-to-beacon", "gone"]);
    assert_eq!(resolved[0].1.as_ref().unwrap().title.as_deref(), Some("Second"));
    assert_eq!(resolved[1].1.as_ref().unwrap().title.as_deref(), Some("Welcome"));
    assert!(resolved[2].1.is_err());
}

#[tokio::test]
async fn unsupported_urls_are_rejected_without_fetching() {
    let fetcher = Arc::new(StaticFetcher::default());
    let err = extractor(fetcher.clone())
        .extract("https://example.com/content/x")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported URL"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn output_serializes_with_type_tag() {
    let html = page(&cooldown_state(), "");
    let playlist = series_from_page(&html, "critical-cooldown", &base()).unwrap();
    let value = serde_json::to_value(Extraction::Playlist(playlist)).unwrap();
    assert_eq!(value["type"], "playlist");
    assert_eq!(value["id"], "critical-cooldown");
    assert_eq!(value["entries"].as_array().map(Vec::len), Some(3));
}
