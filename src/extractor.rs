use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{self, ExtractionError};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::graph::Graph;
use crate::mapping::{direct_fields_from, output_record_from, playlist_from};
use crate::normalizer::{DescriptorNormalizer, JwPlayerNormalizer};
use crate::payload::resolve_payload;
use crate::relations::{list_members, series_title};
use crate::resolver::find_record;
use crate::types::{Extraction, OutputRecord, Playlist};
use crate::urls::{content_url, page_url, series_url, PageKind, PageRef};

/// Resolve a fetched content page into one record. All-or-nothing.
pub fn content_from_page(
    page: &str,
    slug: &str,
    normalizer: &dyn DescriptorNormalizer,
    free_tier_id: &str,
) -> error::Result<OutputRecord> {
    let graph = Graph::from_page(page)?;
    let record = find_record(&graph, "Content", slug).ok_or_else(|| {
        ExtractionError::MissingData(format!("failed to extract content data for {slug}"))
    })?;
    let descriptor = resolve_payload(&record, free_tier_id)?;
    let fragment = normalizer.normalize(&descriptor, slug)?;
    Ok(output_record_from(slug, fragment, direct_fields_from(&record)))
}

/// Build the playlist of a fetched series page. Only loading the state graph
/// can fail; once it is loaded, an empty member list is still a playlist.
pub fn series_from_page(page: &str, slug: &str, base: &Url) -> error::Result<Playlist> {
    let graph = Graph::from_page(page)?;
    let title = series_title(&graph, slug);
    let members = list_members(&graph, page, slug);
    if members.slugs.is_empty() {
        warn!(series = slug, "no members found for series");
    }
    Ok(playlist_from(base, slug, title, &members.slugs))
}

/// Fetches pages and runs them through the resolution pipeline.
pub struct BeaconExtractor {
    config: Config,
    base_url: Url,
    fetcher: Arc<dyn PageFetcher>,
    normalizer: Arc<dyn DescriptorNormalizer>,
}

impl BeaconExtractor {
    /// HTTP-backed extractor.
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url()?;
        let normalizer = Arc::new(JwPlayerNormalizer::with_base_url(base_url.clone()));
        Ok(Self { config, base_url, fetcher, normalizer })
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn DescriptorNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract whatever page `url` points at. The page is fetched from its
    /// canonical address under the configured base URL.
    pub async fn extract(&self, url: &str) -> Result<Extraction> {
        let page = PageRef::parse(url).ok_or_else(|| anyhow!("unsupported URL: {url}"))?;
        let canonical = page_url(&self.base_url, page.kind, &page.slug);
        match page.kind {
            PageKind::Content => {
                self.content_at(&canonical, &page.slug).await.map(Extraction::Content)
            }
            PageKind::Series => {
                self.series_at(&canonical, &page.slug).await.map(Extraction::Playlist)
            }
        }
    }

    pub async fn extract_content(&self, slug: &str) -> Result<OutputRecord> {
        self.content_at(&content_url(&self.base_url, slug), slug).await
    }

    pub async fn extract_series(&self, slug: &str) -> Result<Playlist> {
        self.series_at(&series_url(&self.base_url, slug), slug).await
    }

    /// Follow every entry of `playlist`, keeping entry order. Failures are
    /// returned per entry.
    pub async fn resolve_entries(
        &self,
        playlist: &Playlist,
    ) -> Vec<(String, Result<OutputRecord>)> {
        stream::iter(playlist.entries.iter())
            .map(|entry| async move {
                (entry.id.clone(), self.content_at(&entry.reference_url, &entry.id).await)
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }

    async fn content_at(&self, url: &str, slug: &str) -> Result<OutputRecord> {
        let page = self.fetcher.fetch_page(url).await?;
        let record =
            content_from_page(&page, slug, self.normalizer.as_ref(), &self.config.free_tier_id)?;
        info!(slug, sources = record.media_sources.len(), "extracted content");
        Ok(record)
    }

    async fn series_at(&self, url: &str, slug: &str) -> Result<Playlist> {
        let page = self.fetcher.fetch_page(url).await?;
        let playlist = series_from_page(&page, slug, &self.base_url)?;
        info!(series = slug, entries = playlist.entries.len(), "extracted series");
        Ok(playlist)
    }
}
