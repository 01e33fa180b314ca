//! Listing the content records that belong to a series.
//!
//! Tiers are tried in order and the first one producing any slug wins:
//!
//! 1. anchors marked `role="link"` pointing at `/content/<slug>`;
//! 2. any `href="/content/<slug>"` attribute;
//! 3. `Content:*` records whose `series` reference names the series.
//!
//! Pattern scanning runs before the structured lookup because rendered pages
//! sometimes drop the back-references from the embedded state. Nothing here
//! fails: the worst case is an empty list.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::graph::{is_record_of, Graph};
use crate::query::{Kind, Path};
use crate::resolver::{record_query, Record};

static ANCHOR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("anchor regex should compile"));
// Attribute names must follow whitespace so `data-role=` and `data-href=`
// are not taken for `role=` and `href=`.
static LINK_ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\srole\s*=\s*["']link["']"#).expect("role regex should compile")
});
static CONTENT_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\shref="/content/([\w-]+)""#).expect("content href regex should compile")
});

/// Which strategy produced a member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    RoleLinks,
    Hrefs,
    Graph,
}

/// Ordered, distinct member slugs and the tier they came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Members {
    pub slugs: Vec<String>,
    pub tier: Option<Tier>,
}

/// Member slugs of `series_slug`, first-seen order, duplicates dropped.
pub fn list_members(graph: &Graph, page: &str, series_slug: &str) -> Members {
    let mut seen = HashSet::new();
    for tier in [Tier::RoleLinks, Tier::Hrefs, Tier::Graph] {
        let found = match tier {
            Tier::RoleLinks => role_link_slugs(page),
            Tier::Hrefs => href_slugs(page),
            Tier::Graph => graph_slugs(graph, series_slug),
        };
        let slugs: Vec<String> = found.into_iter().filter(|s| seen.insert(s.clone())).collect();
        debug!(series = series_slug, ?tier, found = slugs.len(), "member scan");
        if !slugs.is_empty() {
            return Members { slugs, tier: Some(tier) };
        }
    }
    Members::default()
}

fn role_link_slugs(page: &str) -> Vec<String> {
    ANCHOR_TAG
        .find_iter(page)
        .map(|m| m.as_str())
        .filter(|tag| LINK_ROLE.is_match(tag))
        .filter_map(|tag| CONTENT_HREF.captures(tag))
        .map(|c| c[1].to_owned())
        .collect()
}

fn href_slugs(page: &str) -> Vec<String> {
    CONTENT_HREF
        .captures_iter(page)
        .map(|c| c[1].to_owned())
        .collect()
}

fn graph_slugs(graph: &Graph, series_slug: &str) -> Vec<String> {
    let series_id = format!("Series:{series_slug}");
    let path = Path::new()
        .filter(move |key, value| {
            is_record_of(key, "Content")
                && Record::new(value).and_then(|r| r.reference("series"))
                    == Some(series_id.as_str())
        })
        .key("slug")
        .kind(Kind::String);
    path.evaluate(graph.root())
        .filter_map(|slug| slug.as_str().map(str::to_owned))
        .collect()
}

/// Title of the series record, defaulting to the slug.
pub fn series_title(graph: &Graph, series_slug: &str) -> String {
    Path::new()
        .branch([
            record_query("Series", series_slug),
            Path::new().key(format!("Series:{series_slug}")),
        ])
        .key("title")
        .kind(Kind::String)
        .any()
        .string(graph.root())
        .unwrap_or_else(|| series_slug.to_owned())
}
