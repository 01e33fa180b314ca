//! Recognizing beacon.tv page URLs and building canonical ones.

use url::Url;

const HOSTS: [&str; 2] = ["beacon.tv", "www.beacon.tv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Content,
    Series,
}

impl PageKind {
    fn segment(self) -> &'static str {
        match self {
            PageKind::Content => "content",
            PageKind::Series => "series",
        }
    }
}

/// A recognized page: its kind and the slug taken from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub kind: PageKind,
    pub slug: String,
}

impl PageRef {
    /// Match `https?://(www.)?beacon.tv/{content|series}/<slug>`.
    pub fn parse(url: &str) -> Option<Self> {
        let url = Url::parse(url.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") || !HOSTS.contains(&url.host_str()?) {
            return None;
        }
        let mut segments = url.path_segments()?;
        let kind = match segments.next()? {
            "content" => PageKind::Content,
            "series" => PageKind::Series,
            _ => return None,
        };
        let slug = segments.next().filter(|s| is_slug(s))?;
        Some(Self { kind, slug: slug.to_owned() })
    }
}

/// Slugs are word characters and dashes.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

pub fn page_url(base: &Url, kind: PageKind, slug: &str) -> String {
    let mut url = base.clone();
    url.set_path(&format!("/{}/{slug}", kind.segment()));
    url.set_query(None);
    url.set_fragment(None);
    url.into()
}

pub fn content_url(base: &Url, slug: &str) -> String {
    page_url(base, PageKind::Content, slug)
}

pub fn series_url(base: &Url, slug: &str) -> String {
    page_url(base, PageKind::Series, slug)
}
