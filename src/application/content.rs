//! Content adapter contract and the query composition layered on top of it.
//!
//! `ContentApi` is the seam to the headless CMS. `ContentService` turns caller intent
//! (a page of posts, a tag listing, a search) into upstream filter expressions and maps
//! adapter failures onto the small error surface pages are expected to handle.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::domain::entities::{Post, PostsPage, Tag};
use crate::domain::types::TagVisibility;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 15;
pub const DEFAULT_INCLUDE: &str = "tags,authors";
pub const DEFAULT_FEATURED_LIMIT: u32 = 6;

#[derive(Debug, Clone, Error)]
pub enum ContentError {
    #[error("request for {resource} failed: {message}")]
    Transport {
        resource: &'static str,
        message: String,
    },
    #[error("{resource} request returned status {status}: {message}")]
    Status {
        resource: &'static str,
        status: u16,
        message: String,
    },
    #[error("{resource} response could not be decoded: {message}")]
    Decode {
        resource: &'static str,
        message: String,
    },
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
}

impl ContentError {
    pub fn transport(resource: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            resource,
            message: err.to_string(),
        }
    }

    pub fn decode(resource: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            resource,
            message: err.to_string(),
        }
    }
}

/// Generic failure surfaced to pages; the adapter error stays reachable as the source.
#[derive(Debug, Clone, Error)]
#[error("failed to fetch {resource}")]
pub struct FetchError {
    pub resource: &'static str,
    #[source]
    pub source: ContentError,
}

/// Parameters of one upstream posts browse request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsePosts {
    pub page: u32,
    pub limit: u32,
    pub filter: Option<String>,
    pub include: String,
}

#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn browse_posts(&self, params: &BrowsePosts) -> Result<PostsPage, ContentError>;

    /// Fails with [`ContentError::NotFound`] when the slug is unknown upstream.
    async fn read_post_by_slug(&self, slug: &str, include: &str) -> Result<Post, ContentError>;

    /// Every tag with its post count aggregate.
    async fn browse_tags(&self) -> Result<Vec<Tag>, ContentError>;
}

/// Caller-facing list query. Its serialized form doubles as the cache key argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostQuery {
    pub page: u32,
    pub limit: u32,
    pub filter: Option<String>,
    pub search: Option<String>,
    pub include: String,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            filter: None,
            search: None,
            include: DEFAULT_INCLUDE.to_string(),
        }
    }
}

impl PostQuery {
    pub fn by_tag(tag: &str) -> Self {
        Self::default().with_filter(format!("tag:{}", tag.trim()))
    }

    pub fn featured(limit: u32) -> Self {
        Self::default()
            .with_filter("featured:true")
            .with_limit(limit)
    }

    pub fn search(term: &str, tag: Option<&str>) -> Self {
        let query = match tag {
            Some(tag) => Self::by_tag(tag),
            None => Self::default(),
        };
        query.with_search(term)
    }

    pub fn with_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn with_limit(self, limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..self
        }
    }

    pub fn with_filter(self, filter: impl Into<String>) -> Self {
        Self {
            filter: non_blank(filter.into()),
            ..self
        }
    }

    pub fn with_search(self, term: impl Into<String>) -> Self {
        Self {
            search: non_blank(term.into()),
            ..self
        }
    }

    /// Filter expression sent upstream: the explicit filter AND a title-contains
    /// predicate for the search term.
    pub fn effective_filter(&self) -> Option<String> {
        let search = self.search.as_deref().map(title_contains);
        match (self.filter.as_deref(), search) {
            (Some(filter), Some(search)) => Some(format!("{filter}+{search}")),
            (Some(filter), None) => Some(filter.to_string()),
            (None, Some(search)) => Some(search),
            (None, None) => None,
        }
    }

    pub fn to_browse(&self) -> BrowsePosts {
        BrowsePosts {
            page: self.page,
            limit: self.limit,
            filter: self.effective_filter(),
            include: self.include.clone(),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Case-insensitive substring match on the title, quoted for the filter language.
fn title_contains(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('\'', "\\'");
    format!("title:~'{escaped}'")
}

/// Query composition over a [`ContentApi`].
#[derive(Clone)]
pub struct ContentService {
    api: Arc<dyn ContentApi>,
}

impl ContentService {
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self { api }
    }

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostsPage, FetchError> {
        self.api
            .browse_posts(&query.to_browse())
            .await
            .map_err(|source| {
                warn!(
                    target = "folio::content",
                    page = query.page,
                    limit = query.limit,
                    filter = query.effective_filter().as_deref().unwrap_or(""),
                    error = %source,
                    "post listing failed"
                );
                FetchError {
                    resource: "posts",
                    source,
                }
            })
    }

    /// Upstream not-found is absence, never an error.
    pub async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, FetchError> {
        match self.api.read_post_by_slug(slug, DEFAULT_INCLUDE).await {
            Ok(post) => Ok(Some(post)),
            Err(ContentError::NotFound { .. }) => Ok(None),
            Err(source) => {
                warn!(
                    target = "folio::content",
                    slug,
                    error = %source,
                    "post lookup failed"
                );
                Err(FetchError {
                    resource: "post",
                    source,
                })
            }
        }
    }

    pub async fn posts_by_tag(
        &self,
        tag: &str,
        page: u32,
        limit: u32,
    ) -> Result<PostsPage, FetchError> {
        let query = PostQuery::by_tag(tag).with_page(page).with_limit(limit);
        self.list_posts(&query).await
    }

    pub async fn featured_posts(&self, limit: u32) -> Result<Vec<Post>, FetchError> {
        let page = self.list_posts(&PostQuery::featured(limit)).await?;
        Ok(page.posts)
    }

    pub async fn search_posts(
        &self,
        term: &str,
        tag: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<PostsPage, FetchError> {
        let query = PostQuery::search(term, tag)
            .with_page(page)
            .with_limit(limit);
        self.list_posts(&query).await
    }

    /// Public tags with their post counts.
    pub async fn fetch_tags(&self) -> Result<Vec<Tag>, FetchError> {
        let tags = self.api.browse_tags().await.map_err(|source| FetchError {
            resource: "tags",
            source,
        })?;
        Ok(tags
            .into_iter()
            .filter(|tag| tag.visibility == TagVisibility::Public)
            .collect())
    }

    /// Like [`Self::fetch_tags`] but degrades to an empty list.
    pub async fn tags(&self) -> Vec<Tag> {
        tags_or_empty(self.fetch_tags().await)
    }
}

/// A failed tag listing reads as no tags at all.
pub(crate) fn tags_or_empty(listing: Result<Vec<Tag>, FetchError>) -> Vec<Tag> {
    match listing {
        Ok(tags) => tags,
        Err(err) => {
            warn!(
                target = "folio::content",
                error = %err.source,
                "tag listing failed, continuing without tags"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_alone_becomes_title_predicate() {
        let query = PostQuery::default().with_search("kafka");
        assert_eq!(query.effective_filter().as_deref(), Some("title:~'kafka'"));
    }

    #[test]
    fn search_is_and_combined_with_existing_filter() {
        let query = PostQuery::search("kafka", Some("streaming"));
        assert_eq!(
            query.effective_filter().as_deref(),
            Some("tag:streaming+title:~'kafka'")
        );
    }

    #[test]
    fn blank_search_and_filter_are_ignored() {
        let query = PostQuery::default().with_search("   ").with_filter("");
        assert_eq!(query.effective_filter(), None);
    }

    #[test]
    fn quotes_in_search_are_escaped() {
        let query = PostQuery::default().with_search("rust's ownership");
        assert_eq!(
            query.effective_filter().as_deref(),
            Some("title:~'rust\\'s ownership'")
        );
    }

    #[test]
    fn defaults_match_listing_contract() {
        let browse = PostQuery::default().to_browse();
        assert_eq!(browse.page, 1);
        assert_eq!(browse.limit, 15);
        assert_eq!(browse.include, "tags,authors");
        assert_eq!(browse.filter, None);
    }

    #[test]
    fn featured_query_uses_caller_limit() {
        let browse = PostQuery::featured(6).to_browse();
        assert_eq!(browse.filter.as_deref(), Some("featured:true"));
        assert_eq!(browse.limit, 6);
    }

    #[test]
    fn page_below_one_clamps() {
        assert_eq!(PostQuery::default().with_page(0).page, 1);
    }
}
