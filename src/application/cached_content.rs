//! Content operations memoized through the shared [`FetchCache`].

use std::sync::Arc;

use serde::Serialize;

use crate::application::content::{ContentService, FetchError, PostQuery, tags_or_empty};
use crate::cache::{CacheStats, FetchCache};
use crate::domain::entities::{Post, PostsPage, Tag};

#[derive(Serialize)]
struct TagArgs<'a> {
    tag: &'a str,
    page: u32,
    limit: u32,
}

#[derive(Serialize)]
struct FeaturedArgs {
    limit: u32,
}

#[derive(Serialize)]
struct SearchArgs<'a> {
    term: &'a str,
    tag: Option<&'a str>,
    page: u32,
    limit: u32,
}

#[derive(Clone)]
pub struct CachedContentService {
    content: ContentService,
    cache: Arc<FetchCache>,
}

impl CachedContentService {
    pub fn new(content: ContentService, cache: Arc<FetchCache>) -> Self {
        Self { content, cache }
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear(&self) -> usize {
        self.cache.clear()
    }

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostsPage, FetchError> {
        self.cache
            .memoize("posts", query, || self.content.list_posts(query))
            .await
    }

    pub async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, FetchError> {
        self.cache
            .memoize_present("post", slug, || self.content.post_by_slug(slug))
            .await
    }

    pub async fn posts_by_tag(
        &self,
        tag: &str,
        page: u32,
        limit: u32,
    ) -> Result<PostsPage, FetchError> {
        let args = TagArgs { tag, page, limit };
        self.cache
            .memoize("posts_by_tag", &args, || {
                self.content.posts_by_tag(tag, page, limit)
            })
            .await
    }

    pub async fn featured_posts(&self, limit: u32) -> Result<Vec<Post>, FetchError> {
        self.cache
            .memoize("featured", &FeaturedArgs { limit }, || {
                self.content.featured_posts(limit)
            })
            .await
    }

    pub async fn search_posts(
        &self,
        term: &str,
        tag: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<PostsPage, FetchError> {
        let args = SearchArgs {
            term,
            tag,
            page,
            limit,
        };
        self.cache
            .memoize("search", &args, || {
                self.content.search_posts(term, tag, page, limit)
            })
            .await
    }

    /// Public tags; failures are returned and not cached.
    pub async fn fetch_tags(&self) -> Result<Vec<Tag>, FetchError> {
        self.cache
            .memoize("tags", &(), || self.content.fetch_tags())
            .await
    }

    /// Public tags, or an empty list when the CMS cannot be reached.
    pub async fn tags(&self) -> Vec<Tag> {
        tags_or_empty(self.fetch_tags().await)
    }
}
