//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use folio::application::blog::BlogService;
use folio::application::cached_content::CachedContentService;
use folio::application::content::{BrowsePosts, ContentApi, ContentError, ContentService};
use folio::application::profile::ProfileService;
use folio::application::sitemap::SitemapService;
use folio::application::syndication::SyndicationService;
use folio::cache::{CacheConfig, FetchCache};
use folio::config::SiteSettings;
use folio::domain::entities::{Author, Pagination, Post, PostsPage, Tag};
use folio::domain::types::{PostVisibility, TagVisibility, TextDirection};
use folio::infra::http::{AdminState, HttpState};
use time::{Duration, macros::datetime};

pub fn site() -> SiteSettings {
    SiteSettings {
        url: "https://folio.test".to_string(),
        name: "Folio Test".to_string(),
        description: "Writing about systems".to_string(),
        author: "Test Author".to_string(),
        locale: "en_US".to_string(),
        twitter_handle: None,
        default_image: None,
    }
}

pub fn tag(name: &str, count: u32) -> Tag {
    Tag {
        id: format!("tag-{}", name.to_lowercase()),
        name: name.to_string(),
        slug: name.to_lowercase(),
        description: None,
        feature_image: None,
        visibility: TagVisibility::Public,
        post_count: Some(count),
    }
}

pub fn post(index: usize) -> Post {
    let kafka = tag("Kafka", 4);
    Post {
        id: format!("id-{index}"),
        title: format!("Post {index}"),
        slug: format!("post-{index}"),
        html: "<p>Streams <strong>everywhere</strong></p>".to_string(),
        excerpt: "Streams everywhere".to_string(),
        custom_excerpt: None,
        feature_image: None,
        feature_image_alt: None,
        feature_image_caption: None,
        published_at: Some(datetime!(2024-05-01 09:00 UTC) - Duration::days(index as i64)),
        created_at: datetime!(2024-04-01 09:00 UTC),
        updated_at: datetime!(2024-05-02 09:00 UTC) - Duration::days(index as i64),
        reading_time: 3,
        featured: index == 0,
        visibility: PostVisibility::Public,
        tags: vec![kafka.clone()],
        primary_tag: Some(kafka),
        authors: Vec::new(),
        primary_author: Some(Author {
            id: "author-1".to_string(),
            name: "Test Author".to_string(),
            slug: "test-author".to_string(),
            profile_image: None,
            cover_image: None,
            bio: None,
            website: None,
            location: None,
            twitter: None,
            facebook: None,
            post_count: None,
        }),
        meta_title: None,
        meta_description: None,
        og_image: None,
        og_title: None,
        og_description: None,
        twitter_image: None,
        twitter_title: None,
        twitter_description: None,
        text_direction: TextDirection::Ltr,
    }
}

pub fn posts(count: usize) -> Vec<Post> {
    (0..count).map(post).collect()
}

/// Content source over a fixed post list; counts every upstream call.
pub struct StubContent {
    posts: Vec<Post>,
    tags: Vec<Tag>,
    failing: bool,
    pub browse_calls: AtomicUsize,
    pub slug_calls: AtomicUsize,
    pub tag_calls: AtomicUsize,
}

impl StubContent {
    pub fn new(posts: Vec<Post>, tags: Vec<Tag>) -> Self {
        Self {
            posts,
            tags,
            failing: false,
            browse_calls: AtomicUsize::new(0),
            slug_calls: AtomicUsize::new(0),
            tag_calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            failing: true,
            ..Self::new(Vec::new(), Vec::new())
        }
    }

    pub fn browse_count(&self) -> usize {
        self.browse_calls.load(Ordering::SeqCst)
    }

    fn refused(resource: &'static str) -> ContentError {
        ContentError::Transport {
            resource,
            message: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl ContentApi for StubContent {
    async fn browse_posts(&self, params: &BrowsePosts) -> Result<PostsPage, ContentError> {
        self.browse_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.failing {
            return Err(Self::refused("posts"));
        }

        let matching: Vec<&Post> = match params.filter.as_deref() {
            Some("featured:true") => self.posts.iter().filter(|post| post.featured).collect(),
            Some(filter) if filter.starts_with("tag:") => {
                let slug = filter.trim_start_matches("tag:");
                self.posts
                    .iter()
                    .filter(|post| post.tags.iter().any(|tag| tag.slug == slug))
                    .collect()
            }
            _ => self.posts.iter().collect(),
        };

        let limit = params.limit.max(1);
        let page = params.page.max(1);
        let total = matching.len() as u32;
        let pages = total.div_ceil(limit);
        let posts = matching
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(PostsPage {
            posts,
            pagination: Pagination {
                page,
                limit,
                pages,
                total,
                next: (page < pages).then_some(page + 1),
                prev: (page > 1).then_some(page - 1),
            },
        })
    }

    async fn read_post_by_slug(&self, slug: &str, _include: &str) -> Result<Post, ContentError> {
        self.slug_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::refused("post"));
        }
        self.posts
            .iter()
            .find(|post| post.slug == slug)
            .cloned()
            .ok_or(ContentError::NotFound { resource: "post" })
    }

    async fn browse_tags(&self) -> Result<Vec<Tag>, ContentError> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::refused("tags"));
        }
        Ok(self.tags.clone())
    }
}

pub fn cached_content(api: Arc<StubContent>, cache: Arc<FetchCache>) -> CachedContentService {
    CachedContentService::new(ContentService::new(api), cache)
}

pub fn default_cache() -> Arc<FetchCache> {
    Arc::new(FetchCache::new(CacheConfig::default()))
}

/// Public and admin state wired the same way the binary wires them.
pub fn states(api: Arc<StubContent>) -> (HttpState, AdminState) {
    let cache = default_cache();
    let content = cached_content(api, cache.clone());
    let site = site();
    let profile = ProfileService::embedded().expect("embedded profile parses");

    let http = HttpState {
        blog: Arc::new(BlogService::new(content.clone(), site.clone())),
        profile: Arc::new(profile),
        sitemap: Arc::new(SitemapService::new(content.clone(), site.clone())),
        syndication: Arc::new(SyndicationService::new(content, site.clone())),
        site: Arc::new(site),
    };
    (http, AdminState { cache })
}
