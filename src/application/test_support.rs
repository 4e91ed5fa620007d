//! Fixtures shared by the application unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::{Duration, macros::datetime};

use crate::application::content::{BrowsePosts, ContentApi, ContentError};
use crate::config::SiteSettings;
use crate::domain::entities::{Author, Pagination, Post, PostsPage, Tag};
use crate::domain::types::{PostVisibility, TagVisibility, TextDirection};

pub fn site() -> SiteSettings {
    SiteSettings {
        url: "https://example.dev".to_string(),
        name: "Example".to_string(),
        description: "Notes on systems".to_string(),
        author: "Ada Example".to_string(),
        locale: "en_US".to_string(),
        twitter_handle: Some("@ada".to_string()),
        default_image: Some("https://example.dev/og.png".to_string()),
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

pub fn post(slug: &str) -> Post {
    let rust = tag("Rust", 3);
    Post {
        id: format!("id-{slug}"),
        title: "Hello".to_string(),
        slug: slug.to_string(),
        html: "<p>Hello <strong>world</strong></p>".to_string(),
        excerpt: "Hello world".to_string(),
        custom_excerpt: None,
        feature_image: Some(format!("https://cdn.example.dev/{slug}.jpg")),
        feature_image_alt: None,
        feature_image_caption: None,
        published_at: Some(datetime!(2024-03-02 10:00 UTC)),
        created_at: datetime!(2024-03-01 10:00 UTC),
        updated_at: datetime!(2024-03-03 10:00 UTC),
        reading_time: 4,
        featured: false,
        visibility: PostVisibility::Public,
        tags: vec![rust.clone()],
        primary_tag: Some(rust),
        authors: Vec::new(),
        primary_author: Some(Author {
            id: "author-grace".to_string(),
            name: "Grace".to_string(),
            slug: "grace".to_string(),
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

/// `count` posts, newest first, updated one day apart.
pub fn posts(count: usize) -> Vec<Post> {
    (0..count)
        .map(|index| {
            let mut post = post(&format!("post-{index}"));
            post.title = format!("Post {index}");
            post.updated_at -= Duration::days(index as i64);
            post
        })
        .collect()
}

pub fn page_of(posts: Vec<Post>, page: u32, limit: u32, total: u32) -> PostsPage {
    let pages = total.div_ceil(limit.max(1));
    PostsPage {
        posts,
        pagination: Pagination {
            page,
            limit,
            pages,
            total,
            next: (page < pages).then_some(page + 1),
            prev: (page > 1).then_some(page - 1),
        },
    }
}

/// In-memory content source that pages over a fixed post list and records requests.
pub struct FakeContent {
    pub posts: Vec<Post>,
    pub tags: Vec<Tag>,
    pub fail_posts: bool,
    pub fail_tags: bool,
    pub requests: Mutex<Vec<BrowsePosts>>,
    pub slug_reads: AtomicUsize,
}

impl FakeContent {
    pub fn new(posts: Vec<Post>, tags: Vec<Tag>) -> Self {
        Self {
            posts,
            tags,
            fail_posts: false,
            fail_tags: false,
            requests: Mutex::new(Vec::new()),
            slug_reads: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_posts: true,
            fail_tags: true,
            ..Self::new(Vec::new(), Vec::new())
        }
    }

    pub fn recorded(&self) -> Vec<BrowsePosts> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn unavailable(resource: &'static str) -> ContentError {
        ContentError::Transport {
            resource,
            message: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl ContentApi for FakeContent {
    async fn browse_posts(&self, request: &BrowsePosts) -> Result<PostsPage, ContentError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if self.fail_posts {
            return Err(Self::unavailable("posts"));
        }

        let matching: Vec<Post> = match request.filter.as_deref() {
            Some(filter) if filter.starts_with("tag:") => {
                let slug = filter.trim_start_matches("tag:");
                self.posts
                    .iter()
                    .filter(|post| post.tags.iter().any(|tag| tag.slug == slug))
                    .cloned()
                    .collect()
            }
            Some("featured:true") => self
                .posts
                .iter()
                .filter(|post| post.featured)
                .cloned()
                .collect(),
            _ => self.posts.clone(),
        };

        let limit = request.limit.max(1);
        let start = ((request.page.max(1) - 1) * limit) as usize;
        let slice = matching
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(page_of(slice, request.page.max(1), limit, matching.len() as u32))
    }

    async fn read_post_by_slug(&self, slug: &str, _include: &str) -> Result<Post, ContentError> {
        self.slug_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_posts {
            return Err(Self::unavailable("post"));
        }
        self.posts
            .iter()
            .find(|post| post.slug == slug)
            .cloned()
            .ok_or(ContentError::NotFound { resource: "post" })
    }

    async fn browse_tags(&self) -> Result<Vec<Tag>, ContentError> {
        if self.fail_tags {
            return Err(Self::unavailable("tags"));
        }
        Ok(self.tags.clone())
    }
}
