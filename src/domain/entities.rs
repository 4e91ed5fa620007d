//! Read-only content entities reconstructed from every upstream fetch.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::{PostVisibility, TagVisibility, TextDirection};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub html: String,
    pub excerpt: String,
    pub custom_excerpt: Option<String>,
    pub feature_image: Option<String>,
    pub feature_image_alt: Option<String>,
    pub feature_image_caption: Option<String>,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub reading_time: u32,
    pub featured: bool,
    pub visibility: PostVisibility,
    pub tags: Vec<Tag>,
    pub primary_tag: Option<Tag>,
    pub authors: Vec<Author>,
    pub primary_author: Option<Author>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_image: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub twitter_image: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub text_direction: TextDirection,
}

impl Post {
    /// Custom excerpt when the author wrote one, otherwise the generated excerpt.
    pub fn summary(&self) -> &str {
        self.custom_excerpt.as_deref().unwrap_or(&self.excerpt)
    }

    pub fn published_or_created(&self) -> OffsetDateTime {
        self.published_at.unwrap_or(self.created_at)
    }

    pub fn author_name(&self) -> Option<&str> {
        self.primary_author
            .as_ref()
            .or_else(|| self.authors.first())
            .map(|author| author.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub feature_image: Option<String>,
    pub visibility: TagVisibility,
    pub post_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub post_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
    pub total: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

impl Pagination {
    /// Pagination block describing an empty result set.
    pub fn empty(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            pages: 0,
            total: 0,
            next: None,
            prev: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}
