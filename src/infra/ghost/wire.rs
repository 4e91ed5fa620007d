//! Ghost Content API payloads and their normalization into domain entities.

use serde::Deserialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::domain::entities::{Author, Pagination, Post, PostsPage, Tag};
use crate::domain::types::{PostVisibility, TagVisibility, TextDirection};

#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    #[serde(default)]
    pub posts: Vec<GhostPost>,
    #[serde(default)]
    pub meta: Option<GhostMeta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsEnvelope {
    #[serde(default)]
    pub tags: Vec<GhostTag>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorsEnvelope {
    #[serde(default)]
    pub errors: Vec<GhostErrorItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhostErrorItem {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhostMeta {
    pub pagination: GhostPagination,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhostPagination {
    pub page: u32,
    pub limit: GhostLimit,
    pub pages: u32,
    pub total: u32,
    #[serde(default)]
    pub next: Option<u32>,
    #[serde(default)]
    pub prev: Option<u32>,
}

/// `limit` is numeric, or the literal `"all"` for unbounded browse requests.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum GhostLimit {
    Count(u32),
    Keyword(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GhostPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub html: Option<String>,
    pub excerpt: Option<String>,
    pub custom_excerpt: Option<String>,
    pub feature_image: Option<String>,
    pub feature_image_alt: Option<String>,
    pub feature_image_caption: Option<String>,
    pub published_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub reading_time: Option<u32>,
    pub featured: bool,
    pub visibility: Option<String>,
    pub tags: Vec<GhostTag>,
    pub primary_tag: Option<GhostTag>,
    pub authors: Vec<GhostAuthor>,
    pub primary_author: Option<GhostAuthor>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_image: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub twitter_image: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub codeinjection_head: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GhostTag {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub feature_image: Option<String>,
    pub visibility: Option<String>,
    pub count: Option<GhostCount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GhostAuthor {
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
    pub count: Option<GhostCount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GhostCount {
    pub posts: Option<u32>,
}

impl PostsEnvelope {
    pub fn into_page(self, requested_limit: u32) -> Result<PostsPage, String> {
        let posts = self
            .posts
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let pagination = match self.meta {
            Some(meta) => meta.pagination.into_domain(requested_limit),
            None => Pagination {
                total: posts.len() as u32,
                pages: u32::from(!posts.is_empty()),
                ..Pagination::empty(requested_limit)
            },
        };
        Ok(PostsPage { posts, pagination })
    }
}

impl GhostPagination {
    fn into_domain(self, requested_limit: u32) -> Pagination {
        let limit = match self.limit {
            GhostLimit::Count(limit) => limit,
            // `limit=all` answers with every record on one page.
            GhostLimit::Keyword(keyword) if keyword == "all" => self.total.max(requested_limit),
            GhostLimit::Keyword(_) => requested_limit,
        };
        Pagination {
            page: self.page,
            limit,
            pages: self.pages,
            total: self.total,
            next: self.next,
            prev: self.prev,
        }
    }
}

impl TryFrom<GhostPost> for Post {
    type Error = String;

    fn try_from(raw: GhostPost) -> Result<Self, Self::Error> {
        let published_at = parse_timestamp(&raw.slug, "published_at", raw.published_at)?;
        let created_at = parse_timestamp(&raw.slug, "created_at", raw.created_at)?;
        let updated_at = parse_timestamp(&raw.slug, "updated_at", raw.updated_at)?;

        let created_at = created_at
            .or(published_at)
            .ok_or_else(|| format!("post `{}` carries no timestamps", raw.slug))?;
        let updated_at = updated_at.or(published_at).unwrap_or(created_at);

        Ok(Post {
            text_direction: text_direction(raw.codeinjection_head.as_deref()),
            id: raw.id,
            title: raw.title,
            slug: raw.slug,
            html: raw.html.unwrap_or_default(),
            excerpt: raw.excerpt.unwrap_or_default(),
            custom_excerpt: present(raw.custom_excerpt),
            feature_image: present(raw.feature_image),
            feature_image_alt: present(raw.feature_image_alt),
            feature_image_caption: present(raw.feature_image_caption),
            published_at,
            created_at,
            updated_at,
            reading_time: raw.reading_time.unwrap_or(0),
            featured: raw.featured,
            visibility: post_visibility(raw.visibility.as_deref()),
            tags: raw.tags.into_iter().map(Tag::from).collect(),
            primary_tag: raw.primary_tag.map(Tag::from),
            authors: raw.authors.into_iter().map(Author::from).collect(),
            primary_author: raw.primary_author.map(Author::from),
            meta_title: present(raw.meta_title),
            meta_description: present(raw.meta_description),
            og_image: present(raw.og_image),
            og_title: present(raw.og_title),
            og_description: present(raw.og_description),
            twitter_image: present(raw.twitter_image),
            twitter_title: present(raw.twitter_title),
            twitter_description: present(raw.twitter_description),
        })
    }
}

impl From<GhostTag> for Tag {
    fn from(raw: GhostTag) -> Self {
        let visibility = match raw.visibility.as_deref() {
            Some("internal") => TagVisibility::Internal,
            _ => TagVisibility::Public,
        };
        Tag {
            id: raw.id,
            name: raw.name,
            slug: raw.slug,
            description: present(raw.description),
            feature_image: present(raw.feature_image),
            visibility,
            post_count: raw.count.and_then(|count| count.posts),
        }
    }
}

impl From<GhostAuthor> for Author {
    fn from(raw: GhostAuthor) -> Self {
        Author {
            id: raw.id,
            name: raw.name,
            slug: raw.slug,
            profile_image: present(raw.profile_image),
            cover_image: present(raw.cover_image),
            bio: present(raw.bio),
            website: present(raw.website),
            location: present(raw.location),
            twitter: present(raw.twitter),
            facebook: present(raw.facebook),
            post_count: raw.count.and_then(|count| count.posts),
        }
    }
}

impl ErrorsEnvelope {
    pub fn first_message(&self) -> Option<String> {
        self.errors.first().map(|item| {
            match (item.kind.as_deref(), item.message.as_deref()) {
                (Some(kind), Some(message)) => format!("{kind}: {message}"),
                (None, Some(message)) => message.to_string(),
                (Some(kind), None) => kind.to_string(),
                (None, None) => "unspecified error".to_string(),
            }
        })
    }
}

/// Empty and whitespace-only strings are treated the same as a missing field.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_timestamp(
    slug: &str,
    field: &str,
    value: Option<String>,
) -> Result<Option<OffsetDateTime>, String> {
    match present(value) {
        Some(raw) => OffsetDateTime::parse(raw.trim(), &Rfc3339)
            .map(Some)
            .map_err(|err| format!("post `{slug}` has invalid {field} `{raw}`: {err}")),
        None => Ok(None),
    }
}

fn post_visibility(value: Option<&str>) -> PostVisibility {
    match value {
        Some("members") => PostVisibility::Members,
        Some("paid") | Some("tiers") => PostVisibility::Paid,
        _ => PostVisibility::Public,
    }
}

/// Reads the direction marker out of the post's injected head code.
///
/// The marker is a `dir` attribute (`dir="rtl"`, `dir='rtl'` or `dir=rtl`, any case)
/// anywhere in the snippet; the first one wins. Anything else reads as left-to-right.
pub(crate) fn text_direction(head: Option<&str>) -> TextDirection {
    let Some(head) = head else {
        return TextDirection::Ltr;
    };
    let lowered = head.to_ascii_lowercase();
    let mut rest = lowered.as_str();

    while let Some(index) = rest.find("dir") {
        let preceded_by_name_char = lowered[..lowered.len() - rest.len() + index]
            .chars()
            .next_back()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        let after = rest[index + 3..].trim_start();
        rest = &rest[index + 3..];

        if preceded_by_name_char {
            continue;
        }
        let Some(value) = after.strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start().trim_start_matches(['"', '\'']);
        if value.starts_with("rtl") {
            return TextDirection::Rtl;
        }
        if value.starts_with("ltr") {
            return TextDirection::Ltr;
        }
    }

    TextDirection::Ltr
}
