//! Blog listing and post pages assembled from cached CMS content.

use serde::Deserialize;
use tracing::warn;
use url::form_urlencoded;

use crate::application::cached_content::CachedContentService;
use crate::application::content::{FetchError, PostQuery};
use crate::application::seo;
use crate::config::SiteSettings;
use crate::domain::entities::{Pagination, Post, Tag};
use crate::presentation::views::{
    AuthorView, BlogIndexContext, PageLinkView, PageMetaView, PaginationView, PostCard,
    PostDetailContext, TagBadge, TagSummary, display_date, iso_date,
};

pub const BLOG_PAGE_SIZE: u32 = 12;
pub const FEATURED_ON_BLOG: u32 = 6;
pub const POPULAR_TAG_LIMIT: usize = 10;
pub const RELATED_POST_LIMIT: usize = 3;
const PAGE_WINDOW: u32 = 2;

/// Raw `/blog` query string. Values are normalized leniently rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogParams {
    pub page: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl BlogParams {
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }

    pub fn tag(&self) -> Option<String> {
        trimmed(self.tag.as_deref())
    }

    pub fn search(&self) -> Option<String> {
        trimmed(self.search.as_deref())
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    Listing,
    Empty,
    Unavailable,
}

pub struct BlogListing {
    pub state: ListingState,
    pub meta: PageMetaView,
    pub context: BlogIndexContext,
    /// Cause of an unavailable listing.
    pub error: Option<FetchError>,
}

pub enum PostPage {
    Found {
        meta: Box<PageMetaView>,
        context: Box<PostDetailContext>,
    },
    NotFound,
}

#[derive(Clone)]
pub struct BlogService {
    content: CachedContentService,
    site: SiteSettings,
}

impl BlogService {
    pub fn new(content: CachedContentService, site: SiteSettings) -> Self {
        Self { content, site }
    }

    pub fn site(&self) -> &SiteSettings {
        &self.site
    }

    pub async fn listing(&self, params: &BlogParams) -> BlogListing {
        let page = params.page();
        let tag = params.tag();
        let search = params.search();
        let unfiltered = tag.is_none() && search.is_none();

        let result = match (search.as_deref(), tag.as_deref()) {
            (Some(term), tag) => {
                self.content
                    .search_posts(term, tag, page, BLOG_PAGE_SIZE)
                    .await
            }
            (None, Some(tag)) => self.content.posts_by_tag(tag, page, BLOG_PAGE_SIZE).await,
            (None, None) => {
                let query = PostQuery::default()
                    .with_page(page)
                    .with_limit(BLOG_PAGE_SIZE);
                self.content.list_posts(&query).await
            }
        };

        let meta = seo::blog_meta(&self.site, tag.as_deref(), search.as_deref(), page);
        let heading = match (&tag, &search) {
            (Some(tag), _) => format!("Posts tagged \"{tag}\""),
            (None, Some(term)) => format!("Search results for \"{term}\""),
            (None, None) => "Blog".to_string(),
        };

        let posts_page = match result {
            Ok(page) => page,
            Err(error) => {
                let context = BlogIndexContext {
                    heading,
                    subheading: "Unable to load blog posts".to_string(),
                    featured: Vec::new(),
                    posts: Vec::new(),
                    popular_tags: Vec::new(),
                    active_tag: tag,
                    search,
                    pagination: PaginationView::default(),
                    unavailable: true,
                    empty_message: None,
                };
                return BlogListing {
                    state: ListingState::Unavailable,
                    meta,
                    context,
                    error: Some(error),
                };
            }
        };

        let featured = if unfiltered && page == 1 {
            match self.content.featured_posts(FEATURED_ON_BLOG).await {
                Ok(posts) => posts.iter().map(post_card).collect(),
                Err(err) => {
                    warn!(
                        target = "folio::blog",
                        error = %err.source,
                        "featured posts unavailable, rendering listing without them"
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let popular_tags = popular_tags(&self.content.tags().await, tag.as_deref());

        let state = if posts_page.posts.is_empty() {
            ListingState::Empty
        } else {
            ListingState::Listing
        };
        let empty_message = (state == ListingState::Empty)
            .then(|| empty_message(tag.as_deref(), search.as_deref()));

        let context = BlogIndexContext {
            heading,
            subheading: self.site.description.clone(),
            featured,
            posts: posts_page.posts.iter().map(post_card).collect(),
            popular_tags,
            pagination: pagination_view(
                &posts_page.pagination,
                tag.as_deref(),
                search.as_deref(),
            ),
            active_tag: tag,
            search,
            unavailable: false,
            empty_message,
        };

        BlogListing {
            state,
            meta,
            context,
            error: None,
        }
    }

    pub async fn post(&self, slug: &str) -> Result<PostPage, FetchError> {
        let Some(post) = self.content.post_by_slug(slug).await? else {
            return Ok(PostPage::NotFound);
        };

        let related = self.related_posts(&post).await;
        let meta = seo::post_meta(&self.site, &post);
        let context = post_detail(&post, related);

        Ok(PostPage::Found {
            meta: Box::new(meta),
            context: Box::new(context),
        })
    }

    /// Up to three other posts sharing the primary tag.
    pub async fn related_posts(&self, post: &Post) -> Vec<PostCard> {
        let Some(primary) = post.primary_tag.as_ref() else {
            return Vec::new();
        };
        let limit = RELATED_POST_LIMIT as u32 + 1;
        match self.content.posts_by_tag(&primary.slug, 1, limit).await {
            Ok(page) => page
                .posts
                .iter()
                .filter(|candidate| candidate.id != post.id)
                .take(RELATED_POST_LIMIT)
                .map(post_card)
                .collect(),
            Err(err) => {
                warn!(
                    target = "folio::blog",
                    slug = %post.slug,
                    error = %err.source,
                    "related posts unavailable"
                );
                Vec::new()
            }
        }
    }

    /// Newest posts for the home page; empty when the CMS is unreachable.
    pub async fn recent_posts(&self, limit: u32) -> Vec<PostCard> {
        let query = PostQuery::default().with_limit(limit);
        match self.content.list_posts(&query).await {
            Ok(page) => page.posts.iter().map(post_card).collect(),
            Err(err) => {
                warn!(
                    target = "folio::blog",
                    error = %err.source,
                    "recent posts unavailable"
                );
                Vec::new()
            }
        }
    }
}

pub fn post_card(post: &Post) -> PostCard {
    let published = post.published_or_created();
    PostCard {
        title: post.title.clone(),
        href: format!("/blog/{}", post.slug),
        excerpt: post.summary().to_string(),
        feature_image: post.feature_image.clone(),
        feature_image_alt: post
            .feature_image_alt
            .clone()
            .unwrap_or_else(|| post.title.clone()),
        published: display_date(published),
        iso_date: iso_date(published),
        reading_time: post.reading_time,
        author: post.author_name().map(str::to_string),
        featured: post.featured,
        tags: post.tags.iter().map(tag_badge).collect(),
    }
}

fn tag_badge(tag: &Tag) -> TagBadge {
    TagBadge {
        name: tag.name.clone(),
        href: listing_href(Some(&tag.slug), None, 1),
    }
}

fn post_detail(post: &Post, related: Vec<PostCard>) -> PostDetailContext {
    let published = post.published_or_created();
    let author = post
        .primary_author
        .as_ref()
        .or_else(|| post.authors.first())
        .map(|author| AuthorView {
            name: author.name.clone(),
            bio: author.bio.clone(),
            profile_image: author.profile_image.clone(),
            website: author.website.clone(),
        });

    PostDetailContext {
        title: post.title.clone(),
        html: post.html.clone(),
        excerpt: post.summary().to_string(),
        feature_image: post.feature_image.clone(),
        feature_image_alt: post
            .feature_image_alt
            .clone()
            .unwrap_or_else(|| post.title.clone()),
        feature_image_caption: post.feature_image_caption.clone(),
        published: display_date(published),
        iso_date: iso_date(published),
        reading_time: post.reading_time,
        direction: post.text_direction.as_str(),
        tags: post.tags.iter().map(tag_badge).collect(),
        author,
        related,
    }
}

/// Tags with posts, most used first, capped at [`POPULAR_TAG_LIMIT`].
pub fn popular_tags(tags: &[Tag], active: Option<&str>) -> Vec<TagSummary> {
    let mut counted: Vec<(&Tag, u32)> = tags
        .iter()
        .filter_map(|tag| tag.post_count.filter(|count| *count > 0).map(|count| (tag, count)))
        .collect();
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted
        .into_iter()
        .take(POPULAR_TAG_LIMIT)
        .map(|(tag, count)| TagSummary {
            name: tag.name.clone(),
            href: listing_href(Some(&tag.slug), None, 1),
            count,
            active: active == Some(tag.slug.as_str()),
        })
        .collect()
}

fn empty_message(tag: Option<&str>, search: Option<&str>) -> String {
    match (tag, search) {
        (Some(tag), Some(term)) => format!("No posts tagged \"{tag}\" match \"{term}\"."),
        (Some(tag), None) => format!("No posts tagged \"{tag}\" yet."),
        (None, Some(term)) => format!("No posts match \"{term}\"."),
        (None, None) => "No posts have been published yet.".to_string(),
    }
}

/// `/blog` link carrying the active filters. Page 1 is implicit.
pub fn listing_href(tag: Option<&str>, search: Option<&str>, page: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(tag) = tag {
        query.append_pair("tag", tag);
    }
    if let Some(term) = search {
        query.append_pair("search", term);
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        "/blog".to_string()
    } else {
        format!("/blog?{query}")
    }
}

pub fn pagination_view(
    pagination: &Pagination,
    tag: Option<&str>,
    search: Option<&str>,
) -> PaginationView {
    let total = pagination.pages;
    let current = pagination.page.max(1);
    if total <= 1 {
        return PaginationView {
            current,
            total_pages: total,
            ..PaginationView::default()
        };
    }

    let first = current.saturating_sub(PAGE_WINDOW).max(1);
    let last = current.saturating_add(PAGE_WINDOW).min(total);
    let pages = (first..=last)
        .map(|number| PageLinkView {
            number,
            href: listing_href(tag, search, number),
            current: number == current,
        })
        .collect();

    PaginationView {
        current,
        total_pages: total,
        prev_href: pagination
            .prev
            .map(|page| listing_href(tag, search, page)),
        next_href: pagination
            .next
            .map(|page| listing_href(tag, search, page)),
        pages,
    }
}
