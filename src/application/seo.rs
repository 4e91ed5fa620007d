//! Head metadata and structured data for every public page.

use serde_json::{Value, json};

use crate::config::SiteSettings;
use crate::domain::entities::Post;
use crate::presentation::views::{ArticleMetaView, PageMetaView, iso_date, script_safe_json};

/// Words per minute Ghost assumes when computing `reading_time`.
const WORDS_PER_MINUTE: u32 = 200;
const ARTICLE_BODY_CHARS: usize = 500;
const DESCRIPTION_CHARS: usize = 160;

/// Metadata shared by every page; callers override what differs.
pub fn base_meta(site: &SiteSettings, title: String, description: String, path: &str) -> PageMetaView {
    PageMetaView {
        site_name: site.name.clone(),
        title: title.clone(),
        description: description.clone(),
        canonical: site.absolute(path),
        robots: "index, follow".to_string(),
        keywords: String::new(),
        locale: site.locale.clone(),
        language: site.language(),
        og_type: "website".to_string(),
        og_title: title.clone(),
        og_description: description.clone(),
        og_image: site.default_image.clone(),
        twitter_title: title,
        twitter_description: description,
        twitter_image: site.default_image.clone(),
        twitter_creator: site.twitter_handle.clone(),
        article: None,
        rss_url: site.absolute("/rss.xml"),
        json_ld: Vec::new(),
    }
}

pub fn home_meta(site: &SiteSettings, keywords: &[&str]) -> PageMetaView {
    let mut meta = base_meta(
        site,
        site.name.clone(),
        site.description.clone(),
        "/",
    );
    meta.keywords = keywords.join(", ");
    meta.json_ld.push(script_safe_json(&json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": site.name,
        "url": site.absolute("/"),
        "description": site.description,
        "author": { "@type": "Person", "name": site.author },
    })));
    meta
}

/// Listing metadata. Filtered views are not indexed; paginated views keep their page in the canonical.
pub fn blog_meta(
    site: &SiteSettings,
    tag: Option<&str>,
    search: Option<&str>,
    page: u32,
) -> PageMetaView {
    let title = match (tag, search) {
        (Some(tag), _) => format!("Posts tagged \"{tag}\" | {}", site.name),
        (None, Some(term)) => format!("Search results for \"{term}\" | {}", site.name),
        (None, None) if page > 1 => format!("Blog - Page {page} | {}", site.name),
        (None, None) => format!("Blog | {}", site.name),
    };
    let description = format!("Articles and notes by {}. {}", site.author, site.description);
    let path = if page > 1 && tag.is_none() && search.is_none() {
        format!("/blog?page={page}")
    } else {
        "/blog".to_string()
    };

    let mut meta = base_meta(site, title, description, &path);
    if tag.is_some() || search.is_some() {
        meta.robots = "noindex, follow".to_string();
    }
    meta
}

pub fn post_meta(site: &SiteSettings, post: &Post) -> PageMetaView {
    let headline = post.meta_title.as_deref().unwrap_or(&post.title);
    let title = format!("{headline} | {}", site.name);
    let description = post_description(site, post);
    let path = format!("/blog/{}", post.slug);

    let mut meta = base_meta(site, title, description.clone(), &path);
    let image = post
        .og_image
        .clone()
        .or_else(|| post.feature_image.clone())
        .or_else(|| site.default_image.clone());

    meta.og_type = "article".to_string();
    meta.og_title = post.og_title.clone().unwrap_or_else(|| headline.to_string());
    meta.og_description = post
        .og_description
        .clone()
        .unwrap_or_else(|| description.clone());
    meta.og_image = image.clone();
    meta.twitter_title = post
        .twitter_title
        .clone()
        .unwrap_or_else(|| headline.to_string());
    meta.twitter_description = post
        .twitter_description
        .clone()
        .unwrap_or_else(|| description.clone());
    meta.twitter_image = post.twitter_image.clone().or(image);
    meta.keywords = post
        .tags
        .iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    meta.article = Some(ArticleMetaView {
        published_time: iso_date(post.published_or_created()),
        modified_time: iso_date(post.updated_at),
        author: post.author_name().map(str::to_string),
        section: post.primary_tag.as_ref().map(|tag| tag.name.clone()),
        tags: post.tags.iter().map(|tag| tag.name.clone()).collect(),
    });
    meta.json_ld = vec![
        script_safe_json(&blog_posting_json_ld(site, post)),
        script_safe_json(&breadcrumb_json_ld(site, post)),
    ];
    meta
}

pub fn not_found_meta(site: &SiteSettings) -> PageMetaView {
    let mut meta = base_meta(
        site,
        format!("Page Not Found | {}", site.name),
        "The page you requested could not be found.".to_string(),
        "/",
    );
    meta.robots = "noindex, nofollow".to_string();
    meta
}

/// meta_description, then custom excerpt, then excerpt, then the site description.
pub fn post_description(site: &SiteSettings, post: &Post) -> String {
    [
        post.meta_description.as_deref(),
        post.custom_excerpt.as_deref(),
        Some(post.excerpt.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|value| !value.is_empty())
    .map(|value| truncate_chars(value, DESCRIPTION_CHARS))
    .unwrap_or_else(|| site.description.clone())
}

pub fn blog_posting_json_ld(site: &SiteSettings, post: &Post) -> Value {
    let url = site.absolute(&format!("/blog/{}", post.slug));
    let image = post
        .feature_image
        .clone()
        .or_else(|| site.default_image.clone());
    let author = post.author_name().unwrap_or(&site.author);

    let mut body = strip_html(&post.html);
    if body.chars().count() > ARTICLE_BODY_CHARS {
        body = format!("{}...", truncate_chars(&body, ARTICLE_BODY_CHARS));
    }

    json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post_description(site, post),
        "image": image,
        "datePublished": iso_date(post.published_or_created()),
        "dateModified": iso_date(post.updated_at),
        "author": {
            "@type": "Person",
            "name": author,
        },
        "publisher": {
            "@type": "Person",
            "name": site.author,
            "url": site.absolute("/"),
        },
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": url,
        },
        "url": url,
        "keywords": post.tags.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>().join(", "),
        "articleSection": post.primary_tag.as_ref().map(|tag| tag.name.as_str()),
        "wordCount": post.reading_time * WORDS_PER_MINUTE,
        "timeRequired": format!("PT{}M", post.reading_time),
        "articleBody": body,
        "inLanguage": site.language(),
    })
}

pub fn breadcrumb_json_ld(site: &SiteSettings, post: &Post) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": [
            {
                "@type": "ListItem",
                "position": 1,
                "name": "Home",
                "item": site.absolute("/"),
            },
            {
                "@type": "ListItem",
                "position": 2,
                "name": "Blog",
                "item": site.absolute("/blog"),
            },
            {
                "@type": "ListItem",
                "position": 3,
                "name": post.title,
                "item": site.absolute(&format!("/blog/{}", post.slug)),
            },
        ],
    })
}

/// Plain text of an HTML fragment with whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut last_was_space = false;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
            }
            '>' => {
                in_tag = false;
                if !last_was_space && !text.is_empty() {
                    text.push(' ');
                    last_was_space = true;
                }
            }
            _ if in_tag => {}
            c if c.is_whitespace() => {
                if !last_was_space && !text.is_empty() {
                    text.push(' ');
                }
                last_was_space = true;
            }
            c => {
                text.push(c);
                last_was_space = false;
            }
        }
    }

    text.trim().to_string()
}

pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((index, _)) => value[..index].trim_end().to_string(),
        None => value.to_string(),
    }
}
