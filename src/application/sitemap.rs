//! Sitemap and robots.txt generation.
//!
//! Sitemaps are built from the cached post listing. When the CMS cannot be reached a minimal
//! document listing only the static entry points is served instead of an error.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

use crate::application::blog::{BLOG_PAGE_SIZE, listing_href};
use crate::application::cached_content::CachedContentService;
use crate::application::content::{FetchError, PostQuery};
use crate::application::syndication::xml_escape;
use crate::config::SiteSettings;
use crate::domain::entities::{Post, Tag};

/// Page size used when walking every post.
const SITEMAP_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapScope {
    /// `/sitemap.xml`
    Site,
    /// `/blog/sitemap.xml`, everything except the home page.
    Blog,
}

#[derive(Debug, Clone)]
struct SitemapImage {
    loc: String,
    title: String,
    caption: Option<String>,
}

#[derive(Debug, Clone)]
struct SitemapEntry {
    loc: String,
    lastmod: Option<OffsetDateTime>,
    changefreq: &'static str,
    /// Priority in tenths.
    priority: u8,
    image: Option<SitemapImage>,
}

impl SitemapEntry {
    fn new(loc: String, changefreq: &'static str, priority: u8) -> Self {
        Self {
            loc,
            lastmod: None,
            changefreq,
            priority,
            image: None,
        }
    }

    fn render(&self, xml: &mut String) {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&self.loc)));
        if let Some(lastmod) = self.lastmod.and_then(|value| value.format(&Rfc3339).ok()) {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", self.changefreq));
        xml.push_str(&format!(
            "    <priority>{}.{}</priority>\n",
            self.priority / 10,
            self.priority % 10
        ));
        if let Some(image) = &self.image {
            xml.push_str("    <image:image>\n");
            xml.push_str(&format!(
                "      <image:loc>{}</image:loc>\n",
                xml_escape(&image.loc)
            ));
            xml.push_str(&format!(
                "      <image:title>{}</image:title>\n",
                xml_escape(&image.title)
            ));
            if let Some(caption) = &image.caption {
                xml.push_str(&format!(
                    "      <image:caption>{}</image:caption>\n",
                    xml_escape(caption)
                ));
            }
            xml.push_str("    </image:image>\n");
        }
        xml.push_str("  </url>\n");
    }
}

#[derive(Clone)]
pub struct SitemapService {
    content: CachedContentService,
    site: SiteSettings,
}

impl SitemapService {
    pub fn new(content: CachedContentService, site: SiteSettings) -> Self {
        Self { content, site }
    }

    /// Sitemap for `scope`, falling back to the static entries when posts cannot be listed.
    pub async fn sitemap_xml(&self, scope: SitemapScope) -> String {
        match self.try_sitemap_xml(scope).await {
            Ok(xml) => xml,
            Err(err) => {
                warn!(
                    target = "folio::sitemap",
                    error = %err.source,
                    scope = ?scope,
                    "serving fallback sitemap"
                );
                self.fallback_sitemap(scope)
            }
        }
    }

    pub async fn try_sitemap_xml(&self, scope: SitemapScope) -> Result<String, FetchError> {
        let (posts, total) = self.all_posts().await?;
        let tags = self.content.tags().await;
        Ok(render_urlset(&self.entries(scope, &posts, total, &tags)))
    }

    pub fn fallback_sitemap(&self, scope: SitemapScope) -> String {
        let mut entries = Vec::new();
        if scope == SitemapScope::Site {
            entries.push(self.home_entry());
        }
        entries.push(SitemapEntry::new(self.site.absolute("/blog"), "daily", 8));
        render_urlset(&entries)
    }

    /// Every public post, read page by page until the listing reports no next page.
    async fn all_posts(&self) -> Result<(Vec<Post>, u32), FetchError> {
        let mut posts = Vec::new();
        let mut page = 1;
        let total = loop {
            let query = PostQuery::default()
                .with_limit(SITEMAP_PAGE_LIMIT)
                .with_page(page);
            let batch = self.content.list_posts(&query).await?;
            let exhausted = batch.posts.is_empty();
            posts.extend(batch.posts);
            match batch.pagination.next {
                Some(next) if !exhausted && next > page => page = next,
                _ => break batch.pagination.total,
            }
        };
        Ok((posts, total))
    }

    fn home_entry(&self) -> SitemapEntry {
        SitemapEntry::new(self.site.absolute("/"), "weekly", 10)
    }

    fn entries(
        &self,
        scope: SitemapScope,
        posts: &[Post],
        total: u32,
        tags: &[Tag],
    ) -> Vec<SitemapEntry> {
        let mut entries = Vec::with_capacity(posts.len() + tags.len() + 2);
        if scope == SitemapScope::Site {
            entries.push(self.home_entry());
        }

        let mut blog = SitemapEntry::new(self.site.absolute("/blog"), "daily", 8);
        blog.lastmod = posts.iter().map(|post| post.updated_at).max();
        entries.push(blog);

        for post in posts {
            let mut entry = SitemapEntry::new(
                self.site.absolute(&format!("/blog/{}", post.slug)),
                "weekly",
                7,
            );
            entry.lastmod = Some(post.updated_at);
            entry.image = post.feature_image.as_ref().map(|image| SitemapImage {
                loc: image.clone(),
                title: post.title.clone(),
                caption: Some(post.summary())
                    .filter(|caption| !caption.trim().is_empty())
                    .map(str::to_string),
            });
            entries.push(entry);
        }

        for tag in tags {
            if tag.post_count.unwrap_or(0) == 0 {
                continue;
            }
            entries.push(SitemapEntry::new(
                self.site.absolute(&listing_href(Some(&tag.slug), None, 1)),
                "weekly",
                6,
            ));
        }

        let pages = total.div_ceil(BLOG_PAGE_SIZE);
        for page in 2..=pages {
            entries.push(SitemapEntry::new(
                self.site.absolute(&listing_href(None, None, page)),
                "daily",
                pagination_priority(page),
            ));
        }

        entries
    }
}

/// Listing page `n` (n >= 2) in tenths: 0.5 for page 2, dropping by 0.1 per page, never below 0.3.
fn pagination_priority(page: u32) -> u8 {
    let drop = page.saturating_sub(2).min(2) as u8;
    5 - drop
}

fn render_urlset(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" xmlns:image=\"http://www.google.com/schemas/sitemap-image/1.1\">\n",
    );
    for entry in entries {
        entry.render(&mut xml);
    }
    xml.push_str("</urlset>\n");
    xml
}

/// robots.txt pointing crawlers at both sitemaps and the feed.
pub fn robots_txt(site: &SiteSettings) -> String {
    let mut body = String::new();
    body.push_str("User-agent: *\n");
    body.push_str("Allow: /\n");
    for path in ["/api/", "/_next/", "/admin/", "/*.json$", "/private/"] {
        body.push_str(&format!("Disallow: {path}\n"));
    }
    body.push('\n');

    for agent in ["Googlebot", "Bingbot"] {
        body.push_str(&format!("User-agent: {agent}\n"));
        for path in ["/blog", "/blog/", "/blog/*"] {
            body.push_str(&format!("Allow: {path}\n"));
        }
        body.push_str("Crawl-delay: 1\n\n");
    }

    body.push_str(&format!("Host: {}\n\n", site.url));
    for path in ["/sitemap.xml", "/blog/sitemap.xml", "/rss.xml"] {
        body.push_str(&format!("Sitemap: {}\n", site.absolute(path)));
    }
    body
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::content::ContentService;
    use crate::application::test_support::{FakeContent, posts, site, tag};
    use crate::cache::{CacheConfig, FetchCache};

    fn service(fake: FakeContent) -> (SitemapService, Arc<FakeContent>) {
        let fake = Arc::new(fake);
        let content = CachedContentService::new(
            ContentService::new(fake.clone()),
            Arc::new(FetchCache::new(CacheConfig::default())),
        );
        (SitemapService::new(content, site()), fake)
    }

    #[test]
    fn pagination_priority_floors_at_three_tenths() {
        assert_eq!(pagination_priority(2), 5);
        assert_eq!(pagination_priority(3), 4);
        assert_eq!(pagination_priority(4), 3);
        assert_eq!(pagination_priority(9), 3);
    }

    #[tokio::test]
    async fn site_sitemap_lists_every_kind_of_entry() {
        let fake = FakeContent::new(posts(30), vec![tag("Rust", 30), tag("Empty", 0)]);
        let (service, _) = service(fake);
        let xml = service.sitemap_xml(SitemapScope::Site).await;

        assert!(xml.contains("<loc>https://example.dev</loc>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<loc>https://example.dev/blog</loc>"));
        assert!(xml.contains("<loc>https://example.dev/blog/post-29</loc>"));
        assert!(xml.contains("<image:loc>https://cdn.example.dev/post-0.jpg</image:loc>"));
        assert!(xml.contains("<loc>https://example.dev/blog?tag=rust</loc>"));
        assert!(!xml.contains("tag=empty"));
        assert!(xml.contains("<loc>https://example.dev/blog?page=3</loc>"));
        assert!(!xml.contains("page=4"));
        assert_eq!(xml.matches("<url>").count(), 1 + 1 + 30 + 1 + 2);
    }

    #[tokio::test]
    async fn walks_pages_of_one_hundred() {
        let (service, fake) = service(FakeContent::new(posts(205), Vec::new()));
        let xml = service.sitemap_xml(SitemapScope::Blog).await;

        assert!(xml.contains("/blog/post-204</loc>"));
        let pages: Vec<u32> = fake
            .recorded()
            .iter()
            .filter(|request| request.limit == SITEMAP_PAGE_LIMIT)
            .map(|request| request.page)
            .collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn post_walk_reports_the_listing_total() {
        let (service, _) = service(FakeContent::new(posts(205), Vec::new()));
        let (walked, total) = service.all_posts().await.expect("walk succeeds");

        assert_eq!(walked.len(), 205);
        assert_eq!(total, 205);
        let xml = service.sitemap_xml(SitemapScope::Blog).await;
        let last = total.div_ceil(BLOG_PAGE_SIZE);
        assert!(xml.contains(&format!("/blog?page={last}</loc>")));
        assert!(!xml.contains(&format!("/blog?page={}</loc>", last + 1)));
    }

    #[tokio::test]
    async fn blog_sitemap_omits_home() {
        let (service, _) = service(FakeContent::new(posts(2), Vec::new()));
        let xml = service.sitemap_xml(SitemapScope::Blog).await;
        assert!(!xml.contains("<loc>https://example.dev</loc>"));
        assert!(xml.contains("<loc>https://example.dev/blog</loc>"));
    }

    #[tokio::test]
    async fn blog_lastmod_is_latest_update() {
        let all = posts(3);
        let latest = all.iter().map(|post| post.updated_at).max().expect("posts");
        let (service, _) = service(FakeContent::new(all, Vec::new()));
        let xml = service.sitemap_xml(SitemapScope::Site).await;
        let expected = format!(
            "<loc>https://example.dev/blog</loc>\n    <lastmod>{}</lastmod>",
            latest.format(&Rfc3339).expect("rfc3339")
        );
        assert!(xml.contains(&expected));
    }

    #[tokio::test]
    async fn unreachable_cms_serves_fallback() {
        let (service, _) = service(FakeContent::failing());
        let xml = service.sitemap_xml(SitemapScope::Site).await;
        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains("<loc>https://example.dev</loc>"));
        assert!(xml.contains("<loc>https://example.dev/blog</loc>"));
    }

    #[test]
    fn robots_lists_sitemaps_and_keeps_xml_crawlable() {
        let body = robots_txt(&site());
        assert!(body.starts_with("User-agent: *\nAllow: /\n"));
        assert!(body.contains("Disallow: /*.json$\n"));
        assert!(!body.contains(".xml$"));
        assert!(body.contains("User-agent: Googlebot\nAllow: /blog\n"));
        assert!(body.contains("User-agent: Bingbot\n"));
        assert!(body.contains("Crawl-delay: 1\n"));
        assert!(body.contains("Host: https://example.dev\n"));
        assert!(body.contains("Sitemap: https://example.dev/sitemap.xml\n"));
        assert!(body.contains("Sitemap: https://example.dev/blog/sitemap.xml\n"));
        assert!(body.contains("Sitemap: https://example.dev/rss.xml\n"));
    }
}
