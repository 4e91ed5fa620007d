//! RSS 2.0 feed of the latest posts.

use time::{OffsetDateTime, format_description::well_known::Rfc2822};
use tracing::warn;

use crate::application::cached_content::CachedContentService;
use crate::application::content::{FetchError, PostQuery};
use crate::config::SiteSettings;
use crate::domain::entities::Post;

pub const FEED_ITEM_LIMIT: u32 = 50;
const FEED_TTL_MINUTES: u32 = 60;

#[derive(Clone)]
pub struct SyndicationService {
    content: CachedContentService,
    site: SiteSettings,
}

impl SyndicationService {
    pub fn new(content: CachedContentService, site: SiteSettings) -> Self {
        Self { content, site }
    }

    /// Feed of the latest posts; an empty channel when the CMS cannot be reached.
    pub async fn rss_feed(&self) -> String {
        match self.try_rss_feed().await {
            Ok(xml) => xml,
            Err(err) => {
                warn!(
                    target = "folio::syndication",
                    error = %err.source,
                    "serving empty feed"
                );
                self.empty_feed()
            }
        }
    }

    pub async fn try_rss_feed(&self) -> Result<String, FetchError> {
        let query = PostQuery::default().with_limit(FEED_ITEM_LIMIT);
        let posts = self.content.list_posts(&query).await?.posts;
        Ok(render_feed(&self.site, &posts, OffsetDateTime::now_utc()))
    }

    pub fn empty_feed(&self) -> String {
        render_feed(&self.site, &[], OffsetDateTime::now_utc())
    }
}

pub fn render_feed(site: &SiteSettings, posts: &[Post], now: OffsetDateTime) -> String {
    let blog_url = site.absolute("/blog");
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n<channel>\n",
    );
    xml.push_str(&format!(
        "  <title>{}</title>\n",
        xml_escape(&format!("{} Blog", site.name))
    ));
    xml.push_str(&format!("  <link>{}</link>\n", xml_escape(&blog_url)));
    xml.push_str(&format!(
        "  <description>{}</description>\n",
        xml_escape(&site.description)
    ));
    xml.push_str(&format!(
        "  <language>{}</language>\n",
        site.language().to_lowercase()
    ));
    xml.push_str(&format!(
        "  <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        xml_escape(&site.absolute("/rss.xml"))
    ));
    xml.push_str(&format!(
        "  <lastBuildDate>{}</lastBuildDate>\n",
        rfc2822(now)
    ));
    if let Some(latest) = posts.iter().map(Post::published_or_created).max() {
        xml.push_str(&format!("  <pubDate>{}</pubDate>\n", rfc2822(latest)));
    }
    xml.push_str(&format!("  <ttl>{FEED_TTL_MINUTES}</ttl>\n"));

    for post in posts.iter().take(FEED_ITEM_LIMIT as usize) {
        render_item(site, post, &mut xml);
    }

    xml.push_str("</channel>\n</rss>\n");
    xml
}

fn render_item(site: &SiteSettings, post: &Post, xml: &mut String) {
    let link = xml_escape(&site.absolute(&format!("/blog/{}", post.slug)));
    xml.push_str("  <item>\n");
    xml.push_str(&format!("    <title>{}</title>\n", cdata(&post.title)));
    xml.push_str(&format!(
        "    <description>{}</description>\n",
        cdata(post.summary())
    ));
    xml.push_str(&format!("    <link>{link}</link>\n"));
    xml.push_str(&format!("    <guid isPermaLink=\"true\">{link}</guid>\n"));
    xml.push_str(&format!(
        "    <pubDate>{}</pubDate>\n",
        rfc2822(post.published_or_created())
    ));
    if let Some(author) = post.author_name() {
        xml.push_str(&format!("    <author>{}</author>\n", xml_escape(author)));
    }
    for tag in &post.tags {
        xml.push_str(&format!("    <category>{}</category>\n", xml_escape(&tag.name)));
    }
    if let Some(image) = &post.feature_image {
        xml.push_str(&format!(
            "    <enclosure url=\"{}\" type=\"image/jpeg\" length=\"0\"/>\n",
            xml_escape(image)
        ));
    }
    xml.push_str("  </item>\n");
}

fn rfc2822(value: OffsetDateTime) -> String {
    value.format(&Rfc2822).unwrap_or_default()
}

/// Wrap text in CDATA, splitting any terminator that appears in the text.
fn cdata(value: &str) -> String {
    format!("<![CDATA[{}]]>", value.replace("]]>", "]]]]><![CDATA[>"))
}

pub(crate) fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
