use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let chrome = chrome.with_robots("noindex, nofollow");
    let view = LayoutContext::new(chrome, ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Page shown when the CMS cannot be reached. The report carries the upstream cause.
pub fn render_unavailable_response(chrome: LayoutChrome, report: ErrorReport) -> Response {
    let chrome = chrome.with_robots("noindex, follow");
    let view = LayoutContext::new(chrome, ErrorPageView::unavailable());
    let mut response =
        render_template_response(ErrorTemplate { view }, StatusCode::SERVICE_UNAVAILABLE);
    report.attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
    pub links: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn with_meta(self, meta: PageMetaView) -> Self {
        Self { meta, ..self }
    }

    pub fn with_robots(self, robots: &str) -> Self {
        Self {
            meta: PageMetaView {
                robots: robots.to_string(),
                ..self.meta
            },
            ..self
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

/// Everything rendered into `<head>`.
#[derive(Clone)]
pub struct PageMetaView {
    pub site_name: String,
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub robots: String,
    pub keywords: String,
    pub locale: String,
    /// BCP 47 tag for the `lang` attribute.
    pub language: String,
    pub og_type: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: Option<String>,
    pub twitter_title: String,
    pub twitter_description: String,
    pub twitter_image: Option<String>,
    pub twitter_creator: Option<String>,
    pub article: Option<ArticleMetaView>,
    pub rss_url: String,
    /// Serialized JSON-LD documents, already safe to embed in a script element.
    pub json_ld: Vec<String>,
}

#[derive(Clone)]
pub struct ArticleMetaView {
    pub published_time: String,
    pub modified_time: String,
    pub author: Option<String>,
    pub section: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Clone)]
pub struct TagBadge {
    pub name: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub title: String,
    pub href: String,
    pub excerpt: String,
    pub feature_image: Option<String>,
    pub feature_image_alt: String,
    pub published: String,
    pub iso_date: String,
    pub reading_time: u32,
    pub author: Option<String>,
    pub featured: bool,
    pub tags: Vec<TagBadge>,
}

#[derive(Clone)]
pub struct TagSummary {
    pub name: String,
    pub href: String,
    pub count: u32,
    pub active: bool,
}

#[derive(Clone)]
pub struct PageLinkView {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

#[derive(Clone, Default)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub pages: Vec<PageLinkView>,
}

impl PaginationView {
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }
}

pub struct BlogIndexContext {
    pub heading: String,
    pub subheading: String,
    pub featured: Vec<PostCard>,
    pub posts: Vec<PostCard>,
    pub popular_tags: Vec<TagSummary>,
    pub active_tag: Option<String>,
    pub search: Option<String>,
    pub pagination: PaginationView,
    /// Set when the listing could not be loaded.
    pub unavailable: bool,
    /// Set when the listing loaded but matched nothing.
    pub empty_message: Option<String>,
}

#[derive(Template)]
#[template(path = "blog.html")]
pub struct BlogIndexTemplate {
    pub view: LayoutContext<BlogIndexContext>,
}

pub struct AuthorView {
    pub name: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub website: Option<String>,
}

pub struct PostDetailContext {
    pub title: String,
    pub html: String,
    pub excerpt: String,
    pub feature_image: Option<String>,
    pub feature_image_alt: String,
    pub feature_image_caption: Option<String>,
    pub published: String,
    pub iso_date: String,
    pub reading_time: u32,
    pub direction: &'static str,
    pub tags: Vec<TagBadge>,
    pub author: Option<AuthorView>,
    pub related: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct HeroView {
    pub name: String,
    pub first_name: String,
    pub title: String,
    pub tagline: String,
    pub description: String,
    pub location: String,
}

pub struct SkillView {
    pub name: String,
    pub level: &'static str,
    pub percent: u8,
    pub icon: String,
}

pub struct SkillGroupView {
    pub category: String,
    pub skills: Vec<SkillView>,
}

pub struct ProjectView {
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: &'static str,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub live_url: Option<String>,
}

pub struct ExperienceView {
    pub position: String,
    pub company: String,
    pub location: String,
    pub period: String,
    pub duration: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub technologies: Vec<String>,
}

pub struct CourseView {
    pub title: String,
    pub description: String,
    pub category: String,
    pub provider: String,
    pub institution: Option<String>,
    pub instructor: Option<String>,
    pub duration: String,
    pub completed: Option<String>,
}

pub struct ContactView {
    pub email: String,
    pub github_url: String,
    pub github_username: String,
    pub linkedin_url: String,
    pub linkedin_username: String,
    pub location: String,
}

pub struct HomeContext {
    pub hero: HeroView,
    pub skill_groups: Vec<SkillGroupView>,
    pub projects: Vec<ProjectView>,
    pub current_role: ExperienceView,
    pub previous_roles: Vec<ExperienceView>,
    pub courses: Vec<CourseView>,
    pub contact: ContactView,
    pub recent_posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try the blog index or head back home."
                .to_string(),
            primary_action: Some(ErrorAction::blog()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            title: "Content Unavailable".to_string(),
            message: "Unable to load this content right now. Please try again in a few minutes."
                .to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }

    pub fn blog() -> Self {
        Self {
            href: "/blog".to_string(),
            label: "Browse the blog".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

/// `March 2, 2024`
pub fn display_date(value: OffsetDateTime) -> String {
    value
        .format(format_description!(
            "[month repr:long] [day padding:none], [year]"
        ))
        .unwrap_or_default()
}

pub fn iso_date(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}

/// Embed JSON inside `<script>` without letting the payload close the element.
pub fn script_safe_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}
