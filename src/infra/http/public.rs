use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::warn;

use crate::{
    application::{
        blog::{BlogParams, BlogService, ListingState, PostPage},
        error::ErrorReport,
        profile::{ProfileService, RECENT_POSTS_ON_HOME, current_month},
        seo,
        sitemap::{SitemapScope, SitemapService, robots_txt as render_robots},
        syndication::SyndicationService,
    },
    config::SiteSettings,
    presentation::views::{
        BlogIndexTemplate, HomeTemplate, LayoutContext, PostTemplate, render_not_found_response,
        render_template_response, render_unavailable_response,
    },
};

use super::{
    health,
    middleware::trace_requests,
};

pub const BLOG_CACHE_CONTROL: &str = "public, s-maxage=1800, stale-while-revalidate=3600";
pub const POST_CACHE_CONTROL: &str = "public, s-maxage=86400, stale-while-revalidate=604800";
pub const FEED_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate";
pub const FALLBACK_CACHE_CONTROL: &str = "public, max-age=300";

const SITEMAP_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub profile: Arc<ProfileService>,
    pub sitemap: Arc<SitemapService>,
    pub syndication: Arc<SyndicationService>,
    pub site: Arc<SiteSettings>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/blog", get(blog_index))
        .route("/blog/sitemap.xml", get(blog_sitemap))
        .route("/blog/{slug}", get(post_detail))
        .route("/sitemap.xml", get(sitemap))
        .route("/rss.xml", get(rss_feed))
        .route("/robots.txt", get(robots_txt))
        .route("/_health", get(health))
        .fallback(fallback_router)
        .with_state(state)
        .layer(middleware::from_fn(trace_requests))
}

async fn index(State(state): State<HttpState>) -> Response {
    let recent_posts = state.blog.recent_posts(RECENT_POSTS_ON_HOME).await;
    let content = state.profile.home_context(recent_posts, current_month());

    let keywords: Vec<&str> = state
        .profile
        .profile()
        .skills
        .iter()
        .map(|skill| skill.name.as_str())
        .collect();
    let chrome = state.profile.chrome(seo::home_meta(&state.site, &keywords));

    let view = LayoutContext::new(chrome, content);
    let response = render_template_response(HomeTemplate { view }, StatusCode::OK);
    with_cache_control(response, BLOG_CACHE_CONTROL)
}

async fn blog_index(State(state): State<HttpState>, Query(params): Query<BlogParams>) -> Response {
    let listing = state.blog.listing(&params).await;
    let chrome = state.profile.chrome(listing.meta);
    let view = LayoutContext::new(chrome, listing.context);

    if listing.state == ListingState::Unavailable {
        let mut response =
            render_template_response(BlogIndexTemplate { view }, StatusCode::SERVICE_UNAVAILABLE);
        let report = match &listing.error {
            Some(err) => ErrorReport::from_error(
                "infra::http::public::blog_index",
                StatusCode::SERVICE_UNAVAILABLE,
                err,
            ),
            None => ErrorReport::from_message(
                "infra::http::public::blog_index",
                StatusCode::SERVICE_UNAVAILABLE,
                "Unable to load blog posts",
            ),
        };
        report.attach(&mut response);
        return response;
    }

    let response = render_template_response(BlogIndexTemplate { view }, StatusCode::OK);
    with_cache_control(response, BLOG_CACHE_CONTROL)
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    match state.blog.post(&slug).await {
        Ok(PostPage::Found { meta, context }) => {
            let chrome = state.profile.chrome(*meta);
            let view = LayoutContext::new(chrome, *context);
            let response = render_template_response(PostTemplate { view }, StatusCode::OK);
            with_cache_control(response, POST_CACHE_CONTROL)
        }
        Ok(PostPage::NotFound) => {
            render_not_found_response(state.profile.chrome(seo::not_found_meta(&state.site)))
        }
        Err(err) => {
            let report = ErrorReport::from_error(
                "infra::http::public::post_detail",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            );
            render_unavailable_response(
                state.profile.chrome(seo::not_found_meta(&state.site)),
                report,
            )
        }
    }
}

async fn sitemap(State(state): State<HttpState>) -> Response {
    sitemap_response(&state, SitemapScope::Site).await
}

async fn blog_sitemap(State(state): State<HttpState>) -> Response {
    sitemap_response(&state, SitemapScope::Blog).await
}

async fn sitemap_response(state: &HttpState, scope: SitemapScope) -> Response {
    match state.sitemap.try_sitemap_xml(scope).await {
        Ok(body) => xml_response(body, SITEMAP_CONTENT_TYPE, FEED_CACHE_CONTROL),
        Err(err) => {
            warn!(
                target = "folio::sitemap",
                scope = ?scope,
                error = %err.source,
                "serving fallback sitemap"
            );
            xml_response(
                state.sitemap.fallback_sitemap(scope),
                SITEMAP_CONTENT_TYPE,
                FALLBACK_CACHE_CONTROL,
            )
        }
    }
}

async fn rss_feed(State(state): State<HttpState>) -> Response {
    match state.syndication.try_rss_feed().await {
        Ok(body) => xml_response(body, RSS_CONTENT_TYPE, FEED_CACHE_CONTROL),
        Err(err) => {
            warn!(
                target = "folio::syndication",
                error = %err.source,
                "serving empty feed"
            );
            xml_response(
                state.syndication.empty_feed(),
                RSS_CONTENT_TYPE,
                FALLBACK_CACHE_CONTROL,
            )
        }
    }
}

async fn robots_txt(State(state): State<HttpState>) -> Response {
    plain_response(render_robots(&state.site))
}

async fn fallback_router(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.profile.chrome(seo::not_found_meta(&state.site)))
}

fn with_cache_control(mut response: Response, value: &'static str) -> Response {
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static(value));
    }
    response
}

fn xml_response(body: String, content_type: &'static str, cache_control: &'static str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CACHE_CONTROL, cache_control)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn plain_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
