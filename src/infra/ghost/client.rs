use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::content::{BrowsePosts, ContentApi, ContentError};
use crate::config::GhostSettings;
use crate::domain::entities::{Post, PostsPage, Tag};
use crate::infra::error::InfraError;

use super::wire::{ErrorsEnvelope, PostsEnvelope, TagsEnvelope};

const METRIC_GHOST_REQUEST_MS: &str = "folio_ghost_request_ms";
const METRIC_GHOST_REQUEST_ERROR: &str = "folio_ghost_request_error_total";
const ACCEPT_VERSION_HEADER: &str = "Accept-Version";
const CONTENT_API_PATH: [&str; 3] = ["ghost", "api", "content"];

/// Read-only client for the Ghost Content API.
#[derive(Clone)]
pub struct GhostClient {
    http: Client,
    base: Url,
    key: String,
    api_version: String,
}

impl GhostClient {
    pub fn new(settings: &GhostSettings) -> Result<Self, InfraError> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| InfraError::http(format!("failed to build HTTP client: {err}")))?;

        if settings.api_url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "ghost.api_url `{}` cannot carry a path",
                settings.api_url
            )));
        }

        Ok(Self {
            http,
            base: settings.api_url.clone(),
            key: settings.content_api_key.clone(),
            api_version: settings.api_version.clone(),
        })
    }

    /// `{base}/ghost/api/content/{segments}/?key=...&{query}`
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ContentError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ContentError::transport("endpoint", "base URL cannot be a base"))?;
            path.pop_if_empty();
            path.extend(CONTENT_API_PATH);
            path.extend(segments);
            path.push("");
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.key);
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        url: Url,
    ) -> Result<T, ContentError> {
        let started = Instant::now();
        let result = self.send(resource, url).await;
        histogram!(METRIC_GHOST_REQUEST_MS, "resource" => resource)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        if let Err(err) = &result {
            if !matches!(err, ContentError::NotFound { .. }) {
                counter!(METRIC_GHOST_REQUEST_ERROR, "resource" => resource).increment(1);
            }
        }
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        url: Url,
    ) -> Result<T, ContentError> {
        debug!(target = "folio::ghost", resource, path = url.path(), "requesting");

        let response = self
            .http
            .get(url)
            .header(ACCEPT_VERSION_HEADER, &self.api_version)
            .send()
            .await
            .map_err(|err| ContentError::transport(resource, err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ContentError::transport(resource, err))?;

        if status == StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound { resource });
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorsEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.first_message())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            warn!(
                target = "folio::ghost",
                resource,
                status = status.as_u16(),
                message = %message,
                "content API rejected request"
            );
            return Err(ContentError::Status {
                resource,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| ContentError::decode(resource, err))
    }
}

#[async_trait]
impl ContentApi for GhostClient {
    async fn browse_posts(&self, params: &BrowsePosts) -> Result<PostsPage, ContentError> {
        let page = params.page.to_string();
        let limit = params.limit.to_string();
        let mut query = vec![
            ("limit", limit.as_str()),
            ("page", page.as_str()),
            ("include", params.include.as_str()),
        ];
        if let Some(filter) = params.filter.as_deref() {
            query.push(("filter", filter));
        }

        let url = self.endpoint(&["posts"], &query)?;
        let envelope: PostsEnvelope = self.get_json("posts", url).await?;
        envelope
            .into_page(params.limit)
            .map_err(|err| ContentError::decode("posts", err))
    }

    async fn read_post_by_slug(&self, slug: &str, include: &str) -> Result<Post, ContentError> {
        let url = self.endpoint(&["posts", "slug", slug], &[("include", include)])?;
        let envelope: PostsEnvelope = self.get_json("post", url).await?;
        let raw = envelope
            .posts
            .into_iter()
            .next()
            .ok_or(ContentError::NotFound { resource: "post" })?;
        Post::try_from(raw).map_err(|err| ContentError::decode("post", err))
    }

    async fn browse_tags(&self) -> Result<Vec<Tag>, ContentError> {
        let url = self.endpoint(
            &["tags"],
            &[
                ("limit", "all"),
                ("include", "count.posts"),
                ("filter", "visibility:public"),
            ],
        )?;
        let envelope: TagsEnvelope = self.get_json("tags", url).await?;
        Ok(envelope.tags.into_iter().map(Tag::from).collect())
    }
}
