//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CliArgs, Command, ContentOverrides, ExportArgs, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_GHOST_API_URL: &str = "https://demo.ghost.io";
const DEFAULT_GHOST_CONTENT_API_KEY: &str = "22444f78447824223cefc48062";
const DEFAULT_GHOST_API_VERSION: &str = "v5.0";
const DEFAULT_GHOST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SITE_URL: &str = "http://localhost:3000";
const DEFAULT_SITE_NAME: &str = "Folio";
const DEFAULT_SITE_DESCRIPTION: &str =
    "Portfolio and writing on backend engineering, distributed systems and the craft of software.";
const DEFAULT_SITE_AUTHOR: &str = "Folio Author";
const DEFAULT_SITE_LOCALE: &str = "en_US";
const DEFAULT_CACHE_TTL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_CACHE_SWEEP_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_CACHE_STATS_LOG_INTERVAL_SECS: u64 = 5 * 60;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub ghost: GhostSettings,
    pub site: SiteSettings,
    pub cache: CacheSettings,
    pub profile: ProfileSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct GhostSettings {
    pub api_url: Url,
    pub content_api_key: String,
    pub api_version: String,
    pub request_timeout: Duration,
}

/// Public identity of the site, used for canonical links, feeds and metadata.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Absolute origin without a trailing slash.
    pub url: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub locale: String,
    pub twitter_handle: Option<String>,
    pub default_image: Option<String>,
}

impl SiteSettings {
    /// Absolute URL for a site-relative path.
    pub fn absolute(&self, path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            self.url.clone()
        } else {
            format!("{}/{trimmed}", self.url)
        }
    }

    /// RFC 5646 style language tag derived from the locale (`en_US` → `en-US`).
    pub fn language(&self) -> String {
        self.locale.replace('_', "-")
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl: Duration,
    pub sweep_interval: Duration,
    pub single_flight: bool,
    pub stats_log_interval: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileSettings {
    /// Profile document to load instead of the embedded one.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_content_overrides(&cli.content);
    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Export(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    ghost: RawGhostSettings,
    site: RawSiteSettings,
    cache: RawCacheSettings,
    profile: RawProfileSettings,
}

impl RawSettings {
    fn apply_content_overrides(&mut self, overrides: &ContentOverrides) {
        if let Some(url) = overrides.ghost_api_url.as_ref() {
            self.ghost.api_url = Some(url.clone());
        }
        if let Some(key) = overrides.ghost_content_api_key.as_ref() {
            self.ghost.content_api_key = Some(key.clone());
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.site.url = Some(url.clone());
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(seconds) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(seconds);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGhostSettings {
    api_url: Option<String>,
    content_api_key: Option<String>,
    api_version: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    url: Option<String>,
    name: Option<String>,
    description: Option<String>,
    author: Option<String>,
    locale: Option<String>,
    twitter_handle: Option<String>,
    default_image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    ttl_seconds: Option<u64>,
    sweep_interval_seconds: Option<u64>,
    single_flight: Option<bool>,
    stats_log_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawProfileSettings {
    path: Option<PathBuf>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            ghost,
            site,
            cache,
            profile,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let ghost = build_ghost_settings(ghost)?;
        let site = build_site_settings(site)?;
        let cache = build_cache_settings(cache)?;
        let profile = ProfileSettings {
            path: profile.path,
        };

        Ok(Self {
            server,
            logging,
            ghost,
            site,
            cache,
            profile,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = positive_seconds("server.graceful_shutdown_seconds", graceful_secs)?;

    Ok(ServerSettings {
        public_addr,
        admin_addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_ghost_settings(ghost: RawGhostSettings) -> Result<GhostSettings, LoadError> {
    let api_url = parse_http_url(
        "ghost.api_url",
        ghost.api_url.as_deref().unwrap_or(DEFAULT_GHOST_API_URL),
    )?;

    let content_api_key = non_empty(ghost.content_api_key)
        .unwrap_or_else(|| DEFAULT_GHOST_CONTENT_API_KEY.to_string());
    if content_api_key.chars().any(char::is_whitespace) {
        return Err(LoadError::invalid(
            "ghost.content_api_key",
            "key must not contain whitespace",
        ));
    }

    let api_version =
        non_empty(ghost.api_version).unwrap_or_else(|| DEFAULT_GHOST_API_VERSION.to_string());

    let timeout_secs = ghost
        .request_timeout_seconds
        .unwrap_or(DEFAULT_GHOST_TIMEOUT_SECS);
    let request_timeout = positive_seconds("ghost.request_timeout_seconds", timeout_secs)?;

    Ok(GhostSettings {
        api_url,
        content_api_key,
        api_version,
        request_timeout,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let url = parse_http_url("site.url", site.url.as_deref().unwrap_or(DEFAULT_SITE_URL))?;
    let url = url.as_str().trim_end_matches('/').to_string();

    Ok(SiteSettings {
        url,
        name: non_empty(site.name).unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        description: non_empty(site.description)
            .unwrap_or_else(|| DEFAULT_SITE_DESCRIPTION.to_string()),
        author: non_empty(site.author).unwrap_or_else(|| DEFAULT_SITE_AUTHOR.to_string()),
        locale: non_empty(site.locale).unwrap_or_else(|| DEFAULT_SITE_LOCALE.to_string()),
        twitter_handle: non_empty(site.twitter_handle),
        default_image: non_empty(site.default_image),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl = positive_seconds(
        "cache.ttl_seconds",
        cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
    )?;
    let sweep_interval = positive_seconds(
        "cache.sweep_interval_seconds",
        cache
            .sweep_interval_seconds
            .unwrap_or(DEFAULT_CACHE_SWEEP_INTERVAL_SECS),
    )?;
    let stats_log_interval = match cache
        .stats_log_interval_seconds
        .unwrap_or(DEFAULT_CACHE_STATS_LOG_INTERVAL_SECS)
    {
        0 => None,
        seconds => Some(Duration::from_secs(seconds)),
    };

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        ttl,
        sweep_interval,
        single_flight: cache.single_flight.unwrap_or(true),
        stats_log_interval,
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(key: &'static str, value: &str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(LoadError::invalid(
            key,
            format!("`{value}` must be an absolute http(s) URL"),
        )),
    }
}

fn positive_seconds(key: &'static str, seconds: u64) -> Result<Duration, LoadError> {
    if seconds == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(seconds))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
