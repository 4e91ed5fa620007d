use std::{process, sync::Arc, time::Duration};

use folio::{
    application::{
        blog::BlogService,
        cached_content::CachedContentService,
        content::{ContentApi, ContentService},
        error::AppError,
        export::export_documents,
        profile::ProfileService,
        sitemap::SitemapService,
        syndication::SyndicationService,
    },
    cache::{CacheConfig, FetchCache},
    config,
    infra::{
        error::InfraError,
        ghost::GhostClient,
        http::{self, AdminState, HttpState},
        telemetry,
    },
};
use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Export(args) => run_export(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;

    info!(
        target = "folio::serve",
        ghost = %settings.ghost.api_url,
        site = %settings.site.url,
        cache_enabled = settings.cache.enabled,
        ttl_seconds = settings.cache.ttl.as_secs(),
        "Starting folio"
    );

    let sweeper = settings
        .cache
        .enabled
        .then(|| app.cache.spawn_sweeper());

    let result = serve_http(&settings, app.http_state, app.admin_state).await;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }

    result
}

async fn run_export(settings: config::Settings, args: config::ExportArgs) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;

    info!(
        target = "folio::export",
        path = %args.dir.display(),
        "Starting export"
    );

    let written = export_documents(
        &args.dir,
        &app.http_state.sitemap,
        &app.http_state.syndication,
        &settings.site,
    )
    .await?;

    info!(
        target = "folio::export",
        files = written.len(),
        "Export completed"
    );
    Ok(())
}

struct ApplicationContext {
    http_state: HttpState,
    admin_state: AdminState,
    cache: Arc<FetchCache>,
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let ghost: Arc<dyn ContentApi> = Arc::new(GhostClient::new(&settings.ghost)?);
    let cache = Arc::new(FetchCache::new(CacheConfig::from(&settings.cache)));
    let content = CachedContentService::new(ContentService::new(ghost), cache.clone());

    let profile = ProfileService::load(settings.profile.path.as_deref()).await?;
    let site = settings.site.clone();

    let http_state = HttpState {
        blog: Arc::new(BlogService::new(content.clone(), site.clone())),
        profile: Arc::new(profile),
        sitemap: Arc::new(SitemapService::new(content.clone(), site.clone())),
        syndication: Arc::new(SyndicationService::new(content, site.clone())),
        site: Arc::new(site),
    };
    let admin_state = AdminState {
        cache: cache.clone(),
    };

    Ok(ApplicationContext {
        http_state,
        admin_state,
        cache,
    })
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "folio::serve",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "Listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        info!(target = "folio::serve", "Shutdown requested, draining connections");
        let _ = shutdown_tx.send(true);
    });

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));

    let servers = async {
        try_join!(public_server, admin_server)
            .map(|_| ())
            .map_err(|err| AppError::unexpected(format!("server error: {err}")))
    };

    let result = tokio::select! {
        result = servers => result,
        _ = drain_deadline(shutdown_rx, settings.server.graceful_shutdown) => {
            warn!(
                target = "folio::serve",
                grace_seconds = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out, dropping open connections"
            );
            Ok(())
        }
    };

    signal_task.abort();
    let _ = signal_task.await;

    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "folio::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Resolves `grace` after shutdown was requested.
async fn drain_deadline(shutdown: watch::Receiver<bool>, grace: Duration) {
    wait_for_shutdown(shutdown).await;
    tokio::time::sleep(grace).await;
}
