//! Offline rendering of the crawler documents into a directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::application::sitemap::{SitemapScope, SitemapService, robots_txt};
use crate::application::syndication::SyndicationService;
use crate::config::SiteSettings;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write `sitemap.xml`, `blog-sitemap.xml`, `rss.xml` and `robots.txt` into `dir`.
///
/// Documents degrade the same way the live routes do, so an unreachable CMS still produces
/// valid (minimal) files.
pub async fn export_documents(
    dir: &Path,
    sitemap: &SitemapService,
    syndication: &SyndicationService,
    site: &SiteSettings,
) -> Result<Vec<PathBuf>, ExportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ExportError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    let documents = [
        ("sitemap.xml", sitemap.sitemap_xml(SitemapScope::Site).await),
        ("blog-sitemap.xml", sitemap.sitemap_xml(SitemapScope::Blog).await),
        ("rss.xml", syndication.rss_feed().await),
        ("robots.txt", robots_txt(site)),
    ];

    let mut written = Vec::with_capacity(documents.len());
    for (name, body) in documents {
        let path = dir.join(name);
        tokio::fs::write(&path, body.as_bytes())
            .await
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
        info!(
            target = "folio::export",
            path = %path.display(),
            bytes = body.len(),
            "document written"
        );
        written.push(path);
    }
    Ok(written)
}
