// src/fetch/mod.rs

use crate::config::Config;
use crate::error::Result;
use anyhow::Context;
use reqwest::Client;
use scraper::Selector;
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::info;
use url::Url;

pub mod urls;
pub mod workbook;

pub use urls::{fetch_status_page, locate_latest_workbook_url};
pub use workbook::download_workbook;

/// Locates the latest published workbook and stages it on local disk.
///
/// Neither step is retried here. A failed call is left for the next
/// scheduled run.
pub struct RemoteFetcher {
    client: Client,
    page_url: Url,
    selector: Selector,
    selector_text: String,
    staging_dir: PathBuf,
    stem: String,
}

impl RemoteFetcher {
    pub fn new(
        client: Client,
        page_url: Url,
        link_selector: &str,
        staging_dir: impl Into<PathBuf>,
        stem: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let selector = Selector::parse(link_selector)
            .map_err(|e| anyhow::anyhow!("invalid link selector `{}`: {:?}", link_selector, e))?;
        Ok(Self {
            client,
            page_url,
            selector,
            selector_text: link_selector.to_string(),
            staging_dir: staging_dir.into(),
            stem: stem.into(),
        })
    }

    /// Build a fetcher with its own HTTP client from the host configuration.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout())
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()
            .context("building HTTP client")?;
        let page_url = Url::parse(&cfg.source_url)
            .with_context(|| format!("parsing source URL {}", cfg.source_url))?;
        Self::new(
            client,
            page_url,
            &cfg.link_selector,
            &cfg.staging_dir,
            &cfg.workbook_stem,
        )
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Resolve the current workbook URL without downloading it.
    pub async fn latest_workbook_url(&self) -> Result<Url> {
        let html = fetch_status_page(&self.client, &self.page_url).await?;
        locate_latest_workbook_url(&html, &self.page_url, &self.selector, &self.selector_text)
    }

    /// Download the current workbook and return its local path.
    pub async fn fetch_latest(&self) -> Result<PathBuf> {
        let start = Instant::now();
        let url = self.latest_workbook_url().await?;
        info!(url = %url, "found workbook link");

        let path = download_workbook(&self.client, &url, &self.staging_dir, &self.stem).await?;
        info!(path = %path.display(), elapsed = ?start.elapsed(), "workbook staged");
        Ok(path)
    }
}
