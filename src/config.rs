use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

pub const DEFAULT_SOURCE_URL: &str =
    "https://www.bcv.org.ve/estadisticas/tipo-cambio-de-referencia-smc";

/// Position of the most recent daily workbook on the publisher's page.
pub const DEFAULT_LINK_SELECTOR: &str = "#block-system-main > div > div.view-content > table > tbody > tr.odd.views-row-first > td.views-field.views-field-field-diario > span > a";

/// Settings handed to the pipeline by the host application.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_url: String,
    pub link_selector: String,
    pub staging_dir: PathBuf,
    /// File name, without extension, of the staged workbook.
    pub workbook_stem: String,
    pub database_path: PathBuf,
    pub update_interval_secs: u64,
    pub staleness_interval_secs: u64,
    pub stale_after_secs: u64,
    pub http_timeout_secs: u64,
    /// The publisher has served an incomplete certificate chain in the past.
    pub accept_invalid_certs: bool,
    pub run_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            link_selector: DEFAULT_LINK_SELECTOR.to_string(),
            staging_dir: PathBuf::from("excel_files"),
            workbook_stem: "last_updated_excel".to_string(),
            database_path: PathBuf::from("database.db"),
            update_interval_secs: 24 * 60 * 60,
            staleness_interval_secs: 24 * 60 * 60,
            stale_after_secs: 2 * 24 * 60 * 60,
            http_timeout_secs: 60,
            accept_invalid_certs: false,
            run_on_start: false,
        }
    }
}

impl Config {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.update_interval_secs == 0 || self.staleness_interval_secs == 0 {
            anyhow::bail!("schedule intervals must be greater than zero");
        }
        url::Url::parse(&self.source_url)
            .with_context(|| format!("invalid source_url `{}`", self.source_url))?;
        scraper::Selector::parse(&self.link_selector)
            .map_err(|e| anyhow::anyhow!("invalid link_selector: {:?}", e))?;
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn staleness_interval(&self) -> Duration {
        Duration::from_secs(self.staleness_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = Config::from_yaml_str(
            "database_path: /var/lib/rates.db\nupdate_interval_secs: 3600\naccept_invalid_certs: true\n",
        )
        .unwrap();
        assert_eq!(cfg.database_path, PathBuf::from("/var/lib/rates.db"));
        assert_eq!(cfg.update_interval(), Duration::from_secs(3600));
        assert!(cfg.accept_invalid_certs);
        assert_eq!(cfg.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(cfg.staleness_interval_secs, 86_400);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Config::from_yaml_str("update_interval_secs: 0\n").is_err());
    }

    #[test]
    fn bad_selector_is_rejected() {
        assert!(Config::from_yaml_str("link_selector: \"a[[\"\n").is_err());
    }

    #[test]
    fn default_selector_parses() {
        assert!(Config::default().validate().is_ok());
    }
}
