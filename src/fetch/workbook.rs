use crate::error::{IngestError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use url::Url;

const DEFAULT_EXTENSION: &str = "xls";

/// Extension of the linked resource, which the reader uses to pick a format.
pub fn workbook_extension(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_EXTENSION)
        .to_ascii_lowercase()
}

/// Download `url` to `<dest_dir>/<stem>.<ext>`, replacing any earlier download.
///
/// The body goes to a sibling `.part` file first, so a failed transfer never
/// leaves a truncated workbook at the final path.
pub async fn download_workbook(
    client: &Client,
    url: &Url,
    dest_dir: &Path,
    stem: &str,
) -> Result<PathBuf> {
    let dest_path = dest_dir.join(format!("{}.{}", stem, workbook_extension(url)));
    let staging = |source| IngestError::Staging {
        path: dest_path.clone(),
        source,
    };
    let unavailable = |source| IngestError::SourceUnavailable {
        url: url.to_string(),
        source,
    };

    fs::create_dir_all(dest_dir).await.map_err(staging)?;

    let bytes = client
        .get(url.clone())
        .send()
        .await
        .map_err(unavailable)?
        .error_for_status()
        .map_err(unavailable)?
        .bytes()
        .await
        .map_err(unavailable)?;

    let part = dest_path.with_extension("part");
    fs::write(&part, &bytes).await.map_err(staging)?;
    fs::rename(&part, &dest_path).await.map_err(staging)?;

    Ok(dest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_url() {
        let u = |s| Url::parse(s).unwrap();
        assert_eq!(workbook_extension(&u("https://x.org/f/2_1_2c.xls")), "xls");
        assert_eq!(workbook_extension(&u("https://x.org/f/book.XLSX?v=2")), "xlsx");
        assert_eq!(workbook_extension(&u("https://x.org/download/")), "xls");
        assert_eq!(workbook_extension(&u("https://x.org/download")), "xls");
    }
}
