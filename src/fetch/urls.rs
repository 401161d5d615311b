// src/fetch/urls.rs
use crate::error::{IngestError, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

/// GET the publisher's status page and return its body.
pub async fn fetch_status_page(client: &Client, page_url: &Url) -> Result<String> {
    let unavailable = |source| IngestError::SourceUnavailable {
        url: page_url.to_string(),
        source,
    };
    client
        .get(page_url.clone())
        .send()
        .await
        .map_err(unavailable)?
        .error_for_status()
        .map_err(unavailable)?
        .text()
        .await
        .map_err(unavailable)
}

/// Find the most recent workbook link on the status page.
///
/// This is the only place that knows where the link lives in the page. The
/// first element matching `selector` wins; relative hrefs are resolved
/// against `page_url`.
pub fn locate_latest_workbook_url(
    html: &str,
    page_url: &Url,
    selector: &Selector,
    selector_text: &str,
) -> Result<Url> {
    let not_found = || IngestError::LinkNotFound {
        url: page_url.to_string(),
        selector: selector_text.to_string(),
    };

    let document = Html::parse_document(html);
    let href = document
        .select(selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(not_found)?;

    page_url.join(href).map_err(|_| not_found())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LINK_SELECTOR;

    fn status_page(href: &str) -> String {
        format!(
            r#"<html><body><div id="block-system-main"><div><div class="view-content">
            <table>
              <tr class="odd views-row-first">
                <td class="views-field views-field-title">Semana 11</td>
                <td class="views-field views-field-field-diario"><span><a href="{href}">Descargar</a></span></td>
              </tr>
              <tr class="even">
                <td class="views-field views-field-field-diario"><span><a href="/old.xls">Descargar</a></span></td>
              </tr>
            </table>
            </div></div></div></body></html>"#
        )
    }

    fn selector() -> Selector {
        Selector::parse(DEFAULT_LINK_SELECTOR).unwrap()
    }

    #[test]
    fn finds_first_row_link() {
        let page = Url::parse("https://www.example.org/estadisticas/tipo-cambio").unwrap();
        let html = status_page("https://files.example.org/2_1_2c11_smc.xls");
        let url =
            locate_latest_workbook_url(&html, &page, &selector(), DEFAULT_LINK_SELECTOR).unwrap();
        assert_eq!(url.as_str(), "https://files.example.org/2_1_2c11_smc.xls");
    }

    #[test]
    fn resolves_relative_href() {
        let page = Url::parse("https://www.example.org/estadisticas/tipo-cambio").unwrap();
        let html = status_page("/sites/default/files/latest.xls");
        let url =
            locate_latest_workbook_url(&html, &page, &selector(), DEFAULT_LINK_SELECTOR).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.example.org/sites/default/files/latest.xls"
        );
    }

    #[test]
    fn changed_layout_is_link_not_found() {
        let page = Url::parse("https://www.example.org/").unwrap();
        let html = r#"<html><body><a href="/latest.xls">latest</a></body></html>"#;
        let err =
            locate_latest_workbook_url(html, &page, &selector(), DEFAULT_LINK_SELECTOR).unwrap_err();
        assert!(matches!(err, IngestError::LinkNotFound { .. }));
    }
}
