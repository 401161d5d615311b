use dollarscraper::config::DEFAULT_LINK_SELECTOR;
use dollarscraper::RemoteFetcher;
use reqwest::Client;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAGE_PATH: &str = "/estadisticas/tipo-cambio-de-referencia-smc";
pub const FILE_PATH: &str = "/sites/default/files/EstadisticasGeneral/2_1_2c11_smc.xlsx";

/// A sheet in the publisher's layout: title block, then quotes on rows 10..=30.
pub struct Sheet<'a> {
    pub label: &'a str,
    pub usd: f64,
    /// Number of columns including the blank legend column.
    pub width: u16,
}

pub fn workbook_bytes(dir: &Path, sheets: &[Sheet<'_>]) -> Vec<u8> {
    let mut wb = Workbook::new();
    for sheet in sheets {
        let ws = wb.add_worksheet();
        ws.set_name(sheet.label).unwrap();
        ws.write_string(4, 1, "Tipo de Cambio de Referencia").unwrap();
        for r in 10u32..=30 {
            let (currency, local) = match r {
                10 => ("EUR", sheet.usd * 1.09),
                11 => ("CNY", sheet.usd / 7.2),
                16 => ("USD", sheet.usd),
                _ => continue,
            };
            ws.write_string(r, 1, currency).unwrap();
            ws.write_string(r, 2, "pais").unwrap();
            for c in 3..sheet.width {
                let v = if c == 5 { local } else { 1.0 };
                ws.write_number(r, c, v).unwrap();
            }
        }
        ws.write_string(30, 0, "Fuente: BCV").unwrap();
    }
    let path = dir.join(format!("fixture-{}.xlsx", sheets.len()));
    wb.save(&path).unwrap();
    std::fs::read(&path).unwrap()
}

pub fn status_page() -> String {
    format!(
        r#"<html><body><div id="block-system-main"><div><div class="view-content"><table>
        <tr class="odd views-row-first">
          <td class="views-field views-field-title">Semana</td>
          <td class="views-field views-field-field-diario"><span><a href="{FILE_PATH}">xlsx</a></span></td>
        </tr></table></div></div></div></body></html>"#
    )
}

/// Serve the status page and `workbook` from a fresh mock publisher.
pub async fn publisher(workbook: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(status_page()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(workbook))
        .mount(&server)
        .await;
    server
}

pub fn fetcher(server: &MockServer, staging: &Path) -> RemoteFetcher {
    let page = Url::parse(&format!("{}{}", server.uri(), PAGE_PATH)).unwrap();
    RemoteFetcher::new(
        Client::new(),
        page,
        DEFAULT_LINK_SELECTOR,
        staging,
        "last_updated_excel",
    )
    .unwrap()
}
