use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("File not found (404): {0}")]
    NotFound(String),

    #[error("Server error (5xx): {0}")]
    ServerError(String),

    #[error("No .xlsx distribution linked from {0}")]
    NoDistribution(String),
}

/// Path of the IPS 4.01 dataset landing page on the ONS site. The page links
/// the current spreadsheet distribution; the filename changes per release.
pub const DATASET_PATH: &str = "/peoplepopulationandcommunity/populationandmigration/\
internationalmigration/datasets/ipscitizenshipgroupbysexbyagebycountryoflastornextresidence";

/// ONS downloader for the IPS 4.01 spreadsheet distribution
pub struct OnsDownloader {
    client: Client,
    base_url: String,
}

impl OnsDownloader {
    /// Create a downloader against the production ONS site
    pub fn new() -> Self {
        Self::with_base_url("https://www.ons.gov.uk".to_string())
    }

    /// Create a downloader with a custom base URL (for mocking)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
        }
    }

    /// Resolve the URL of the latest spreadsheet distribution
    ///
    /// Fetches the dataset landing page and returns the first `.xlsx` link on
    /// it, made absolute against the base URL.
    pub async fn resolve_distribution(&self) -> Result<String, DownloadError> {
        let page_url = format!("{}{}", self.base_url, DATASET_PATH);

        info!("Resolving latest distribution from {}", page_url);
        let response = self.checked_get(&page_url, "dataset landing page").await?;
        let html = response.text().await?;
        debug!("Retrieved landing page, {} bytes", html.len());

        let href = find_xlsx_link(&html)
            .ok_or_else(|| DownloadError::NoDistribution(page_url.clone()))?;

        let url = if href.starts_with("http://") || href.starts_with("https://") {
            href
        } else {
            format!("{}{}", self.base_url, href)
        };
        debug!("Resolved distribution URL: {}", url);
        Ok(url)
    }

    /// Download the spreadsheet at `url`, returning its bytes
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        info!("Downloading spreadsheet: {}", url);
        let response = self.checked_get(url, url).await?;
        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Resolve the latest distribution and download it
    ///
    /// Returns the distribution URL together with the file bytes so callers
    /// can record provenance and derive a filename.
    pub async fn download_latest(&self) -> Result<(String, Vec<u8>), DownloadError> {
        let url = self.resolve_distribution().await?;
        let bytes = self.download(&url).await?;
        Ok((url, bytes))
    }

    /// Internal helper: GET with 404/5xx mapped to typed errors
    async fn checked_get(
        &self,
        url: &str,
        what: &str,
    ) -> Result<reqwest::Response, DownloadError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status.as_u16() == 404 {
            Err(DownloadError::NotFound(format!("{what} not found on server")))
        } else if status.is_server_error() {
            Err(DownloadError::ServerError(format!(
                "Server error {status} while fetching {what}"
            )))
        } else {
            Err(DownloadError::HttpError(
                response.error_for_status().unwrap_err(),
            ))
        }
    }
}

impl Default for OnsDownloader {
    fn default() -> Self {
        Self::new()
    }
}

/// First `.xlsx` href in the landing page HTML, if any
fn find_xlsx_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"a[href$=".xlsx"]"#).expect("static selector");
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .next()
        .map(str::to_string)
}

/// Filename component of a distribution URL, ignoring any query string
pub fn distribution_filename(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        "ips-4-01.xlsx".to_string()
    } else {
        name.to_string()
    }
}
