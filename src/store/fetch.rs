//! Blocking download of CRX packages from the update service.
//!
//! [`HttpClient`] is the seam between the download policy in
//! [`fetch_package`] and the network, so the policy can be exercised with a
//! mock client.

use std::{io::Read, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use tracing::{debug, info, warn};

use super::errors::FetchError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_package_bytes: u64,
    pub user_agent: String,
    pub show_progress: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: Duration::from_secs(30),
            max_package_bytes: 100 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    max_package_bytes: u64,
    show_progress: bool,
}

impl ReqwestClient {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://chrome.google.com"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/octet-stream,application/x-chrome-extension,*/*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_package_bytes: config.max_package_bytes,
            show_progress: config.show_progress,
        })
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match total {
            Some(total) => {
                let style = ProgressStyle::with_template(
                    "Downloading... {bar:30} {percent:>3}% ({bytes}/{total_bytes})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar());
                ProgressBar::new(total).with_style(style)
            }
            None => ProgressBar::new_spinner(),
        }
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Http(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if !response.status().is_success() {
            return Ok(HttpResponse {
                status,
                content_type,
                body: Vec::new(),
            });
        }

        let total = response.content_length();
        if let Some(size) = total {
            info!("File size: {}", crate::output::format_size(size));
            if size > self.max_package_bytes {
                return Err(FetchError::TooLarge {
                    size,
                    limit: self.max_package_bytes,
                });
            }
        }

        let progress = self.progress_bar(total);
        let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = [0u8; CHUNK_SIZE];

        loop {
            let read = response
                .read(&mut chunk)
                .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e)))?;
            if read == 0 {
                break;
            }

            body.extend_from_slice(&chunk[..read]);
            progress.set_position(body.len() as u64);

            if body.len() as u64 > self.max_package_bytes {
                progress.abandon();
                return Err(FetchError::TooLarge {
                    size: body.len() as u64,
                    limit: self.max_package_bytes,
                });
            }
        }

        progress.finish_and_clear();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Downloads one package and rejects responses that cannot be a CRX.
///
/// No retries; the caller decides whether to try again.
pub fn fetch_package<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    config: &FetchConfig,
) -> Result<Vec<u8>, FetchError> {
    debug!(url, "downloading package");
    let response = client.get(url)?;

    match response.status {
        204 => {
            warn!("HTTP 204: No Content - extension may not be available for download");
            return Err(FetchError::NoContent);
        }
        200..=299 => {}
        status => return Err(FetchError::Status(status)),
    }

    let is_html = response
        .content_type
        .as_deref()
        .is_some_and(|content_type| content_type.to_ascii_lowercase().contains("text/html"));
    if is_html {
        warn!("received HTML instead of a CRX file");
        return Err(FetchError::HtmlResponse);
    }

    if response.body.is_empty() {
        return Err(FetchError::NoContent);
    }

    let size = response.body.len() as u64;
    if size > config.max_package_bytes {
        return Err(FetchError::TooLarge {
            size,
            limit: config.max_package_bytes,
        });
    }

    info!("Download completed: {}", crate::output::format_size(size));
    Ok(response.body)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Mock HTTP client for testing
    pub struct MockHttpClient {
        pub response: Result<HttpResponse, FetchError>,
    }

    impl MockHttpClient {
        pub fn ok(content_type: Option<&str>, body: Vec<u8>) -> Self {
            MockHttpClient {
                response: Ok(HttpResponse {
                    status: 200,
                    content_type: content_type.map(str::to_owned),
                    body,
                }),
            }
        }

        pub fn status(status: u16) -> Self {
            MockHttpClient {
                response: Ok(HttpResponse {
                    status,
                    content_type: None,
                    body: Vec::new(),
                }),
            }
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, _url: &str) -> Result<HttpResponse, FetchError> {
            self.response.clone()
        }
    }

    const URL: &str = "https://clients2.google.com/service/update2/crx";

    #[test]
    fn test_fetch_returns_body() {
        let client = MockHttpClient::ok(Some("application/x-chrome-extension"), b"Cr24".to_vec());
        let body = fetch_package(&client, URL, &FetchConfig::default()).unwrap();
        assert_eq!(body, b"Cr24");
    }

    #[test]
    fn test_fetch_no_content() {
        let client = MockHttpClient::status(204);
        assert_eq!(
            fetch_package(&client, URL, &FetchConfig::default()),
            Err(FetchError::NoContent)
        );
    }

    #[test]
    fn test_fetch_http_error() {
        let client = MockHttpClient::status(404);
        assert_eq!(
            fetch_package(&client, URL, &FetchConfig::default()),
            Err(FetchError::Status(404))
        );
    }

    #[test]
    fn test_fetch_rejects_html() {
        let client = MockHttpClient::ok(
            Some("Text/HTML; charset=UTF-8"),
            b"<html>not here</html>".to_vec(),
        );
        assert_eq!(
            fetch_package(&client, URL, &FetchConfig::default()),
            Err(FetchError::HtmlResponse)
        );
    }

    #[test]
    fn test_fetch_rejects_empty_body() {
        let client = MockHttpClient::ok(None, Vec::new());
        assert_eq!(
            fetch_package(&client, URL, &FetchConfig::default()),
            Err(FetchError::NoContent)
        );
    }

    #[test]
    fn test_fetch_enforces_size_limit() {
        let client = MockHttpClient::ok(None, vec![0u8; 64]);
        let config = FetchConfig {
            max_package_bytes: 32,
            ..FetchConfig::default()
        };
        assert_eq!(
            fetch_package(&client, URL, &config),
            Err(FetchError::TooLarge {
                size: 64,
                limit: 32
            })
        );
    }

    #[test]
    fn test_fetch_propagates_transport_error() {
        let client = MockHttpClient {
            response: Err(FetchError::Http("connection refused".to_string())),
        };
        assert!(matches!(
            fetch_package(&client, URL, &FetchConfig::default()),
            Err(FetchError::Http(_))
        ));
    }
}
