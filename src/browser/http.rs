//! Plain HTTP page fetches.
//!
//! Used when the browser session cannot load a page. The request carries the
//! same identity and navigation headers a desktop browser would send, but no
//! script runs, so pages that render client-side come back mostly empty.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::error::FetchError;
use super::session::PageFetcher;

/// Default request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Headers sent with every request, besides the user agent.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers
}

/// Fetches raw page markup with `reqwest`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(browser_headers())
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Launch(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, _wait: Duration) -> Result<String, FetchError> {
        debug!("HTTP GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::navigation(url, e)
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::navigation(url, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::navigation(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_lowercase()
        });
        (format!("http://{}/s?k=tv", addr), handle)
    }

    #[tokio::test]
    async fn test_page_fetched_with_browser_headers() {
        let (url, server) = serve_once("200 OK", "<html>deals</html>").await;
        let fetcher = HttpFetcher::new("Mozilla/5.0 (X11; Linux x86_64) Test", DEFAULT_HTTP_TIMEOUT).unwrap();

        let body = fetcher.fetch(&url, Duration::ZERO).await.unwrap();
        assert_eq!(body, "<html>deals</html>");

        let request = server.await.unwrap();
        assert!(request.contains("user-agent: mozilla/5.0 (x11; linux x86_64) test"));
        assert!(request.contains("accept: text/html"));
        assert!(request.contains("accept-language: en-us"));
    }

    #[tokio::test]
    async fn test_non_ok_status_is_failure() {
        let (url, server) = serve_once("503 Service Unavailable", "blocked").await;
        let fetcher = HttpFetcher::new("ua", DEFAULT_HTTP_TIMEOUT).unwrap();

        let err = fetcher.fetch(&url, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, FetchError::Navigation { ref message, .. } if message.contains("503")));
        server.await.unwrap();
    }
}
