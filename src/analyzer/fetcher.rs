//! HTTP fetcher for page downloads and auxiliary file probes
//!
//! Redirects are followed manually with a hop cap so the redirect count and
//! final URL can be recorded on the result.

use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::{Duration, Instant};
use url::Url;

/// Fixed browser-style user agent sent with every request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Maximum redirect hops before the fetch is treated as failed
const MAX_REDIRECTS: u32 = 10;

/// Result of a page fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Page downloaded; body may be any status code's body
    Success {
        status_code: u16,
        final_url: String,
        redirect_count: u32,
        body: String,
        page_size_bytes: usize,
        encoding: String,
        load_time_seconds: f64,
    },
    /// The request exceeded its timeout
    Timeout,
    /// Connection could not be established
    Unreachable { message: String },
    /// Any other failure (redirect loop, body read error, ...)
    Failed { message: String },
}

/// Builds the HTTP client shared by all fetches in a run
///
/// Redirect handling is disabled at the client level; the fetch loop follows
/// them itself so hop counts survive into the result.
pub fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page, following up to [`MAX_REDIRECTS`] redirects
pub async fn fetch_page(client: &Client, url: &Url) -> FetchOutcome {
    let start = Instant::now();
    let mut current = url.clone();
    let mut redirect_count = 0u32;

    loop {
        let response = match client.get(current.clone()).send().await {
            Ok(r) => r,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        if status.is_redirection() {
            if redirect_count >= MAX_REDIRECTS {
                return FetchOutcome::Failed {
                    message: format!("Too many redirects (> {})", MAX_REDIRECTS),
                };
            }

            let location = match response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
            {
                Some(l) => l.to_string(),
                None => {
                    return FetchOutcome::Failed {
                        message: format!("Redirect ({}) without Location header", status),
                    }
                }
            };

            current = match current.join(&location) {
                Ok(u) => u,
                Err(e) => {
                    return FetchOutcome::Failed {
                        message: format!("Invalid redirect target {}: {}", location, e),
                    }
                }
            };
            redirect_count += 1;
            continue;
        }

        let encoding = charset_from_headers(&response).unwrap_or_else(|| "utf-8".to_string());
        let final_url = response.url().to_string();

        return match response.bytes().await {
            Ok(bytes) => FetchOutcome::Success {
                status_code: status.as_u16(),
                final_url,
                redirect_count,
                page_size_bytes: bytes.len(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
                encoding,
                load_time_seconds: start.elapsed().as_secs_f64(),
            },
            Err(e) => classify_error(e),
        };
    }
}

/// Probes an auxiliary path (robots.txt, sitemap.xml) for presence
///
/// Presence means an HTTP 200 response. Any error, including timeouts,
/// counts as absence; auxiliary checks never fail an analysis.
pub async fn probe_aux_file(client: &Client, origin: &str, path: &str, timeout_secs: u64) -> bool {
    let target = format!("{}{}", origin, path);
    match client
        .get(&target)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await
    {
        Ok(response) => response.status() == StatusCode::OK,
        Err(_) => false,
    }
}

fn classify_error(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::Unreachable {
            message: e.to_string(),
        }
    } else {
        FetchOutcome::Failed {
            message: e.to_string(),
        }
    }
}

fn charset_from_headers(response: &reqwest::Response) -> Option<String> {
    // Servers occasionally repeat content-type; take the first value that
    // actually names a charset.
    response
        .headers()
        .get_all(reqwest::header::CONTENT_TYPE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|content_type| content_type.split(';'))
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset="))
        .map(|cs| cs.trim_matches('"').to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(30).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_simple_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "<html><body>hi</body></html>",
                    "text/html; charset=ISO-8859-1",
                ),
            )
            .mount(&server)
            .await;

        let client = build_http_client(5).unwrap();
        let url = Url::parse(&server.uri()).unwrap();

        match fetch_page(&client, &url).await {
            FetchOutcome::Success {
                status_code,
                redirect_count,
                encoding,
                page_size_bytes,
                ..
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(redirect_count, 0);
                assert_eq!(encoding, "iso-8859-1");
                assert_eq!(page_size_bytes, 28);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_records_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/middle"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/middle"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/end"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/end"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .mount(&server)
            .await;

        let client = build_http_client(5).unwrap();
        let url = Url::parse(&format!("{}/start", server.uri())).unwrap();

        match fetch_page(&client, &url).await {
            FetchOutcome::Success {
                redirect_count,
                final_url,
                ..
            } => {
                assert_eq!(redirect_count, 2);
                assert!(final_url.ends_with("/end"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_unreachable() {
        // Nothing listens on this port
        let client = build_http_client(5).unwrap();
        let url = Url::parse("http://127.0.0.1:1/").unwrap();

        match fetch_page(&client, &url).await {
            FetchOutcome::Unreachable { .. } => {}
            other => panic!("expected unreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_aux_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *"))
            .mount(&server)
            .await;

        let client = build_http_client(5).unwrap();
        assert!(probe_aux_file(&client, &server.uri(), "/robots.txt", 5).await);
    }

    #[tokio::test]
    async fn test_probe_aux_absent_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_http_client(5).unwrap();
        assert!(!probe_aux_file(&client, &server.uri(), "/sitemap.xml", 5).await);
    }

    #[tokio::test]
    async fn test_probe_aux_absent_on_connection_error() {
        let client = build_http_client(5).unwrap();
        assert!(!probe_aux_file(&client, "http://127.0.0.1:1", "/robots.txt", 1).await);
    }
}
