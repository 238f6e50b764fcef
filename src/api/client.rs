//! Graph API HTTP client with retry, rate adaptation, and proxy failover.

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::proxy::{build_http_client, ProxyPool};
use crate::api::rate::UsageTracker;
use crate::api::types::*;
use crate::error::{Error, Result};

/// Wait applied to a 429 that carries no usable hint.
const RATE_LIMIT_FALLBACK_WAIT: Duration = Duration::from_secs(60);

/// Wait applied when the limit is signaled in the response body.
const BODY_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Wait before the next attempt after a transport-level failure.
const TRANSPORT_RETRY_WAIT: Duration = Duration::from_secs(2);

/// Per-request timeout on media downloads. API calls carry none; their
/// total time is bounded by the retry budget instead.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound on manually followed redirect hops.
const MAX_REDIRECT_HOPS: usize = 5;

/// Graph error codes that mean "request limit reached" in the body:
/// application, user, and page level respectively.
const RATE_LIMIT_CODES: [i64; 3] = [4, 17, 32];

/// Graph API client. All outbound vendor traffic goes through here.
///
/// Every logical request runs under a retry budget; rate-limit signals
/// (header or body) and transport failures are consumed internally and
/// only fatal vendor refusals surface as errors. An exhausted budget is
/// not an error: the caller gets `None` and moves on.
pub struct GraphApi {
    direct_client: Client,
    access_token: String,
    base_url: String,
    max_retries: u32,
    tracker: UsageTracker,
    pool: ProxyPool,
}

impl GraphApi {
    pub fn new(
        account: &crate::config::AccountConfig,
        min_request_delay: Duration,
        max_retries: u32,
        pool: ProxyPool,
    ) -> Result<Self> {
        let direct_client = build_http_client(&account.user_agent, None)?;

        let base_url = format!(
            "{}/{}",
            account.api_base.trim_end_matches('/'),
            account.api_version.trim_matches('/')
        );

        Ok(Self {
            direct_client,
            access_token: account.access_token.clone(),
            base_url,
            max_retries,
            tracker: UsageTracker::new(min_request_delay),
            pool,
        })
    }

    /// The usage tracker fed by this client's responses.
    pub fn usage(&self) -> &UsageTracker {
        &self.tracker
    }

    /// One page of an album's photos.
    pub async fn get_album_photos_page(
        &self,
        album_id: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Option<Page<PhotoNode>>> {
        let path = format!("{}/photos", album_id);
        let limit = limit.to_string();
        let mut params = vec![
            ("fields", "id,created_time,source,name"),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor));
        }
        self.get(&path, &params, true).await
    }

    /// One page of a user's uploaded photos.
    pub async fn get_uploaded_photos_page(
        &self,
        user_id: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Option<Page<PhotoNode>>> {
        let path = format!("{}/photos", user_id);
        let limit = limit.to_string();
        let mut params = vec![
            ("type", "uploaded"),
            ("fields", "id,created_time,source,name"),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor));
        }
        self.get(&path, &params, true).await
    }

    /// One page of a user's uploaded videos.
    pub async fn get_videos_page(
        &self,
        user_id: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Option<Page<VideoNode>>> {
        let path = format!("{}/videos", user_id);
        let limit = limit.to_string();
        let mut params = vec![
            ("type", "uploaded"),
            ("fields", "id,created_time,source,description"),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor));
        }
        self.get(&path, &params, true).await
    }

    /// One page of a user's feed with attachments expanded.
    pub async fn get_feed_page(
        &self,
        user_id: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Option<Page<FeedPost>>> {
        let path = format!("{}/feed", user_id);
        let limit = limit.to_string();
        let mut params = vec![
            (
                "fields",
                "id,created_time,attachments{type,target,media,url,title,subattachments}",
            ),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor));
        }
        self.get(&path, &params, true).await
    }

    /// Follow a fully-formed `paging.next` URL.
    pub async fn get_next_page<T: DeserializeOwned>(
        &self,
        next_url: &str,
    ) -> Result<Option<Page<T>>> {
        match self.fetch_raw(next_url, true).await? {
            Some(body) => Ok(Some(parse_body(&body, next_url)?)),
            None => Ok(None),
        }
    }

    /// Rendition candidates for one photo, largest first.
    pub async fn get_photo_images(&self, photo_id: &str) -> Result<Option<PhotoNode>> {
        self.get(photo_id, &[("fields", "id,images")], true).await
    }

    /// Name lookup for a target node. Runs outside the page loop, so the
    /// adaptive delay is skipped.
    pub async fn get_node_metadata(&self, node_id: &str) -> Result<Option<NodeMetadata>> {
        self.get(node_id, &[("fields", "id,name")], false).await
    }

    /// GET a media URL for download: explicit per-request timeout and
    /// manual redirect following. A transport failure rotates the proxy
    /// before propagating so the next item starts on a fresh route.
    pub async fn download_response(&self, url: &str) -> Result<Response> {
        let client = self.http_client();
        let mut current = url.to_string();

        for _ in 0..MAX_REDIRECT_HOPS {
            let response = client
                .get(&current)
                .timeout(DOWNLOAD_TIMEOUT)
                .send()
                .await
                .map_err(|e| {
                    self.pool.rotate(true);
                    Error::Http(e)
                })?;

            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        Error::Download(format!("redirect without Location from {}", current))
                    })?;
                current = url::Url::parse(&current)?.join(location)?.to_string();
                tracing::debug!("Following redirect to {}", redact_token(&current));
                continue;
            }

            if !status.is_success() {
                return Err(Error::Download(format!(
                    "HTTP {} fetching media from {}",
                    status,
                    redact_token(&current)
                )));
            }

            return Ok(response);
        }

        Err(Error::TooManyRedirects(redact_token(url)))
    }

    /// Typed GET against the versioned API base.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        apply_delay: bool,
    ) -> Result<Option<T>> {
        let url = self.build_url(path, params)?;
        match self.fetch_raw(&url, apply_delay).await? {
            Some(body) => Ok(Some(parse_body(&body, path)?)),
            None => Ok(None),
        }
    }

    /// The retry loop every logical API request runs under.
    ///
    /// Returns the response body on success, `None` once the budget is
    /// spent. Only vendor refusals that retrying cannot fix come back
    /// as `Err`.
    async fn fetch_raw(&self, url: &str, apply_delay: bool) -> Result<Option<String>> {
        for attempt in 1..=self.max_retries {
            let client = self.http_client();

            tracing::debug!(
                "GET {} (attempt {}/{})",
                redact_token(url),
                attempt,
                self.max_retries
            );

            let response = match client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        "Transport error: {}. Rotating proxy and retrying in {}s",
                        e,
                        TRANSPORT_RETRY_WAIT.as_secs()
                    );
                    self.pool.rotate(true);
                    tokio::time::sleep(TRANSPORT_RETRY_WAIT).await;
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = rate_limit_wait(response.headers());
                tracing::warn!("Rate limited (HTTP 429), waiting {}s", wait.as_secs());
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                if let Some(code) = rate_limit_code(&body) {
                    tracing::warn!(
                        "Request limit reached (code {}), waiting {}s",
                        code,
                        BODY_LIMIT_WAIT.as_secs()
                    );
                    tokio::time::sleep(BODY_LIMIT_WAIT).await;
                    continue;
                }
                return Err(graph_error(status, &body));
            }

            if let Some(value) = response
                .headers()
                .get("x-app-usage")
                .and_then(|v| v.to_str().ok())
            {
                self.tracker.record(value);
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Connection dropped mid-response: {}. Rotating proxy", e);
                    self.pool.rotate(true);
                    tokio::time::sleep(TRANSPORT_RETRY_WAIT).await;
                    continue;
                }
            };

            if let Some(code) = rate_limit_code(&body) {
                tracing::warn!(
                    "Request limit reached (code {}), waiting {}s",
                    code,
                    BODY_LIMIT_WAIT.as_secs()
                );
                tokio::time::sleep(BODY_LIMIT_WAIT).await;
                continue;
            }

            // A refusal can ride a 200 and would parse as an empty page.
            if serde_json::from_str::<ErrorEnvelope>(&body).is_ok() {
                return Err(graph_error(status, &body));
            }

            if apply_delay {
                let delay = self.tracker.recommended_delay();
                if !delay.is_zero() {
                    tracing::debug!(
                        "Usage at {}%, pacing {}ms",
                        self.tracker.max_usage_percent(),
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }

            return Ok(Some(body));
        }

        tracing::warn!(
            "Retry budget ({}) exhausted for {}",
            self.max_retries,
            redact_token(url)
        );
        Ok(None)
    }

    fn http_client(&self) -> Client {
        match self.pool.current_client() {
            Some(client) => client,
            None => {
                if !self.pool.is_empty() {
                    tracing::warn!("No usable proxy in the pool, continuing without proxy");
                }
                self.direct_client.clone()
            }
        }
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut url = url::Url::parse(&format!(
            "{}/{}",
            self.base_url,
            path.trim_start_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token);
        for (key, value) in params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url.into())
    }
}

fn parse_body<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        Error::Api(format!(
            "Failed to parse response for {}: {} - Response: {}",
            context,
            e,
            truncate_for_log(body)
        ))
    })
}

/// Wait hint for a 429: `Retry-After` seconds if present, otherwise the
/// business-use-case header's regain estimate (minutes), otherwise the
/// fixed fallback. A zero-minute estimate falls through to the fallback.
fn rate_limit_wait(headers: &header::HeaderMap) -> Duration {
    if let Some(secs) = headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
    {
        return Duration::from_secs(secs);
    }

    if let Some(value) = headers
        .get("x-business-use-case-usage")
        .and_then(|v| v.to_str().ok())
    {
        if let Ok(usage) = serde_json::from_str::<BusinessUseCaseUsage>(value) {
            let minutes = usage
                .values()
                .flatten()
                .filter_map(|entry| entry.estimated_time_to_regain_access)
                .max()
                .unwrap_or(0);
            if minutes > 0 {
                return Duration::from_secs(minutes * 60);
            }
        }
    }

    RATE_LIMIT_FALLBACK_WAIT
}

/// The body-level rate limit code, if this body is an error envelope
/// carrying one.
fn rate_limit_code(body: &str) -> Option<i64> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let code = envelope.error.code?;
    RATE_LIMIT_CODES.contains(&code).then_some(code)
}

fn graph_error(status: StatusCode, body: &str) -> Error {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::Graph {
            code: envelope.error.code.unwrap_or(-1),
            message: envelope.error.message,
        },
        Err(_) => Error::Api(format!("HTTP {}: {}", status, truncate_for_log(body))),
    }
}

/// Replace the access token in a URL before it reaches logs.
fn redact_token(url: &str) -> String {
    let mut parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.iter().any(|(k, _)| k == "access_token") {
        let mut serializer = parsed.query_pairs_mut();
        serializer.clear();
        for (key, value) in &pairs {
            if key == "access_token" {
                serializer.append_pair(key, "redacted");
            } else {
                serializer.append_pair(key, value);
            }
        }
        drop(serializer);
    }

    parsed.to_string()
}

fn truncate_for_log(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> header::HeaderMap {
        let mut map = header::HeaderMap::new();
        for (key, value) in pairs {
            map.insert(
                header::HeaderName::from_bytes(key.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_retry_after_seconds_wins() {
        let map = headers(&[("retry-after", "30")]);
        assert_eq!(rate_limit_wait(&map), Duration::from_secs(30));
    }

    #[test]
    fn test_business_usage_minutes_used_when_no_retry_after() {
        let map = headers(&[(
            "x-business-use-case-usage",
            r#"{"123456":[{"type":"pages","estimated_time_to_regain_access":5}]}"#,
        )]);
        assert_eq!(rate_limit_wait(&map), Duration::from_secs(300));
    }

    #[test]
    fn test_fallback_wait_when_no_hints() {
        let map = header::HeaderMap::new();
        assert_eq!(rate_limit_wait(&map), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_minute_estimate_falls_back() {
        let map = headers(&[(
            "x-business-use-case-usage",
            r#"{"123456":[{"estimated_time_to_regain_access":0}]}"#,
        )]);
        assert_eq!(rate_limit_wait(&map), Duration::from_secs(60));
    }

    #[test]
    fn test_unparseable_retry_after_falls_through() {
        let map = headers(&[("retry-after", "Wed, 21 Oct 2026 07:28:00 GMT")]);
        assert_eq!(rate_limit_wait(&map), Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limit_codes_detected_in_body() {
        for code in [4, 17, 32] {
            let body = format!(
                r#"{{"error":{{"message":"limit reached","type":"OAuthException","code":{}}}}}"#,
                code
            );
            assert_eq!(rate_limit_code(&body), Some(code));
        }
    }

    #[test]
    fn test_other_error_codes_are_not_rate_limits() {
        let body = r#"{"error":{"message":"unknown node","type":"GraphMethodException","code":100}}"#;
        assert_eq!(rate_limit_code(body), None);
        assert_eq!(rate_limit_code("not even json"), None);
        assert_eq!(rate_limit_code(r#"{"data":[]}"#), None);
    }

    #[test]
    fn test_payload_bodies_are_not_error_envelopes() {
        // The success path refuses any body that parses as an envelope,
        // so page and node payloads must not.
        for body in [r#"{"data":[]}"#, r#"{"id":"1","name":"Page"}"#] {
            assert!(serde_json::from_str::<ErrorEnvelope>(body).is_err());
        }
    }

    #[test]
    fn test_graph_error_extracts_envelope() {
        let body = r#"{"error":{"message":"Unsupported get request","code":100}}"#;
        match graph_error(StatusCode::BAD_REQUEST, body) {
            Error::Graph { code, message } => {
                assert_eq!(code, 100);
                assert_eq!(message, "Unsupported get request");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_graph_error_falls_back_to_status() {
        match graph_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") {
            Error::Api(message) => assert!(message.contains("502")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_redact_token_hides_secret() {
        let url = "https://graph.example.com/v19.0/1/photos?access_token=EAAB123&limit=25";
        let redacted = redact_token(url);
        assert!(!redacted.contains("EAAB123"));
        assert!(redacted.contains("access_token=redacted"));
        assert!(redacted.contains("limit=25"));
    }

    #[test]
    fn test_redact_token_leaves_tokenless_urls_alone() {
        let url = "https://cdn.example.com/media/1.jpg?sig=abc";
        assert_eq!(redact_token(url), url);
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let body = "é".repeat(600);
        let truncated = truncate_for_log(&body);
        assert_eq!(truncated.chars().count(), 500);
    }
}
