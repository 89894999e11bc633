use std::{future::Future, time::Duration};

use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Received invalid JSON response from server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

pub fn http_client(timeout: Duration) -> Result<Client, HttpError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(HttpError::Client)
}

/// Headers for the config service: `apikey` plus a bearer token with the same key.
pub fn http_api_key_headers(api_key: &str) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(api_key)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

const RETRY_BACKOFF_MS: u64 = 100;

/// Runs `attempt` once plus up to `retries` more times while it fails to send
/// or the server answers with a 5xx status. Waits `RETRY_BACKOFF_MS * attempt`
/// between tries.
pub async fn http_send_with_retry<F, Fut>(retries: u32, mut attempt: F) -> Result<Response, HttpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, HttpError>>,
{
    let mut tries: u32 = 0;
    loop {
        tries += 1;
        match attempt().await {
            Ok(response) if !response.status().is_server_error() => return Ok(response),
            Ok(response) if tries > retries => return Ok(response),
            Ok(response) => {
                warn!(
                    "Server responded with {}, retrying ({} left)",
                    response.status(),
                    retries + 1 - tries
                );
            }
            Err(err) if tries > retries => return Err(err),
            Err(err) => {
                warn!("HTTP request failed, retrying ({} left): {err}", retries + 1 - tries);
            }
        }
        tokio::time::sleep(Duration::from_millis(
            RETRY_BACKOFF_MS.saturating_mul(u64::from(tries)),
        ))
        .await;
    }
}

pub async fn http_read_body(response: Response) -> Result<String, HttpError> {
    let status = response.status();
    let body = response.text().await?;
    debug!("HTTP response {status}: {} bytes", body.len());
    if !status.is_success() {
        return Err(HttpError::Status { status, body });
    }
    Ok(body)
}

pub async fn http_execute(
    builder: impl Fn() -> RequestBuilder,
    retries: u32,
) -> Result<String, HttpError> {
    let response = http_send_with_retry(retries, || {
        let request = builder();
        async move { request.send().await.map_err(HttpError::from) }
    })
    .await?;
    http_read_body(response).await
}

pub async fn http_post_json<B: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &B,
    headers: Option<HeaderMap>,
    retries: u32,
) -> Result<Value, HttpError> {
    let text = http_execute(
        || {
            client
                .post(url)
                .headers(headers.clone().unwrap_or_default())
                .json(body)
        },
        retries,
    )
    .await?;
    http_parse_json(&text)
}

pub async fn http_get_json(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
    headers: Option<HeaderMap>,
    retries: u32,
) -> Result<Value, HttpError> {
    let text = http_execute(
        || {
            client
                .get(url)
                .headers(headers.clone().unwrap_or_default())
                .query(query)
        },
        retries,
    )
    .await?;
    http_parse_json(&text)
}

/// An empty body is treated as an empty JSON object.
pub fn http_parse_json(text: &str) -> Result<Value, HttpError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(text)?)
}

pub fn http_join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
