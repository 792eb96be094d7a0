use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::Client;
use serde_json::{json, Value};

use super::types::{GraphqlRequest, SourceError};

/// Longest slice of a non-JSON body kept for diagnostics.
const MAX_ERROR_TEXT: usize = 1000;

/// Build request headers from the configured auth strings.
///
/// `auth_header` is either `Name: Value` or a bare token, which becomes the
/// `Authorization` value.
pub fn auth_headers(
    auth_header: Option<&str>,
    auth_cookie: Option<&str>,
) -> Result<HeaderMap, SourceError> {
    let mut headers = HeaderMap::new();

    if let Some(raw) = auth_header {
        let (name, value) = match raw.split_once(':') {
            Some((k, v)) => (
                HeaderName::from_bytes(k.trim().as_bytes())
                    .map_err(|e| SourceError::InvalidHeader(e.to_string()))?,
                v.trim(),
            ),
            None => (AUTHORIZATION, raw.trim()),
        };
        let value =
            HeaderValue::from_str(value).map_err(|e| SourceError::InvalidHeader(e.to_string()))?;
        headers.insert(name, value);
    }

    if let Some(cookie) = auth_cookie {
        let value =
            HeaderValue::from_str(cookie).map_err(|e| SourceError::InvalidHeader(e.to_string()))?;
        headers.insert(COOKIE, value);
    }

    Ok(headers)
}

/// Ensure the endpoint ends in `/query`.
pub fn query_endpoint(url: &str) -> String {
    if url.ends_with("/query") {
        url.to_string()
    } else if url.ends_with('/') {
        format!("{url}query")
    } else {
        format!("{url}/query")
    }
}

/// POSTs `{query, variables?}` bodies with the configured auth headers.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: Client,
    headers: HeaderMap,
}

impl GraphqlClient {
    pub fn new(http: Client, headers: HeaderMap) -> Self {
        Self { http, headers }
    }

    /// Send one query. Transport errors and non-JSON bodies are errors.
    pub async fn try_post(
        &self,
        endpoint: &str,
        request: &GraphqlRequest<'_>,
    ) -> Result<Value, SourceError> {
        let resp = self
            .http
            .post(endpoint)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|_| SourceError::NonJson {
            status,
            text: text.chars().take(MAX_ERROR_TEXT).collect(),
        })
    }

    /// Like [`Self::try_post`], but failures come back as an `errors` payload.
    pub async fn post(&self, endpoint: &str, request: &GraphqlRequest<'_>) -> Value {
        match self.try_post(endpoint, request).await {
            Ok(v) => v,
            Err(SourceError::NonJson { status, text }) => json!({
                "errors": [{ "message": "Non-JSON response", "status": status, "text": text }]
            }),
            Err(e) => json!({ "errors": [{ "message": format!("Network error: {e}") }] }),
        }
    }
}
