use std::time::Duration;

use {
    reqwest::{RequestBuilder, Response},
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::trace,
};

use {
    crate::error::{Error, Result},
    ragbridge_config::AssistantConfig,
};

/// Header selecting the Assistants API revision.
const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Thin authenticated wrapper around the Assistants REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl AssistantClient {
    pub fn new(base_url: impl Into<String>, api_key: Secret<String>) -> Result<Self> {
        // No overall request timeout: streamed runs stay open for as long as
        // the assistant is generating. The per-query deadline lives in the
        // router.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), config.api_key.clone())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start an authenticated POST to `path` (relative to the base URL).
    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .bearer_auth(self.api_key.expose_secret())
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
    }

    /// Send `request`, require a success status, and decode the JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = ensure_success(request.send().await?).await?;
        let body = resp.text().await?;
        trace!(body = %body, "assistant api response");
        Ok(serde_json::from_str(&body)?)
    }
}

/// Turn a non-success response into [`Error::Api`], keeping the body text for
/// diagnostics.
pub(crate) async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let client =
            AssistantClient::new("https://api.example.com/v1/", Secret::new("k".into())).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/v1");
        assert_eq!(
            client.url("threads/runs"),
            "https://api.example.com/v1/threads/runs"
        );
        assert_eq!(
            client.url("/assistants"),
            "https://api.example.com/v1/assistants"
        );
    }

    #[test]
    fn debug_hides_api_key() {
        let client =
            AssistantClient::new("https://api.example.com/v1", Secret::new("sk-secret".into()))
                .unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk-secret"));
    }
}
