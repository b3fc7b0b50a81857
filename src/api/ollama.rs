use crate::api::{Completion, CompletionRequest, CompletionResponse};
use crate::error::Res;
use anyhow::{bail, Context};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Calls `POST <base_url>/api/generate` on an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl OllamaClient {
    /// `timeout` bounds the whole request, connection included.
    pub fn new(base_url: &Url, timeout: Duration) -> Res<Self> {
        let endpoint = base_url
            .join("api/generate")
            .with_context(|| format!("Unable to build the generate endpoint from '{base_url}'"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait::async_trait]
impl Completion for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Res<CompletionResponse> {
        debug!(
            "Sending completion request to {} with model {}",
            self.endpoint, request.model
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .with_context(|| format!("Completion request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("The completion server returned {status}: {body}");
        }

        let body: CompletionResponse = response
            .json()
            .await
            .context("Unable to read the completion response")?;
        trace!("Completion response: {}", body.response);
        Ok(body)
    }
}

/// True when an error chain contains an HTTP timeout.
pub(crate) fn is_timeout(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|re| re.is_timeout())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let base = Url::parse("http://localhost:11434/").unwrap();
        let client = OllamaClient::new(&base, Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint.as_str(),
            "http://localhost:11434/api/generate"
        );
    }

    #[test]
    fn test_plain_error_is_not_timeout() {
        assert!(!is_timeout(&anyhow::anyhow!("boom")));
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let client = OllamaClient::new(&base, Duration::from_secs(2)).unwrap();
        let err = client
            .complete(&CompletionRequest::json("m", "p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Completion request"));
    }
}
