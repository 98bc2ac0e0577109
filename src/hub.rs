//! Remote dataset repository client.
//!
//! [`DatasetHub`] is the seam between the export pipeline and the actual
//! hosting service, so pushes can be faked in tests. The shipped
//! implementation talks to the Hugging Face Hub commit API: one commit per
//! file, body encoded as NDJSON with a base64 payload.

use async_trait::async_trait;
use base64::Engine;

use crate::error::{Error, Result};

/// Environment variable consulted when no token is supplied explicitly.
pub const HUB_TOKEN_ENV: &str = "HUB_TOKEN";

/// Where pushed files land and how to talk to the service.
#[async_trait]
pub trait DatasetHub: Send + Sync {
    /// Upload one file to `path` inside `repo`. A `Remote` error marks the
    /// individual push as failed without aborting the batch.
    async fn push(&self, repo: &str, path: &str, content: &str) -> Result<()>;
}

/// Resolve the access token: an explicit one wins, otherwise the
/// `HUB_TOKEN` environment variable.
pub fn resolve_token(explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
    match std::env::var(HUB_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(Error::config(format!(
            "No hub token provided and {HUB_TOKEN_ENV} is not set"
        ))),
    }
}

/// Hugging Face Hub client.
pub struct HfHubClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HfHubClient {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn commit_url(&self, repo: &str) -> String {
        format!("{}/api/datasets/{repo}/commit/main", self.endpoint)
    }

    /// Build the NDJSON commit body: a header operation followed by one
    /// base64-encoded file operation.
    fn commit_body(path: &str, content: &str) -> Result<String> {
        let header = serde_json::json!({
            "key": "header",
            "value": { "summary": format!("Upload {path}") },
        });
        let file = serde_json::json!({
            "key": "file",
            "value": {
                "path": path,
                "content": base64::engine::general_purpose::STANDARD.encode(content),
                "encoding": "base64",
            },
        });
        Ok(format!(
            "{}\n{}",
            serde_json::to_string(&header)?,
            serde_json::to_string(&file)?
        ))
    }
}

#[async_trait]
impl DatasetHub for HfHubClient {
    async fn push(&self, repo: &str, path: &str, content: &str) -> Result<()> {
        let body = Self::commit_body(path, content)?;
        let response = self
            .http
            .post(self.commit_url(repo))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::remote(format!("Push of {path} to {repo} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::remote(format!(
                "Push of {path} to {repo} rejected with {status}: {detail}"
            )));
        }
        tracing::debug!(repo, path, "file pushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_body_encodes_content() {
        let body = HfHubClient::commit_body("raw/doc1.txt", "hello").unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);

        let header: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["key"], "header");

        let file: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(file["value"]["path"], "raw/doc1.txt");
        assert_eq!(
            file["value"]["content"],
            base64::engine::general_purpose::STANDARD.encode("hello")
        );
    }

    #[test]
    fn test_explicit_token_wins() {
        assert_eq!(resolve_token(Some(" tok ")).unwrap(), "tok");
    }

    #[test]
    fn test_blank_token_falls_through() {
        // Process env is shared across tests, so only assert the error
        // when the fallback variable is absent too.
        if std::env::var(HUB_TOKEN_ENV).is_err() {
            let err = resolve_token(Some("  ")).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        }
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = HfHubClient::new("https://hub.example/", "tok");
        assert_eq!(
            client.commit_url("org/tamil-raw"),
            "https://hub.example/api/datasets/org/tamil-raw/commit/main"
        );
    }
}
