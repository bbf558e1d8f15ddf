//! Remote quiz sources.
//!
//! `QuizSource` abstracts where the versioned document comes from, so the
//! sync service can be driven by HTTP in production and by in-memory
//! sources in tests. Sources return the raw body; parsing happens in the
//! sync service so the exact bytes can be persisted.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{QuizError, QuizResult};

/// Maximum redirects followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// A place the quiz document can be fetched from.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch the raw document body.
    ///
    /// Must fail with `QuizError::Network` on transport failure, timeout, or
    /// a non-success status. Must not retry on its own.
    async fn fetch(&self, timeout: Duration) -> QuizResult<String>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Fetches the document with an HTTP GET against a fixed URL.
#[derive(Clone)]
pub struct HttpQuizSource {
    url: String,
    client: reqwest::Client,
}

impl HttpQuizSource {
    pub fn new(url: &str, user_agent: &str) -> QuizResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .map_err(|e| QuizError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QuizSource for HttpQuizSource {
    async fn fetch(&self, timeout: Duration) -> QuizResult<String> {
        tracing::debug!("GET {} (timeout {:?})", self.url, timeout);

        let resp = self
            .client
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| network_error(&self.url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(QuizError::Network(format!(
                "{} returned {}",
                self.url, status
            )));
        }

        let body = resp.text().await.map_err(|e| network_error(&self.url, e))?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), self.url);
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn network_error(url: &str, e: reqwest::Error) -> QuizError {
    if e.is_timeout() {
        QuizError::Network(format!("request to {url} timed out"))
    } else if e.is_connect() {
        QuizError::Network(format!("could not connect to {url}: {e}"))
    } else {
        QuizError::Network(format!("request to {url} failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_source_creation() {
        let source = HttpQuizSource::new("https://example.com/quizzes.json", "quiz-cache/test").unwrap();
        assert_eq!(source.url(), "https://example.com/quizzes.json");
        assert_eq!(source.describe(), "https://example.com/quizzes.json");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let source = HttpQuizSource::new("http://127.0.0.1:9/quizzes.json", "quiz-cache/test").unwrap();
        let err = source.fetch(Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, QuizError::Network(_)), "got {err:?}");
    }
}
