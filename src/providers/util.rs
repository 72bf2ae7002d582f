use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends a feed request, resending it up to `retries` more times after a
/// transport failure with `delay_ms` between tries.
///
/// Only transport errors are retried. A response carrying an error status
/// is handed back as is.
pub async fn with_retry<F, Fut>(
    mut send: F,
    retries: usize,
    delay_ms: u64,
) -> Result<reqwest::Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = reqwest::Result<reqwest::Response>>,
{
    let attempts = retries + 1;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match send().await {
            Ok(response) => return Ok(response),
            Err(err) if attempt < attempts => {
                debug!(attempt, attempts, error = %err, "Feed request failed, retrying");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(err) => {
                warn!(attempts, error = %err, "Feed request failed");
                return Err(err).with_context(|| format!("Request failed after {attempts} attempt(s)"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_retries_until_exhausted() {
        let uri = {
            let mock_server = MockServer::start().await;
            mock_server.uri()
        };
        let client = reqwest::Client::new();
        let calls = AtomicUsize::new(0);

        let result = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                client.get(&uri).send()
            },
            2,
            1,
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.to_string(), "Request failed after 3 attempt(s)");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_sends_once() {
        let uri = {
            let mock_server = MockServer::start().await;
            mock_server.uri()
        };
        let client = reqwest::Client::new();
        let calls = AtomicUsize::new(0);

        let result = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                client.get(&uri).send()
            },
            0,
            1,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = reqwest::Client::new();

        let response = with_retry(|| client.get(mock_server.uri()).send(), 3, 1)
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);
    }
}
