use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One HTTP round trip against a health endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Issues a GET to `url` and returns the response status code.
    async fn probe(&self, url: &str, timeout: Duration) -> Result<u16>;
}

#[async_trait]
impl HealthProbe for reqwest::Client {
    async fn probe(&self, url: &str, timeout: Duration) -> Result<u16> {
        let response = self.get(url).timeout(timeout).send().await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_reqwest_probe_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let code = reqwest::Client::new()
            .probe(&server.uri(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(code, 503);
    }

    #[tokio::test]
    async fn test_reqwest_probe_connection_refused() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = reqwest::Client::new()
            .probe(&format!("http://127.0.0.1:{port}/"), Duration::from_millis(500))
            .await;
        assert!(result.is_err());
    }
}
