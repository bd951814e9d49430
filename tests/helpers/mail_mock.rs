//! Mock mail delivery API for tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps a wiremock server posing as the mail delivery API
pub struct MailMockServer {
    pub server: MockServer,
}

impl MailMockServer {
    pub async fn new() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg-test",
                "queued": true
            })))
            .mount(&server)
            .await;

        Self { server }
    }

    /// URL to configure as the mailer api_url
    pub fn send_url(&self) -> String {
        format!("{}/v1/send", self.server.uri())
    }

    /// Number of delivery requests the mock has received
    pub async fn deliveries(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|reqs| reqs.len())
            .unwrap_or(0)
    }
}
