/*!
Endpoint JSON simulé pour tester les capteurs sans API réelle

Wraps a wiremock server serving a single path. Each `respond_*` call replaces
the previous behaviour, so a test can script successive poll cycles.
*/

use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const STUB_PATH: &str = "/api/data";

pub struct StubEndpoint {
    server: MockServer,
}

impl StubEndpoint {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full URL of the stubbed resource.
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), STUB_PATH)
    }

    pub async fn respond_json(&self, body: Value) {
        self.mount(ResponseTemplate::new(200).set_body_json(body)).await;
    }

    pub async fn respond_status(&self, status: u16) {
        self.mount(ResponseTemplate::new(status)).await;
    }

    /// 200 with an arbitrary (possibly non-JSON) body.
    pub async fn respond_raw(&self, body: &str) {
        self.mount(ResponseTemplate::new(200).set_body_string(body)).await;
    }

    pub async fn respond_delayed(&self, body: Value, delay: Duration) {
        self.mount(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .await;
    }

    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Header value seen on the most recent request, if any.
    pub async fn last_header(&self, name: &str) -> Option<String> {
        self.received_requests()
            .await
            .last()
            .and_then(|req| req.headers.get(name))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn mount(&self, template: ResponseTemplate) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(STUB_PATH))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }
}
