//! Control API client (chat bridge or control panel → BakeRank server).

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use super::ClientError;
use crate::objects::{BakeRequest, BakeResponse, LeaderboardEntry, TestTriggerResponse};

/// Typed HTTP client for the BakeRank **control API**.
///
/// ```no_run
/// # async fn demo() -> Result<(), bakerank_sdk::client::ClientError> {
/// use bakerank_sdk::client::ControlClient;
/// use bakerank_sdk::objects::BakeResponse;
///
/// let client = ControlClient::new("http://localhost:8765".parse()?);
/// match client.bake("alice").await? {
///     BakeResponse::Accepted { item_display_name, .. } => println!("baked {item_display_name}"),
///     BakeResponse::CooldownRejected { remaining_seconds } => {
///         println!("oven cooling, {remaining_seconds}s left")
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ControlClient {
    http: Client,
    api: Url,
}

impl ControlClient {
    /// Client for the server at `server` (e.g. `http://localhost:8765`).
    pub fn new(server: Url) -> Self {
        Self::with_client(Client::new(), server)
    }

    /// Reuse an existing `reqwest::Client` (timeouts, proxies, pooling).
    pub fn with_client(http: Client, server: Url) -> Self {
        Self { http, api: server }
    }

    /// `POST /api/bake` – submit a bake for `user`.
    pub async fn bake(&self, user: impl Into<String>) -> Result<BakeResponse, ClientError> {
        let request = BakeRequest { user: user.into() };
        self.call(self.http.post(self.endpoint("bake")?).json(&request))
            .await
    }

    /// `GET /api/leaderboard?limit=N`.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, ClientError> {
        self.call(
            self.http
                .get(self.endpoint("leaderboard")?)
                .query(&[("limit", limit)]),
        )
        .await
    }

    /// `POST /api/test/explosion` – broadcast a non-scoring effect bake.
    pub async fn test_explosion(&self) -> Result<TestTriggerResponse, ClientError> {
        self.call(self.http.post(self.endpoint("test/explosion")?))
            .await
    }

    /// `POST /api/test/legendary` – broadcast a non-scoring legendary bake.
    pub async fn test_legendary(&self) -> Result<TestTriggerResponse, ClientError> {
        self.call(self.http.post(self.endpoint("test/legendary")?))
            .await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.api.join(&format!("/api/{path}"))?)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
