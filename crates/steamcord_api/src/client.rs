//! Remote account service contract and its HTTP implementation.

use crate::error::{status_message, ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use steamcord_rewards::{AccountRecord, DeferredAction};
use tracing::{debug, error, warn};

pub const DEFAULT_BASE_URI: &str = "https://api.steamcord.io";

/// The remote side of account linking.
///
/// `fetch_player_by_steam_id` distinguishes a confirmed "not linked"
/// (`Ok(None)`) from a failed lookup (`Err`). Only the former may be used to
/// strip rewards.
#[async_trait]
pub trait RemoteAccountService: Send + Sync {
    async fn fetch_player_by_steam_id(&self, steam_id: &str) -> ApiResult<Option<AccountRecord>>;

    /// Pushes Steam ids onto the Steam group refresh queue.
    async fn enqueue_steam_ids(&self, steam_ids: &[String]) -> ApiResult<()>;

    async fn fetch_deferred_actions(&self) -> ApiResult<ActionBatch>;

    async fn acknowledge_actions(&self, ids: &BTreeSet<i64>) -> ApiResult<()>;
}

/// One poll of the action queue.
///
/// Entries that could not be decoded but carried an id land in
/// `undecodable`; they are acknowledged unapplied so they cannot block the
/// queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionBatch {
    pub actions: Vec<DeferredAction>,
    pub undecodable: BTreeSet<i64>,
}

impl ActionBatch {
    /// Decodes queue entries one by one.
    pub fn decode(entries: Vec<Value>) -> Self {
        let mut batch = Self::default();
        for entry in entries {
            let id = entry.get("id").and_then(Value::as_i64);
            match serde_json::from_value::<DeferredAction>(entry) {
                Ok(action) => batch.actions.push(action),
                Err(e) => match id {
                    Some(id) => {
                        warn!("Skipping undecodable deferred action {}: {}", id, e);
                        batch.undecodable.insert(id);
                    }
                    None => warn!("Dropping deferred action without an id: {}", e),
                },
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.undecodable.is_empty()
    }
}

/// [`RemoteAccountService`] backed by the Steamcord REST API.
#[derive(Debug, Clone)]
pub struct SteamcordApiClient {
    http: Client,
    base_uri: String,
    token: String,
}

impl SteamcordApiClient {
    pub fn new(token: impl Into<String>, base_uri: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/json")
    }

    /// Sends the request and returns the body of a success response.
    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(body);
        }

        error!("[Steamcord] {}", status_message(status.as_u16()));
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RemoteAccountService for SteamcordApiClient {
    async fn fetch_player_by_steam_id(&self, steam_id: &str) -> ApiResult<Option<AccountRecord>> {
        let request = self
            .http
            .get(self.url("/players"))
            .query(&[("steamId", steam_id)]);
        let mut players: Vec<AccountRecord> = self.get_json(request).await?;

        match players.len() {
            0 => Ok(None),
            1 => Ok(players.pop()),
            n => Err(ApiError::UnexpectedResponse(format!(
                "expected at most one player for Steam id {steam_id}, got {n}"
            ))),
        }
    }

    async fn enqueue_steam_ids(&self, steam_ids: &[String]) -> ApiResult<()> {
        if steam_ids.is_empty() {
            return Err(ApiError::InvalidArgument(
                "at least one Steam id is required".to_string(),
            ));
        }

        let request = self.http.post(self.url("/steam-groups/queue")).json(steam_ids);
        self.send(request).await?;
        debug!("Enqueued {} Steam id(s) for group refresh", steam_ids.len());
        Ok(())
    }

    async fn fetch_deferred_actions(&self) -> ApiResult<ActionBatch> {
        let entries: Vec<Value> = self.get_json(self.http.get(self.url("/action-queue"))).await?;
        Ok(ActionBatch::decode(entries))
    }

    async fn acknowledge_actions(&self, ids: &BTreeSet<i64>) -> ApiResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let request = self.http.post(self.url("/action-queue/ack")).json(ids);
        self.send(request).await?;
        debug!("Acknowledged {} deferred action(s)", ids.len());
        Ok(())
    }
}
