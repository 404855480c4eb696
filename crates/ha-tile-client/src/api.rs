//! Tile cloud API client

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::future::try_join_all;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::errors::{TileError, TileResult};
use crate::models::{SessionResponse, TileDetailsResponse, UserTilesResponse};
use crate::tile::{Tile, TileConnection};

pub const DEFAULT_BASE_URL: &str = "https://production.tile-api.com/api/v1";
pub const DEFAULT_APP_ID: &str = "ios-tile-production";
pub const DEFAULT_APP_VERSION: &str = "2.89.1.4774";
pub const DEFAULT_LOCALE: &str = "en-US";

/// Every Tile on an account, keyed by Tile UUID
pub type TileMap = HashMap<String, Arc<Tile>>;

/// Account-level operations of the Tile cloud
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TileApi: Send + Sync {
    /// Fetch every Tile on the account with its current details
    async fn async_get_tiles(&self) -> TileResult<TileMap>;
}

/// Client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub base_url: String,
    pub app_id: String,
    pub app_version: String,
    pub locale: String,
    /// Identifies this client installation; generated when absent
    pub client_uuid: Option<Uuid>,
    pub request_timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            client_uuid: None,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    user_uuid: String,
    expires_at: DateTime<Utc>,
}

struct ApiInner {
    http: reqwest::Client,
    options: ClientOptions,
    client_uuid: Uuid,
    username: String,
    password: String,
    session: RwLock<Option<Session>>,
}

/// Authenticated connection to the Tile cloud
#[derive(Clone)]
pub struct Api {
    inner: Arc<ApiInner>,
}

/// Log in to the Tile cloud and return a ready-to-use client
#[instrument(skip(password, options))]
pub async fn async_login(username: &str, password: &str, options: ClientOptions) -> TileResult<Api> {
    let api = Api::new(username, password, options)?;
    api.async_init().await?;
    Ok(api)
}

impl Api {
    fn new(username: &str, password: &str, options: ClientOptions) -> TileResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .build()?;
        let client_uuid = options.client_uuid.unwrap_or_else(Uuid::new_v4);

        Ok(Self {
            inner: Arc::new(ApiInner {
                http,
                options,
                client_uuid,
                username: username.to_string(),
                password: password.to_string(),
                session: RwLock::new(None),
            }),
        })
    }

    pub fn client_uuid(&self) -> Uuid {
        self.inner.client_uuid
    }

    /// UUID of the logged-in user, if a session exists
    pub async fn user_uuid(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.user_uuid.clone())
    }

    /// Register this client and open a session
    pub async fn async_init(&self) -> TileResult<()> {
        let inner = &self.inner;
        let client_path = format!("clients/{}", inner.client_uuid);

        let client_form = [
            ("app_id", inner.options.app_id.as_str()),
            ("app_version", inner.options.app_version.as_str()),
            ("locale", inner.options.locale.as_str()),
        ];
        self.send::<serde_json::Value>(
            self.request(Method::PUT, &client_path).form(&client_form),
        )
        .await?;

        let session_form = [
            ("email", inner.username.as_str()),
            ("password", inner.password.as_str()),
        ];
        let response: SessionResponse = self
            .send(
                self.request(Method::POST, &format!("{client_path}/sessions"))
                    .form(&session_form),
            )
            .await?;

        let expires_at = Utc
            .timestamp_millis_opt(response.result.session_expiration_timestamp)
            .single()
            .ok_or_else(|| TileError::InvalidPayload("bad session expiration".to_string()))?;

        info!(
            user_uuid = %response.result.user.user_uuid,
            %expires_at,
            "Tile session established"
        );
        *inner.session.write().await = Some(Session {
            user_uuid: response.result.user.user_uuid,
            expires_at,
        });
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let inner = &self.inner;
        let url = format!("{}/{}", inner.options.base_url.trim_end_matches('/'), path);

        inner
            .http
            .request(method, url)
            .header("tile_app_id", &inner.options.app_id)
            .header("tile_app_version", &inner.options.app_version)
            .header("tile_client_uuid", inner.client_uuid.to_string())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> TileResult<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "Tile API response");

        match status {
            StatusCode::UNAUTHORIZED => Err(TileError::InvalidAuth(
                response.text().await.unwrap_or_default(),
            )),
            s if s.is_success() => Ok(response.json::<T>().await?),
            s => Err(TileError::Request(format!(
                "{}: {}",
                s,
                response.text().await.unwrap_or_default()
            ))),
        }
    }

    /// The current session, or an error when it is missing or expired
    async fn session(&self) -> TileResult<Session> {
        let session = self.inner.session.read().await.clone();
        match session {
            Some(session) if session.expires_at > Utc::now() => Ok(session),
            Some(session) => Err(TileError::SessionExpired(format!(
                "session expired at {}",
                session.expires_at
            ))),
            None => Err(TileError::SessionExpired("no active session".to_string())),
        }
    }
}

#[async_trait]
impl TileConnection for Api {
    async fn tile_details(&self, tile_uuid: &str) -> TileResult<TileDetailsResponse> {
        self.session().await?;
        self.send(self.request(Method::GET, &format!("tiles/{tile_uuid}")))
            .await
    }
}

#[async_trait]
impl TileApi for Api {
    async fn async_get_tiles(&self) -> TileResult<TileMap> {
        let session = self.session().await?;
        let user_tiles: UserTilesResponse = self
            .send(self.request(
                Method::GET,
                &format!("users/{}/user_tiles", session.user_uuid),
            ))
            .await?;

        let details = try_join_all(
            user_tiles
                .result
                .iter()
                .map(|t| self.tile_details(&t.tile_uuid)),
        )
        .await?;

        let connection: Arc<dyn TileConnection> = Arc::new(self.clone());
        let tiles: TileMap = details
            .into_iter()
            .map(|payload| {
                let tile = Tile::new(Some(connection.clone()), payload);
                (tile.uuid().to_string(), Arc::new(tile))
            })
            .collect();

        debug!(count = tiles.len(), "Fetched Tiles");
        Ok(tiles)
    }
}
