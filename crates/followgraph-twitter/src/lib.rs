//! Twitter v1.1 REST client.
//!
//! Implements `AccountSource` on top of `users/show`, `friends/ids` and
//! `users/lookup`. Pagination and rate-limit waits are handled here so the
//! crawler only ever sees complete results.

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{Credentials, OAuthCredentials};
pub use error::{Result, TwitterError};
pub use types::{IdsPage, TwitterUser};

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use followgraph_core::{Account, AccountSource, ExternalId, Profile, SourceError};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::Nonce;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Largest page `friends/ids` will return.
const IDS_PAGE_SIZE: u32 = 5000;

/// Rate-limit windows are 15 minutes; never sleep longer than one window.
const MAX_RATE_LIMIT_SLEEP_SECS: i64 = 15 * 60;

/// Connection settings for the Twitter API.
///
/// Loaded from the `[twitter]` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    /// OAuth 1.0a consumer key. The four OAuth fields are used together and
    /// take precedence over `bearer_token`.
    #[serde(default)]
    pub consumer_key: String,

    #[serde(default)]
    pub consumer_secret: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub access_secret: String,

    /// App-only bearer token.
    #[serde(default)]
    pub bearer_token: String,

    /// API root, without trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// How many times a rate-limited request waits for the window to reset
    /// before giving up.
    #[serde(default = "default_max_rate_limit_waits")]
    pub max_rate_limit_waits: u32,
}

fn default_api_base() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_rate_limit_waits() -> u32 {
    15
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_secret: String::new(),
            bearer_token: String::new(),
            api_base: default_api_base(),
            max_rate_limit_waits: default_max_rate_limit_waits(),
        }
    }
}

impl TwitterConfig {
    /// The complete credential set to authorize with.
    ///
    /// Fails when OAuth fields are only partly filled in, or when neither
    /// OAuth nor a bearer token is configured.
    pub fn credentials(&self) -> Result<Credentials> {
        let oauth = [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_secret", &self.access_secret),
        ];
        let missing: Vec<&str> = oauth
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            return Ok(Credentials::OAuth1(OAuthCredentials {
                consumer_key: self.consumer_key.clone(),
                consumer_secret: self.consumer_secret.clone(),
                access_token: self.access_token.clone(),
                access_secret: self.access_secret.clone(),
            }));
        }
        if missing.len() < oauth.len() {
            return Err(TwitterError::Credentials(format!(
                "incomplete OAuth 1.0a credentials, missing twitter.{}",
                missing.join(", twitter.")
            )));
        }
        if !self.bearer_token.trim().is_empty() {
            return Ok(Credentials::Bearer(self.bearer_token.clone()));
        }
        Err(TwitterError::Credentials(
            "set twitter.consumer_key, consumer_secret, access_token and access_secret, \
             or twitter.bearer_token"
                .to_string(),
        ))
    }
}

pub struct TwitterClient {
    client: reqwest::Client,
    config: TwitterConfig,
    credentials: Credentials,
}

impl TwitterClient {
    pub fn new(config: TwitterConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            credentials,
        })
    }

    /// `users/show` for a single screen name.
    pub async fn show_user(&self, screen_name: &str) -> Result<TwitterUser> {
        self.get("users/show.json", &[("screen_name", screen_name.to_string())])
            .await
    }

    /// `friends/ids`, following cursors until the last page.
    pub async fn friend_ids(&self, screen_name: &str) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        let mut cursor: i64 = -1;

        loop {
            let page: IdsPage = self
                .get(
                    "friends/ids.json",
                    &[
                        ("screen_name", screen_name.to_string()),
                        ("cursor", cursor.to_string()),
                        ("count", IDS_PAGE_SIZE.to_string()),
                    ],
                )
                .await?;

            tracing::debug!(
                screen_name,
                page_ids = page.ids.len(),
                next_cursor = page.next_cursor,
                "Fetched friends page"
            );

            ids.extend(page.ids);
            if page.next_cursor == 0 {
                break;
            }
            cursor = page.next_cursor;
        }

        Ok(ids)
    }

    /// `users/lookup` for a comma-joined id list.
    pub async fn lookup_users(&self, ids: &[ExternalId]) -> Result<Vec<TwitterUser>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.get(
            "users/lookup.json",
            &[
                ("include_entities", "false".to_string()),
                ("user_id", join_ids(ids)),
            ],
        )
        .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.config.api_base.trim_end_matches('/'), path);
        let mut waits = 0;

        loop {
            let request = self.client.get(&url).query(query);
            let request = match &self.credentials {
                Credentials::OAuth1(oauth) => request.header(
                    AUTHORIZATION,
                    auth::authorization_header(oauth, "GET", &url, query, &Nonce::fresh()),
                ),
                Credentials::Bearer(token) => request.bearer_auth(token),
            };
            let resp = request.send().await?;

            let status = resp.status();
            tracing::debug!(path, status = status.as_u16(), "Twitter request");

            if status == StatusCode::TOO_MANY_REQUESTS {
                if waits >= self.config.max_rate_limit_waits {
                    return Err(TwitterError::RateLimited { waits });
                }
                waits += 1;
                let delay = rate_limit_delay(resp.headers(), Utc::now().timestamp());
                tracing::warn!(
                    path,
                    wait_secs = delay.as_secs(),
                    attempt = waits,
                    "Rate limited, waiting for window reset"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(TwitterError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let body = resp.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }
    }
}

#[async_trait]
impl AccountSource for TwitterClient {
    async fn lookup_account(&self, screen_name: &str) -> std::result::Result<Account, SourceError> {
        match self.show_user(screen_name).await {
            Ok(user) => Ok(user.into_account()),
            Err(e) if e.is_not_found() => Err(SourceError::NotFound {
                screen_name: screen_name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_followed_ids(
        &self,
        screen_name: &str,
    ) -> std::result::Result<Vec<ExternalId>, SourceError> {
        match self.friend_ids(screen_name).await {
            Ok(ids) => Ok(ids.into_iter().map(ExternalId).collect()),
            Err(e) if e.is_not_found() => Err(SourceError::NotFound {
                screen_name: screen_name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup_profiles(
        &self,
        ids: &[ExternalId],
    ) -> std::result::Result<Vec<Profile>, SourceError> {
        match self.lookup_users(ids).await {
            Ok(users) => Ok(users.into_iter().map(TwitterUser::into_profile).collect()),
            // None of the requested accounts exist anymore.
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Comma-joined id list with a trailing comma, as `users/lookup` accepts.
pub fn join_ids(ids: &[ExternalId]) -> String {
    let mut joined = String::with_capacity(ids.len() * 20);
    for id in ids {
        joined.push_str(&id.0.to_string());
        joined.push(',');
    }
    joined
}

/// Time to sleep until the `x-rate-limit-reset` epoch, plus one second.
///
/// Falls back to a full window when the header is missing or unreadable.
fn rate_limit_delay(headers: &HeaderMap, now_epoch: i64) -> Duration {
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok());

    let secs = match reset {
        Some(reset) => (reset - now_epoch + 1).clamp(1, MAX_RATE_LIMIT_SLEEP_SECS),
        None => MAX_RATE_LIMIT_SLEEP_SECS,
    };
    Duration::from_secs(secs as u64)
}
