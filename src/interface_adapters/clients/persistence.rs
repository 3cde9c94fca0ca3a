use crate::domain::ports::{PlayerStore, SavedGame, StoreError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    username: &'a str,
    money: f64,
    cats: &'a [String],
}

#[derive(Debug)]
pub enum PersistenceClientError {
    Build(reqwest::Error),
    Transport(reqwest::Error),
    Status(StatusCode),
    Decode(reqwest::Error),
}

impl fmt::Display for PersistenceClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceClientError::Build(e) => write!(f, "failed to build http client: {e}"),
            PersistenceClientError::Transport(e) => write!(f, "request failed: {e}"),
            PersistenceClientError::Status(status) => write!(f, "unexpected status {status}"),
            PersistenceClientError::Decode(e) => write!(f, "invalid response body: {e}"),
        }
    }
}

impl std::error::Error for PersistenceClientError {}

impl From<PersistenceClientError> for StoreError {
    fn from(e: PersistenceClientError) -> Self {
        match e {
            PersistenceClientError::Status(StatusCode::UNAUTHORIZED) => {
                StoreError::InvalidCredentials
            }
            _ => StoreError::Unavailable,
        }
    }
}

// Thin reqwest client for the account persistence service.
#[derive(Clone)]
pub struct HttpPlayerStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPlayerStore {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PersistenceClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PersistenceClientError::Build)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post_authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SavedGame, PersistenceClientError> {
        let url = format!("{}/authenticate", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&AuthenticateRequest { username, password })
            .send()
            .await
            .map_err(PersistenceClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersistenceClientError::Status(status));
        }
        response
            .json::<SavedGame>()
            .await
            .map_err(PersistenceClientError::Decode)
    }

    async fn post_save(
        &self,
        username: &str,
        game: &SavedGame,
    ) -> Result<(), PersistenceClientError> {
        let url = format!("{}/save", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&SaveRequest {
                username,
                money: game.money,
                cats: &game.cats,
            })
            .send()
            .await
            .map_err(PersistenceClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersistenceClientError::Status(status));
        }
        Ok(())
    }
}

#[async_trait]
impl PlayerStore for HttpPlayerStore {
    async fn authenticate(&self, username: &str, password: &str) -> Result<SavedGame, StoreError> {
        self.post_authenticate(username, password)
            .await
            .map_err(|e| {
                debug!(username, error = %e, "authenticate request failed");
                StoreError::from(e)
            })
    }

    async fn save(&self, username: &str, game: &SavedGame) -> Result<(), StoreError> {
        self.post_save(username, game).await.map_err(|e| {
            debug!(username, error = %e, "save request failed");
            StoreError::from(e)
        })
    }
}
