use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// The serialization within this layer is a dependency leak, but it keeps the
// persistence payload in one place.
// Progress the persistence service keeps per account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    #[serde(default)]
    pub money: f64,
    // Brain type ids, bottom of the base stack first.
    #[serde(default)]
    pub cats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    InvalidCredentials,
    Unavailable,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidCredentials => write!(f, "invalid credentials"),
            StoreError::Unavailable => write!(f, "persistence unavailable"),
        }
    }
}

impl std::error::Error for StoreError {}

// Port for the external auth/persistence collaborator.
// Use cases depend on this trait, not the concrete HTTP client.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<SavedGame, StoreError>;
    async fn save(&self, username: &str, game: &SavedGame) -> Result<(), StoreError>;
}
