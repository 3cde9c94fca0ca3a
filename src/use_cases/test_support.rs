use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::ports::{PlayerStore, SavedGame, StoreError};

type AccountTable = Arc<Mutex<HashMap<String, (String, SavedGame)>>>;

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub authenticate: bool,
    pub save: bool,
}

// In-memory persistence fake that records every save.
#[derive(Clone)]
pub(crate) struct RecordingStore {
    accounts: AccountTable,
    saves: Arc<Mutex<u32>>,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            saves: Arc::new(Mutex::new(0)),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_account(&self, username: &str, password: &str, game: SavedGame) {
        let mut guard = self.accounts.lock().expect("accounts mutex poisoned");
        guard.insert(username.to_string(), (password.to_string(), game));
    }

    pub(crate) fn saved_game(&self, username: &str) -> Option<SavedGame> {
        let guard = self.accounts.lock().expect("accounts mutex poisoned");
        guard.get(username).map(|(_, game)| game.clone())
    }

    pub(crate) fn save_count(&self) -> u32 {
        *self.saves.lock().expect("saves mutex poisoned")
    }
}

#[async_trait]
impl PlayerStore for RecordingStore {
    async fn authenticate(&self, username: &str, password: &str) -> Result<SavedGame, StoreError> {
        if self.failures.authenticate {
            return Err(StoreError::Unavailable);
        }

        let guard = self.accounts.lock().expect("accounts mutex poisoned");
        match guard.get(username) {
            Some((stored, game)) if stored == password => Ok(game.clone()),
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    async fn save(&self, username: &str, game: &SavedGame) -> Result<(), StoreError> {
        if self.failures.save {
            return Err(StoreError::Unavailable);
        }

        let mut guard = self.accounts.lock().expect("accounts mutex poisoned");
        let password = guard
            .get(username)
            .map(|(password, _)| password.clone())
            .unwrap_or_default();
        guard.insert(username.to_string(), (password, game.clone()));
        *self.saves.lock().expect("saves mutex poisoned") += 1;
        Ok(())
    }
}
