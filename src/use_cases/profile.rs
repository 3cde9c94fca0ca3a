// Loading and saving account progress through the persistence port.

use super::types::PlayerSeed;
use crate::domain::RemovedPlayer;
use crate::domain::catalog::{brain_type, kind_by_id};
use crate::domain::ports::{PlayerStore, SavedGame, StoreError};
use tracing::warn;

const MAX_USERNAME_LEN: usize = 32;

// Authenticates an account and converts its saved game into a join seed.
pub struct LoadProfileUseCase<'a, S: ?Sized> {
    pub store: &'a S,
}

impl<S> LoadProfileUseCase<'_, S>
where
    S: PlayerStore + ?Sized,
{
    pub async fn execute(&self, username: &str, password: &str) -> Result<PlayerSeed, StoreError> {
        let username = username.trim();
        if username.is_empty() || username.len() > MAX_USERNAME_LEN || password.is_empty() {
            return Err(StoreError::InvalidCredentials);
        }

        let saved = self.store.authenticate(username, password).await?;

        let mut kinds = Vec::with_capacity(saved.cats.len());
        for id in &saved.cats {
            match kind_by_id(id) {
                Some(kind) => kinds.push(kind),
                None => warn!(username, type_id = %id, "unknown brain type in save; skipping"),
            }
        }

        let money = if saved.money.is_finite() {
            saved.money.max(0.0)
        } else {
            0.0
        };
        Ok(PlayerSeed { money, kinds })
    }
}

// Persists what a departing player owned. Guests are skipped.
pub struct SaveProfileUseCase<'a, S: ?Sized> {
    pub store: &'a S,
}

impl<S> SaveProfileUseCase<'_, S>
where
    S: PlayerStore + ?Sized,
{
    /// Returns `Ok(false)` when there was nothing to save.
    pub async fn execute(&self, removed: &RemovedPlayer) -> Result<bool, StoreError> {
        let Some(username) = removed.account.as_deref() else {
            return Ok(false);
        };

        let game = SavedGame {
            // Saved unfloored so repeated saves never lose fractional income.
            money: removed.money,
            cats: removed
                .stored_kinds
                .iter()
                .map(|kind| brain_type(*kind).id.to_string())
                .collect(),
        };
        self.store.save(username, &game).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{FailureFlags, RecordingStore};

    fn removed(account: Option<&str>) -> RemovedPlayer {
        RemovedPlayer {
            id: 1,
            name: "p".to_string(),
            account: account.map(str::to_string),
            money: 10.75,
            stored_kinds: vec![2, 0],
        }
    }

    #[tokio::test]
    async fn when_credentials_valid_then_seed_maps_known_types() {
        let store = RecordingStore::new();
        store.insert_account(
            "alice",
            "pw",
            SavedGame {
                money: 12.5,
                cats: vec!["genius".into(), "mystery".into(), "common".into()],
            },
        );

        let seed = LoadProfileUseCase { store: &store }
            .execute("alice", "pw")
            .await
            .expect("expected load to succeed");

        assert_eq!(seed.money, 12.5);
        assert_eq!(seed.kinds, vec![2, 0]);
    }

    #[tokio::test]
    async fn when_password_wrong_then_invalid_credentials() {
        let store = RecordingStore::new();
        store.insert_account("alice", "pw", SavedGame::default());

        let result = LoadProfileUseCase { store: &store }
            .execute("alice", "nope")
            .await;

        assert_eq!(result, Err(StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn when_username_blank_then_store_is_not_called() {
        let store = RecordingStore::new().with_failures(FailureFlags {
            authenticate: true,
            save: false,
        });

        let result = LoadProfileUseCase { store: &store }.execute("  ", "pw").await;

        assert_eq!(result, Err(StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn when_store_down_then_load_reports_unavailable() {
        let store = RecordingStore::new().with_failures(FailureFlags {
            authenticate: true,
            save: false,
        });

        let result = LoadProfileUseCase { store: &store }.execute("alice", "pw").await;

        assert_eq!(result, Err(StoreError::Unavailable));
    }

    #[tokio::test]
    async fn when_player_had_account_then_save_keeps_fractional_money() {
        let store = RecordingStore::new();

        let saved = SaveProfileUseCase { store: &store }
            .execute(&removed(Some("alice")))
            .await
            .expect("expected save to succeed");

        assert!(saved);
        let game = store.saved_game("alice").expect("game should be saved");
        assert_eq!(game.money, 10.75);
        assert_eq!(game.cats, vec!["genius".to_string(), "common".to_string()]);
    }

    #[tokio::test]
    async fn when_guest_then_save_is_skipped() {
        let store = RecordingStore::new();

        let saved = SaveProfileUseCase { store: &store }
            .execute(&removed(None))
            .await
            .expect("expected skip");

        assert!(!saved);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn when_save_fails_then_error_is_returned() {
        let store = RecordingStore::new().with_failures(FailureFlags {
            authenticate: false,
            save: true,
        });

        let result = SaveProfileUseCase { store: &store }
            .execute(&removed(Some("alice")))
            .await;

        assert_eq!(result, Err(StoreError::Unavailable));
    }
}
