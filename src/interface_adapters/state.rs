use crate::domain::ports::PlayerStore;
use crate::domain::tuning::GameTuning;
use crate::use_cases::WorldHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Channels into and out of the single world task.
    pub world: WorldHandle,
    // Account persistence used on credentialed join and on leave.
    pub player_store: Arc<dyn PlayerStore>,
    // Static gameplay numbers echoed to clients in `init`.
    pub tuning: GameTuning,
}
