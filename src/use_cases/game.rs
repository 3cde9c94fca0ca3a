use super::types::{GameEvent, JoinAccepted, PlayerSeed, WorldUpdate};
use crate::domain::systems::interaction::{self, InteractionOutcome};
use crate::domain::systems::movement::{self, MovementConfig};
use crate::domain::systems::{income, spawner};
use crate::domain::tuning::GameTuning;
use crate::domain::{
    BaseSnapshot, BrainSnapshot, JoinError, PlayerId, PlayerSnapshot, RemovedPlayer,
    WorldState,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

// Longest step a stalled tick may integrate at once.
const MAX_DT: f32 = 0.25;

/// Authoritative game state plus everything needed to advance it.
pub struct Simulation {
    world: WorldState,
    rng: StdRng,
    tick: u64,
}

impl Simulation {
    pub fn new(tuning: GameTuning, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            world: WorldState::new(tuning),
            rng,
            tick: 0,
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Puts the configured number of starting brains on the ground.
    pub fn populate(&mut self) {
        for _ in 0..self.world.tuning.brain.initial {
            spawner::spawn_one(&mut self.world, &mut self.rng);
        }
    }

    pub fn join(
        &mut self,
        player_id: PlayerId,
        name: String,
        account: Option<String>,
        seed: Option<PlayerSeed>,
    ) -> Result<JoinAccepted, JoinError> {
        let base_id = self.world.add_player(player_id, name, &mut self.rng)?;

        let mut seeded = 0;
        if let Some(seed) = seed {
            seeded = self.world.seed_stored(player_id, &seed.kinds);
            if seeded < seed.kinds.len() {
                warn!(
                    player_id,
                    dropped = seed.kinds.len() - seeded,
                    "base full; saved brains dropped"
                );
            }
            if let Some(player) = self.world.player_mut(player_id) {
                player.money = seed.money.max(0.0);
            }
        }
        if let Some(player) = self.world.player_mut(player_id) {
            player.account = account;
        }

        info!(player_id, base_id, seeded, "player joined");
        Ok(JoinAccepted {
            player_id,
            base_id,
            seeded,
        })
    }

    pub fn leave(&mut self, player_id: PlayerId) -> Option<RemovedPlayer> {
        let removed = self.world.remove_player(player_id)?;
        info!(
            player_id,
            released = removed.stored_kinds.len(),
            "player left"
        );
        Some(removed)
    }

    pub fn handle_event(&mut self, ev: GameEvent) {
        match ev {
            GameEvent::Join {
                player_id,
                name,
                account,
                seed,
                reply,
            } => {
                let result = self.join(player_id, name, account, seed);
                if let Err(e) = &result {
                    warn!(player_id, error = %e, "join rejected");
                }
                // A dropped receiver means the connection is gone; its Leave follows.
                let _ = reply.send(result);
            }
            GameEvent::Leave { player_id, reply } => {
                let removed = self.leave(player_id);
                if let (Some(reply), Some(removed)) = (reply, removed) {
                    let _ = reply.send(removed);
                }
            }
            GameEvent::Input { player_id, input } => {
                // Last write wins; stale players are ignored.
                self.world.set_input(player_id, input);
            }
            GameEvent::SetName { player_id, name } => {
                if self.world.set_name(player_id, name.clone()) {
                    debug!(player_id, name = %name, "player renamed");
                }
            }
        }
    }

    /// Advances the world by `dt` seconds and returns the resulting snapshot.
    ///
    /// Movement integrates at most `MAX_DT`; income accrues over the full elapsed time.
    pub fn step(&mut self, now_ms: u64, dt: f32) -> WorldUpdate {
        let elapsed = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let move_dt = elapsed.min(MAX_DT);
        let tuning = self.world.tuning;
        let movement_cfg = MovementConfig::new(tuning.player, tuning.arena);

        for base in self.world.bases_mut() {
            if base.shield.expire(now_ms) {
                debug!(base_id = base.id, "shield expired");
            }
        }

        for player_id in self.world.player_ids() {
            if let Some(player) = self.world.player_mut(player_id) {
                movement::tick_player(player, move_dt, movement_cfg);
            }

            for outcome in interaction::resolve_player(&mut self.world, player_id, now_ms) {
                log_outcome(player_id, outcome);
            }

            income::accrue(&mut self.world, player_id, elapsed);
        }

        // Carried brains float above their carrier.
        let carried: Vec<(u64, f32, f32)> = self
            .world
            .players()
            .filter_map(|p| p.carrying.map(|brain_id| (brain_id, p.x, p.y)))
            .collect();
        for (brain_id, x, y) in carried {
            if let Some(brain) = self.world.brain_mut(brain_id) {
                brain.x = x;
                brain.y = y - tuning.brain.carry_offset;
            }
        }

        if let Some(brain_id) = spawner::tick_spawner(&mut self.world, &mut self.rng) {
            debug!(brain_id, "brain spawned");
        }

        self.tick += 1;
        self.snapshot(now_ms)
    }

    pub fn snapshot(&self, now_ms: u64) -> WorldUpdate {
        let mut players: Vec<PlayerSnapshot> =
            self.world.players().map(PlayerSnapshot::from).collect();
        players.sort_unstable_by_key(|p| p.id);

        WorldUpdate {
            tick: self.tick,
            server_time_ms: now_ms,
            players,
            brains: self.world.brains().map(BrainSnapshot::from).collect(),
            bases: self.world.bases().map(BaseSnapshot::from).collect(),
        }
    }
}

fn log_outcome(player_id: PlayerId, outcome: InteractionOutcome) {
    match outcome {
        InteractionOutcome::PickedUp { brain_id } => {
            debug!(player_id, brain_id, "brain picked up");
        }
        InteractionOutcome::Deposited { brain_id, base_id } => {
            debug!(player_id, brain_id, base_id, "brain deposited");
        }
        InteractionOutcome::Stole {
            brain_id,
            from_base,
        } => {
            info!(player_id, brain_id, from_base, "brain stolen");
        }
        InteractionOutcome::ShieldRaised { base_id } => {
            info!(player_id, base_id, "shield raised");
        }
    }
}

pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    tick_interval: Duration,
    mut sim: Simulation,
) {
    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        interval.tick().await;

        // Drain everything queued since the last tick before simulating.
        loop {
            match input_rx.try_recv() {
                Ok(ev) => sim.handle_event(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!(tick = sim.tick(), "input channel closed; world task exiting");
                    return;
                }
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        let update = sim.step(epoch_millis(), dt);
        // No subscribers is fine; updates are fire-and-forget.
        let _ = world_tx.send(update);
    }
}
