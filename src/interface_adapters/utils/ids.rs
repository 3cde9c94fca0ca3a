use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn counter() -> &'static AtomicU64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    // Millisecond seed keeps ids from a restarted process out of the previous run's range
    // while staying well below 2^53 for JavaScript clients.
    COUNTER.get_or_init(|| AtomicU64::new(now_millis()))
}

/// Process-unique id correlating logs for one socket.
pub fn connection_id() -> u64 {
    counter().fetch_add(1, Ordering::Relaxed)
}

/// Process-unique id for a player spawned into the world.
pub fn player_id() -> u64 {
    counter().fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_never_repeat() {
        let a = connection_id();
        let b = player_id();
        let c = player_id();
        assert!(a < b && b < c);
    }
}
