// Per-tick systems run by the simulation in a fixed order.

pub mod income;
pub mod interaction;
pub mod movement;
pub mod spawner;
