// Network adapter modules split by player sockets vs plain HTTP routes.

pub mod client;
pub mod internal;

pub use client::{spawn_world_serializer, ws_handler};
pub use internal::latest_state_handler;
