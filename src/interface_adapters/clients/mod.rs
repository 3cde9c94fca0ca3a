// Outbound HTTP clients for external services.

pub mod persistence;
