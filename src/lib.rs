//! Exodia card game: a JSON-file backed REST server and the client-side
//! state synchronizer that drives it.

pub mod client;
pub mod config;
pub mod http;
pub mod model;
pub mod store;
pub mod telemetry;
