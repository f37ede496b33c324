//! Exchange to cloud-region latency service
//!
//! Simulated and radar-backed latency snapshots for a fixed set of crypto
//! exchanges and cloud regions, refreshed on timers and served over HTTP and
//! WebSocket.

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod geo;
pub mod latency;
pub mod middleware;
pub mod models;
pub mod radar;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod store;
