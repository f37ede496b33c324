//! Remote data adapter
//!
//! Each cycle asks the radar proxy for network-quality series and turns them
//! into pair latencies plus a historical series anchored on their mean. The
//! state machine:
//!
//! - no credential: simulator output, no network call, no advisory
//! - proxy success: series mapped onto pairs, plus a geography offset
//! - proxy fallback: same mapping over the proxy's synthetic payload, with an
//!   "API unavailable" advisory
//! - anything else: fully local enhanced mock, with the failure as advisory

pub mod engine;
pub mod geography;
pub mod mapping;
pub mod source;

pub use engine::{AdapterMode, AdapterSnapshot, LatencyAdapter};
pub use source::{NetflowSource, ProxyClient};
