//! DStats Stats - rolling traffic counters
//!
//! This crate owns the aggregate state behind the live dashboard:
//!
//! - `CounterStore` - every request/response folds into it under one lock,
//!   so readers never see a total without its matching category increment
//! - `CategoryCounts` - insertion-ordered, cardinality-bounded key counters
//! - `Cadence` - the ticker state machine that finalizes one RPS sample per
//!   observed second boundary
//! - `EstimatePolicy` - the illustrative blocked/bypassed heuristic
//!
//! # Architecture
//!
//! ```text
//! interceptor ──record_request/record_response──┐
//!                                               ▼
//!                                         CounterStore ──snapshot()──→ query endpoint
//!                                               ▲
//! ticker (100ms) ──Cadence::tick()──finalize────┘──→ StatsSnapshot ──→ hub
//! ```

pub mod cadence;
pub mod category;
pub mod clock;
pub mod estimate;
pub mod snapshot;
pub mod store;

pub use cadence::Cadence;
pub use category::{CategoryCounts, CountMap, OVERFLOW_KEY, Recorded};
pub use clock::{Clock, ManualClock, SystemClock};
pub use estimate::{Estimate, EstimatePolicy};
pub use snapshot::{StatsReport, StatsSnapshot};
pub use store::{
    CounterOptions, CounterStore, DIRECT_REFERER, RequestRecord, UNKNOWN_USER_AGENT,
};
