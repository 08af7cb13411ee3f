//! Caching for the submission matrix.
//!
//! - `MatrixCache`: in-process holder with a fixed validity window
//!   (five minutes by default). Owned by the aggregator, never global.
//! - `SnapshotStore`: JSON snapshot on disk so the CLI can reuse the last
//!   build between invocations.

pub mod matrix;
pub mod snapshot;

pub use matrix::MatrixCache;
pub use snapshot::{CachedData, SnapshotStore};
