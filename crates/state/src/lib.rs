//! Network and operator state aggregation.
//!
//! Reconciles registry state, beacon validator statuses and derived reward
//! figures into one immutable [`NetworkSnapshot`] per (block, slot) pair.
//!
//! # Components
//!
//! - [`classify`]: beacon status to (overlapping) lifecycle buckets
//! - [`reward_share`] / [`counts_as_rewards`]: reward split and threshold policy
//! - [`SnapshotBuilder`]: pinned, bounded fan-out over registry and beacon reads
//! - [`SnapshotCache`]: lock-light holder of the current snapshot
//! - [`Refresher`]: background rebuild loop with cancellation

pub mod builder;
pub mod cache;
pub mod classifier;
pub mod error;
pub mod refresher;
pub mod rewards;
pub mod snapshot;

pub use builder::{SnapshotBuilder, DEFAULT_MAX_CONCURRENCY};
pub use cache::{CacheStats, RefreshPhase, SnapshotCache};
pub use classifier::{classify, BucketSet, LifecycleBucket};
pub use error::{CacheError, ChainResultExt, ErrorKind, StateError};
pub use refresher::{RefreshHandle, Refresher, RefresherConfig};
pub use rewards::{counts_as_rewards, reward_share, MAX_FEE_BPS};
pub use snapshot::{
    Consistency, LifecycleCounts, NetworkDetails, NetworkSnapshot, OperatorSnapshot,
    SocializingPoolRewards, ValidatorEntry,
};
