//! Validator lifecycle classification.
//!
//! Buckets are not mutually exclusive. A validator that is slashed and on
//! its way out counts as both `Slashed` and `Exiting`, matching how beacon
//! explorers report network totals.

use serde::{Deserialize, Serialize};
use stader_types::{BeaconValidatorState, BeaconValidatorStatus};
use std::fmt;

/// Lifecycle category a validator can be counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleBucket {
    /// Deposited, waiting for activation.
    Queued,
    /// Attesting with no exit scheduled.
    Active,
    /// Exit initiated or completed, not yet withdrawable.
    Exiting,
    /// Slashed at any point.
    Slashed,
    /// Withdrawable or fully withdrawn.
    Withdrawn,
    /// Not known to the beacon chain.
    Unknown,
}

impl LifecycleBucket {
    /// Every bucket, in display order.
    pub const ALL: [Self; 6] = [
        Self::Queued,
        Self::Active,
        Self::Exiting,
        Self::Slashed,
        Self::Withdrawn,
        Self::Unknown,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Active => "active",
            Self::Exiting => "exiting",
            Self::Slashed => "slashed",
            Self::Withdrawn => "withdrawn",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LifecycleBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of buckets a single validator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BucketSet(u8);

impl BucketSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Add a bucket.
    pub fn insert(&mut self, bucket: LifecycleBucket) {
        self.0 |= bucket.bit();
    }

    /// Whether `bucket` is a member.
    pub fn contains(self, bucket: LifecycleBucket) -> bool {
        self.0 & bucket.bit() != 0
    }

    /// Whether no bucket matched.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in display order.
    pub fn iter(self) -> impl Iterator<Item = LifecycleBucket> {
        LifecycleBucket::ALL
            .into_iter()
            .filter(move |bucket| self.contains(*bucket))
    }
}

impl FromIterator<LifecycleBucket> for BucketSet {
    fn from_iter<I: IntoIterator<Item = LifecycleBucket>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for bucket in iter {
            set.insert(bucket);
        }
        set
    }
}

impl Serialize for BucketSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for BucketSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let buckets = Vec::<LifecycleBucket>::deserialize(deserializer)?;
        Ok(buckets.into_iter().collect())
    }
}

fn is_queued(state: BeaconValidatorState) -> bool {
    matches!(
        state,
        BeaconValidatorState::PendingInitialized | BeaconValidatorState::PendingQueued
    )
}

fn is_active(state: BeaconValidatorState) -> bool {
    state == BeaconValidatorState::ActiveOngoing
}

fn is_exiting(state: BeaconValidatorState) -> bool {
    matches!(
        state,
        BeaconValidatorState::ActiveExiting
            | BeaconValidatorState::ActiveSlashed
            | BeaconValidatorState::ExitedUnslashed
            | BeaconValidatorState::ExitedSlashed
    )
}

fn is_slashed(status: &BeaconValidatorStatus) -> bool {
    status.slashed
        || matches!(
            status.state,
            BeaconValidatorState::ActiveSlashed | BeaconValidatorState::ExitedSlashed
        )
}

fn is_withdrawn(state: BeaconValidatorState) -> bool {
    matches!(
        state,
        BeaconValidatorState::WithdrawalPossible | BeaconValidatorState::WithdrawalDone
    )
}

/// Classify a validator from its beacon status.
///
/// `None` (key absent from the beacon response) is `Unknown`. Every other
/// status matches at least one bucket.
pub fn classify(status: Option<&BeaconValidatorStatus>) -> BucketSet {
    let Some(status) = status else {
        return BucketSet::from_iter([LifecycleBucket::Unknown]);
    };

    let mut buckets = BucketSet::EMPTY;
    if is_queued(status.state) {
        buckets.insert(LifecycleBucket::Queued);
    }
    if is_active(status.state) {
        buckets.insert(LifecycleBucket::Active);
    }
    if is_exiting(status.state) {
        buckets.insert(LifecycleBucket::Exiting);
    }
    if is_slashed(status) {
        buckets.insert(LifecycleBucket::Slashed);
    }
    if is_withdrawn(status.state) {
        buckets.insert(LifecycleBucket::Withdrawn);
    }
    buckets
}
