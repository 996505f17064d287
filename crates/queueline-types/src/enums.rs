//! The entry status lifecycle.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle stage of a queue entry.
///
/// Variants are declared in lifecycle order, so the derived [`Ord`] ranks
/// `Waiting < InProgress < Done`. The store itself accepts any transition;
/// [`EntryStatus::is_regression_from`] exists for callers that want to
/// enforce forward-only movement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum EntryStatus {
    /// Registered and waiting to be called.
    #[default]
    Waiting,
    /// Currently being served.
    InProgress,
    /// Finished; eligible for removal.
    Done,
}

impl EntryStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Waiting, Self::InProgress, Self::Done];

    /// The wire name used in JSON payloads and path/body parameters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// The label of the `entry_status` enum in `PostgreSQL`.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parse a label read back from the `entry_status` column.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Whether moving from `previous` to `self` goes backwards in the lifecycle.
    pub fn is_regression_from(self, previous: Self) -> bool {
        self < previous
    }
}

impl core::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the three-value enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status {0:?}: expected one of waiting, in-progress, done")]
pub struct ParseStatusError(pub String);

impl FromStr for EntryStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_owned()))
    }
}
