//! Notifications broadcast to connected observers.
//!
//! Observers receive one JSON frame per event, tagged by `kind`:
//!
//! ```json
//! {"kind":"entry-list-changed"}
//! {"kind":"status-changed","id":"0190...","status":"in-progress"}
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EntryStatus;
use crate::ids::EntryId;

/// A change to queue state that has already been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum QueueEvent {
    /// An entry was registered or removed; observers should reload the list.
    EntryListChanged,
    /// An entry moved to a new status.
    StatusChanged {
        /// The entry that changed.
        id: EntryId,
        /// Its new status.
        status: EntryStatus,
    },
}
