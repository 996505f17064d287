//! Shared type definitions for the Queueline walk-in queue service.
//!
//! This crate is the single source of truth for the queue data model used by
//! the storage layer and the request boundary. Types defined here flow
//! downstream to `TypeScript` via `ts-rs` for the customer and staff pages.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for entry identifiers
//! - [`enums`] -- The entry status lifecycle
//! - [`structs`] -- Queue entries, registrations and summaries
//! - [`events`] -- Notifications broadcast to connected observers

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EntryStatus, ParseStatusError};
pub use events::QueueEvent;
pub use ids::EntryId;
pub use structs::{QueueEntry, QueueSummary, Registration, normalize_name};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings into `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::EntryId::export_all();
        let _ = crate::enums::EntryStatus::export_all();
        let _ = crate::structs::QueueEntry::export_all();
        let _ = crate::structs::Registration::export_all();
        let _ = crate::structs::QueueSummary::export_all();
        let _ = crate::events::QueueEvent::export_all();
    }
}
