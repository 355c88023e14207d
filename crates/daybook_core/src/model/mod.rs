//! Journal domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one entry shape for editing, search, interchange and sync.
//!
//! # Invariants
//! - Every entry is identified by its `DateKey`; there is no other ID.
//! - Field titles are process-wide and never stored per entry.

pub mod entry;
