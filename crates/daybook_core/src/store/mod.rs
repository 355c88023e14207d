//! Entry storage for the running session.
//!
//! # Responsibility
//! - Hold every journal entry in memory, keyed by date.
//! - Keep persistence out: serialization belongs to the sync layer.

pub mod entry_store;
