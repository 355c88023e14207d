//! Sync between the in-memory journal and blob stores.
//!
//! # Responsibility
//! - Define blob-store contracts and the persisted document shape.
//! - Own the debounced push / fallback pull reconciler.
//! - Keep vendor adapters behind [`blob::RemoteBlobStore`].
//!
//! # See also
//! - `reconciler` for status transitions and stale-result rules.

pub mod blob;
pub mod document;
pub mod local_cache;
pub mod reconciler;
pub mod remote_registry;
