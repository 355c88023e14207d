//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, search, interchange and sync into session-level APIs.
//! - Keep UI/FFI layers decoupled from storage and transport details.

pub mod journal;
