//! Document persistence on top of the key-value store.
//!
//! # Responsibility
//! - Encode/decode whole feature documents as JSON under one key.
//! - Apply the resilience policy: unreadable data loads as empty, failed
//!   writes are logged and swallowed.
//!
//! # Invariants
//! - Every save overwrites the whole document; there are no partial writes.

pub mod document_repo;
