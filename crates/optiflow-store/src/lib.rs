//! # Optiflow Store
//!
//! Versioned document repository. Every update is stored as a new
//! revision with a semantic version bump derived from what changed.

pub mod revision;
pub mod store;

pub use revision::{Change, ChangeOperation, ChangeType, Revision};
pub use store::{DocumentRepository, InMemoryDocumentRepository};
