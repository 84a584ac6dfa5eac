//! Session gating and remote persistence of the lead collection.

pub mod document;
pub mod engine;
pub mod error;
pub mod session;

pub use document::{DocumentStore, FileDocumentStore, HttpDocumentStore, UserDocument};
pub use engine::SyncEngine;
pub use error::SyncError;
pub use session::{LocalSessionGate, SessionGate, UserIdentity};
