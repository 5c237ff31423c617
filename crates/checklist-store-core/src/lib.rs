//! Core types for the checklist compliance store.
//!
//! The whole application state is one JSON document kept in a versioned
//! store. This crate defines:
//! - `Document` and its records: the persisted schema
//! - `DocumentStore`: conflict-detected load/save, with `InMemoryStore`
//! - `SyncSession`: the read-modify-write cycle every mutation goes through
//! - `edits` and `activity`: checklist management, submissions, reports and
//!   the manager activity view

pub mod activity;
mod document;
pub mod edits;
mod encoding;
mod error;
mod ids;
mod memory;
pub mod seed;
mod session;
mod store;
mod version;

pub use document::{Checklist, Document, Report, ReportKind, Submission, TempLogs, UnknownFields};
pub use encoding::{decode_content, encode_content, parse_document, serialize_document};
pub use error::StoreError;
pub use ids::{checklist_id_for, IdGenerator, SequentialIds, UuidGenerator};
pub use memory::InMemoryStore;
pub use session::{SyncSession, SEED_DESCRIPTION};
pub use store::{check_precondition, DocumentStore, Snapshot};
pub use version::VersionToken;
