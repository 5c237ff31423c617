//! Flat-file backend for the checklist compliance store.
//!
//! Keeps the document as plain JSON on local disk, versioned by content
//! hash, for single-site installs and offline use.

mod file;

pub use file::LocalFileStore;
