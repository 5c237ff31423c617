//! Repository-contents backend for the checklist compliance store.
//!
//! The document lives as one JSON file in a hosted repository and is read
//! and written through the contents REST API, using the file's blob SHA as
//! the version token.

mod client;
mod config;

pub use client::GithubContentsStore;
pub use config::{GithubConfig, DEFAULT_API_BASE_URL, DEFAULT_DOCUMENT_PATH};
