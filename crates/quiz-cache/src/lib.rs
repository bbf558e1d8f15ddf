//! Quiz cache — versioned quiz document cache with atomic local persistence.
//!
//! Fetches a versioned quiz document from a remote source, persists it only
//! when the version is strictly newer, and serves the last persisted copy
//! without touching the network.

pub mod cancel;
pub mod catalog;
pub mod config;
pub mod source;
pub mod storage;
pub mod sync;
pub mod types;
pub mod validate;

pub use cancel::CancelToken;
pub use catalog::{CatalogEntry, LibraryState, QuizCatalog};
pub use config::{ConfigOverrides, SyncConfig};
pub use source::{HttpQuizSource, QuizSource};
pub use storage::{CacheStore, Commit, StoredDocument, VersionRecord};
pub use sync::{CacheReport, CategorySummary, DocumentStatus, QuizCacheSync};
pub use types::*;
pub use validate::{IntegrityIssue, IntegrityReport, QuestionIssue};
