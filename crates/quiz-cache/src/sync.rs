//! Quiz cache synchronization service.
//!
//! `QuizCacheSync` keeps a durable copy of the latest quiz document in step
//! with a remote source. Reads never wait on the network; a sync fetches,
//! parses, and commits only a strictly newer version. Transport and parse
//! failures leave the cache untouched and come back as a typed outcome.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cancel::CancelToken;
use crate::catalog::{LibraryState, QuizCatalog};
use crate::config::SyncConfig;
use crate::source::{HttpQuizSource, QuizSource};
use crate::storage::{CacheStore, Commit, StoredDocument};
use crate::types::{QuizDocument, QuizError, QuizResult, SyncOutcome, SyncReason};
use crate::validate;

/// Number of integrity issues logged individually per sync.
const MAX_LOGGED_ISSUES: usize = 10;

/// Owns the cache record and the source it is refreshed from.
pub struct QuizCacheSync {
    store: Arc<CacheStore>,
    source: Arc<dyn QuizSource>,
}

/// Per-category counts in a `CacheReport`.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub quizzes: usize,
    pub playable: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Missing,
    Valid,
    Corrupt,
}

/// Diagnostic snapshot of the persisted cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub cache_dir: PathBuf,
    pub version: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub document: DocumentStatus,
    pub parse_error: Option<String>,
    pub document_version: Option<u64>,
    pub categories: Vec<CategorySummary>,
    pub excluded_questions: usize,
    pub rejected_payload: bool,
}

impl QuizCacheSync {
    pub fn new(store: CacheStore, source: Arc<dyn QuizSource>) -> Self {
        Self {
            store: Arc::new(store),
            source,
        }
    }

    /// Build the production service: filesystem store plus HTTP source.
    pub fn from_config(config: &SyncConfig) -> QuizResult<Self> {
        let store = CacheStore::open(&config.cache_dir)?;
        let source = HttpQuizSource::new(&config.source_url, &config.user_agent)?;
        tracing::info!(
            "Quiz cache at {} tracking {}",
            config.cache_dir.display(),
            config.source_url
        );
        Ok(Self::new(store, Arc::new(source)))
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// The last persisted document, or `None` when there is none or it is corrupt.
    ///
    /// A corrupt file is logged and left in place; the next accepted sync
    /// replaces it.
    pub async fn load_cached(&self) -> QuizResult<Option<QuizDocument>> {
        let stored = self.blocking(|store| store.read_document()).await?;
        Ok(match stored {
            StoredDocument::Missing => None,
            StoredDocument::Valid(doc) => Some(doc),
            StoredDocument::Corrupt(reason) => {
                tracing::warn!(
                    "Cached quiz document {} is corrupt: {reason}",
                    self.store.document_path().display()
                );
                None
            }
        })
    }

    /// The persisted version, `0` if none.
    pub async fn get_version(&self) -> QuizResult<u64> {
        self.blocking(|store| store.version()).await
    }

    /// Fetch and apply an update if the remote carries a newer version.
    pub async fn sync_from_remote(&self, timeout: Duration) -> SyncOutcome {
        self.sync_with_cancel(timeout, &CancelToken::new()).await
    }

    /// Like `sync_from_remote`, abandoning the fetch when `cancel` fires.
    ///
    /// Once the commit has started it runs to completion on the blocking
    /// pool, so cancelling or dropping this future never leaves a partial
    /// record.
    pub async fn sync_with_cancel(&self, timeout: Duration, cancel: &CancelToken) -> SyncOutcome {
        let location = self.source.describe();
        tracing::info!("Checking {location} for quiz updates");

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(QuizError::Cancelled),
            result = tokio::time::timeout(timeout, self.source.fetch(timeout)) => match result {
                Ok(body) => body,
                Err(_) => Err(QuizError::Network(format!(
                    "no response from {location} within {timeout:?}"
                ))),
            },
        };

        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => return self.not_updated(e).await,
        };

        let document = match QuizDocument::from_json(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                self.retain_rejected(raw).await;
                return self.not_updated(e).await;
            }
        };

        log_integrity(&document);

        if cancel.is_cancelled() {
            return self.not_updated(QuizError::Cancelled).await;
        }

        let version = document.version;
        match self
            .blocking(move |store| store.commit_if_newer(&raw, version))
            .await
        {
            Ok(Commit::Accepted { previous, record }) => {
                tracing::info!(
                    "Accepted quiz document version {} (was {previous})",
                    record.version
                );
                SyncOutcome::updated(record.version)
            }
            Ok(Commit::UpToDate { current }) => {
                tracing::info!("Quiz data up to date (remote {version}, local {current})");
                let persisted = self.get_version().await.unwrap_or(current);
                SyncOutcome::skipped(SyncReason::UpToDate, persisted, None)
            }
            Err(e) => self.not_updated(e).await,
        }
    }

    /// Load what is cached; when nothing is, sync once and try again.
    pub async fn load_or_sync(&self, timeout: Duration, cancel: &CancelToken) -> LibraryState {
        match self.load_cached().await {
            Ok(Some(doc)) => return LibraryState::Ready(QuizCatalog::from_document(&doc)),
            Ok(None) => tracing::info!("No cached quiz data, fetching"),
            Err(e) => tracing::warn!("Failed to read quiz cache: {e}"),
        }

        let outcome = self.sync_with_cancel(timeout, cancel).await;
        match self.load_cached().await {
            Ok(Some(doc)) => LibraryState::Ready(QuizCatalog::from_document(&doc)),
            Ok(None) => LibraryState::NoData {
                reason: outcome.reason,
            },
            Err(e) => {
                tracing::warn!("Failed to read quiz cache after sync: {e}");
                LibraryState::NoData {
                    reason: Some(e.reason()),
                }
            }
        }
    }

    /// Summarise the persisted state for diagnostics.
    pub async fn inspect(&self) -> QuizResult<CacheReport> {
        self.blocking(|store| {
            let record = store.read_version()?;
            let mut report = CacheReport {
                cache_dir: store.dir().to_path_buf(),
                version: record.as_ref().map(|r| r.version).unwrap_or(0),
                updated_at: record.map(|r| r.updated_at),
                document: DocumentStatus::Missing,
                parse_error: None,
                document_version: None,
                categories: Vec::new(),
                excluded_questions: 0,
                rejected_payload: store.has_rejected(),
            };

            match store.read_document()? {
                StoredDocument::Missing => {}
                StoredDocument::Corrupt(reason) => {
                    report.document = DocumentStatus::Corrupt;
                    report.parse_error = Some(reason);
                }
                StoredDocument::Valid(doc) => {
                    let catalog = QuizCatalog::from_document(&doc);
                    report.document = DocumentStatus::Valid;
                    report.document_version = Some(doc.version);
                    report.excluded_questions = catalog.integrity().excluded_questions;
                    report.categories = doc
                        .categories
                        .iter()
                        .map(|c| CategorySummary {
                            name: c.name.clone(),
                            quizzes: c.quizzes.len(),
                            playable: catalog
                                .entries()
                                .iter()
                                .filter(|e| e.category == c.name && e.quiz.is_playable())
                                .count(),
                        })
                        .collect();
                }
            }

            Ok(report)
        })
        .await
    }

    async fn retain_rejected(&self, raw: String) {
        tracing::warn!("Keeping unparsable payload ({} bytes) for diagnostics", raw.len());
        if let Err(e) = self.blocking(move |store| store.write_rejected(&raw)).await {
            tracing::warn!("Could not keep rejected payload: {e}");
        }
    }

    async fn not_updated(&self, error: QuizError) -> SyncOutcome {
        let reason = error.reason();
        if reason == SyncReason::Cancelled {
            tracing::info!("Quiz sync cancelled");
        } else {
            tracing::warn!("Quiz sync failed: {error}");
        }

        let version = match self.get_version().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Could not read persisted version: {e}");
                0
            }
        };
        SyncOutcome::skipped(reason, version, Some(error.to_string()))
    }

    /// Run store I/O on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> QuizResult<T>
    where
        F: FnOnce(&CacheStore) -> QuizResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| QuizError::Storage(format!("storage task failed: {e}")))?
    }
}

fn log_integrity(document: &QuizDocument) {
    let issues = validate::audit(document);
    if issues.is_empty() {
        return;
    }

    tracing::warn!(
        "Quiz document version {} has {} integrity issues; affected questions will be skipped",
        document.version,
        issues.len()
    );
    for found in issues.iter().take(MAX_LOGGED_ISSUES) {
        tracing::debug!(
            category = %found.category,
            quiz = %found.quiz_id,
            question = found.question_index,
            "Skipping question: {}",
            found.issue
        );
    }
}
