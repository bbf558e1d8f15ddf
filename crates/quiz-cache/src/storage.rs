//! Durable cache record: the raw quiz document plus its accepted version.
//!
//! ## Layout
//!
//! ```text
//! <cache_dir>/quizzes.json            raw document bytes, exactly as fetched
//! <cache_dir>/quiz_version.json       {"version": 7, "updatedAt": "..."}
//! <cache_dir>/quizzes.rejected.json   last unparsable payload (diagnostics only)
//! ```
//!
//! Every file is written to `<name>.tmp`, synced, then renamed over the
//! target, so readers see either the old or the new file and never a torn
//! one. The document is renamed into place before the version file, so a
//! version bump only becomes durable once its document is on disk.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{QuizDocument, QuizError, QuizResult};

pub const DOCUMENT_FILE: &str = "quizzes.json";
pub const VERSION_FILE: &str = "quiz_version.json";
pub const REJECTED_FILE: &str = "quizzes.rejected.json";

/// The persisted version setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// What the persisted document looks like right now.
#[derive(Debug)]
pub enum StoredDocument {
    Missing,
    Valid(QuizDocument),
    Corrupt(String),
}

/// Result of a compare-and-commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    Accepted { previous: u64, record: VersionRecord },
    UpToDate { current: u64 },
}

/// Filesystem-backed cache store. Owns the persisted record exclusively.
pub struct CacheStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl CacheStore {
    /// Open the store, creating the cache directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> QuizResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            QuizError::Storage(format!("failed to create cache dir {}: {e}", dir.display()))
        })?;

        tracing::debug!("CacheStore opened at {}", dir.display());

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(DOCUMENT_FILE)
    }

    pub fn version_path(&self) -> PathBuf {
        self.dir.join(VERSION_FILE)
    }

    pub fn rejected_path(&self) -> PathBuf {
        self.dir.join(REJECTED_FILE)
    }

    /// Read the raw persisted document. A missing or empty file is `None`.
    pub fn read_raw(&self) -> QuizResult<Option<String>> {
        read_optional(&self.document_path())
    }

    /// Read and parse the persisted document.
    pub fn read_document(&self) -> QuizResult<StoredDocument> {
        let Some(raw) = self.read_raw()? else {
            return Ok(StoredDocument::Missing);
        };

        Ok(match QuizDocument::from_json(&raw) {
            Ok(doc) => StoredDocument::Valid(doc),
            Err(e) => StoredDocument::Corrupt(e.to_string()),
        })
    }

    /// Read the version setting. An unreadable setting counts as absent.
    pub fn read_version(&self) -> QuizResult<Option<VersionRecord>> {
        let path = self.version_path();
        let Some(raw) = read_optional(&path)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable version file {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    /// The persisted version, `0` when none has been accepted.
    pub fn version(&self) -> QuizResult<u64> {
        Ok(self.read_version()?.map(|r| r.version).unwrap_or(0))
    }

    /// Whether a fetched `version` may replace the persisted record.
    ///
    /// The stored counter is the floor: only a strictly greater version is
    /// accepted. When the persisted document is missing or corrupt, a fetch
    /// at exactly the stored version is also accepted to repair it; the
    /// counter itself never goes down.
    pub fn accepts(&self, version: u64) -> QuizResult<bool> {
        let current = self.version()?;
        if version > current {
            return Ok(true);
        }
        if version < current || current == 0 {
            return Ok(false);
        }

        Ok(match self.read_document()? {
            StoredDocument::Valid(_) => false,
            StoredDocument::Missing => {
                tracing::warn!("Cached quiz document is missing, repairing at version {current}");
                true
            }
            StoredDocument::Corrupt(reason) => {
                tracing::warn!("Cached quiz document is corrupt, repairing at version {current}: {reason}");
                true
            }
        })
    }

    /// Persist `raw` as version `version` if `accepts` allows it.
    ///
    /// Compare and write happen under one lock, so concurrent commits are
    /// serialized and a lower version can never land after a higher one.
    pub fn commit_if_newer(&self, raw: &str, version: u64) -> QuizResult<Commit> {
        let _guard = self.lock()?;

        let current = self.version()?;
        if !self.accepts(version)? {
            return Ok(Commit::UpToDate { current });
        }

        let record = VersionRecord {
            version,
            updated_at: Utc::now(),
        };

        write_atomic(&self.document_path(), raw.as_bytes())?;
        let encoded = serde_json::to_vec(&record)?;
        write_atomic(&self.version_path(), &encoded)?;

        Ok(Commit::Accepted {
            previous: current,
            record,
        })
    }

    /// Keep an unparsable payload for diagnostics. Never touches the cache record.
    pub fn write_rejected(&self, raw: &str) -> QuizResult<()> {
        let _guard = self.lock()?;
        write_atomic(&self.rejected_path(), raw.as_bytes())
    }

    fn lock(&self) -> QuizResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| QuizError::Storage("cache write lock poisoned".to_string()))
    }

    pub fn has_rejected(&self) -> bool {
        self.rejected_path().is_file()
    }
}

fn read_optional(path: &Path) -> QuizResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(QuizError::Storage(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write-to-temporary then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> QuizResult<()> {
    let tmp = tmp_path(path);

    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    let result = written.and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(QuizError::Storage(format!(
            "failed to write {}: {e}",
            path.display()
        )));
    }

    // Persist the rename itself; not every platform can open a directory.
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
