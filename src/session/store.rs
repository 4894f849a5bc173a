use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::SessionError;
use super::record::SessionRecord;
use super::summarizer::Summarizer;
use crate::constants::{IDENTIFIER_HEX_LEN, IDENTIFIER_SUFFIX, INDEX_FILE_NAME, RECORDS_DIR_NAME};
use crate::models::Dialog;

/// Where the store keeps its files and how many sessions it retains
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the index file and the `records/` folder
    pub data_dir: PathBuf,
    /// Capacity bound, enforced on open and whenever a draft is pushed
    pub max_records: NonZeroUsize,
}

/// Candidate identifier for a dialog: a truncated SHA-256 of its serialized form
pub fn candidate_identifier(dialog: &Dialog) -> Result<String, SessionError> {
    let encoded = serde_json::to_vec(dialog)?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    let mut identifier = format!("{:x}", hasher.finalize());
    identifier.truncate(IDENTIFIER_HEX_LEN);
    Ok(identifier)
}

/// Ordered, bounded list of sessions, most recently active first.
///
/// The index file mirrors `records`; every named record has a dialog file
/// under `records/`. At most one record is a draft and it is always first.
pub struct SessionStore {
    index_path: PathBuf,
    records_dir: PathBuf,
    max_records: NonZeroUsize,
    records: Vec<SessionRecord>,
    /// Identifiers removed or evicted during this process, never handed out again
    retired: HashSet<String>,
    summarizer: Box<dyn Summarizer>,
    pub(crate) identify: fn(&Dialog) -> Result<String, SessionError>,
}

impl SessionStore {
    /// Open the store under `config.data_dir`, creating an empty index if none exists
    pub fn open(config: StoreConfig, summarizer: Box<dyn Summarizer>) -> Result<Self, SessionError> {
        let records_dir = config.data_dir.join(RECORDS_DIR_NAME);
        let index_path = config.data_dir.join(INDEX_FILE_NAME);

        fs::create_dir_all(&records_dir)
            .map_err(|e| SessionError::io("creating", &records_dir, e))?;

        let mut store = Self {
            index_path,
            records_dir,
            max_records: config.max_records,
            records: Vec::new(),
            retired: HashSet::new(),
            summarizer,
            identify: candidate_identifier,
        };

        if store.index_path.exists() {
            store.records = load_index(&store.index_path)?;
            // The index may predate a lower `record.max`
            store.evict_overflow()?;
        } else {
            store.save_index()?;
        }

        debug!(
            "Opened session store at {} ({} records)",
            config.data_dir.display(),
            store.records.len()
        );
        Ok(store)
    }

    /// Insert a draft at the front (unless one is already there) and evict the oldest
    /// records beyond capacity.
    pub fn push_blank(&mut self) -> Result<(), SessionError> {
        if self.records.first().is_some_and(SessionRecord::is_draft) {
            return Ok(());
        }

        self.records.insert(0, SessionRecord::draft());
        self.save_index()?;
        self.evict_overflow()
    }

    /// Remove records from the tail until the store is within capacity
    fn evict_overflow(&mut self) -> Result<(), SessionError> {
        while self.records.len() > self.max_records.get() {
            let oldest = self.records.len() - 1;
            debug!("Evicting session {}", oldest);
            self.remove(oldest)?;
        }
        Ok(())
    }

    /// Dialog of the front record; `None` when empty or when the front is a draft
    pub fn top(&self) -> Result<Option<Dialog>, SessionError> {
        self.dialog_at(0)
    }

    /// Dialog of the record at `index`; `None` when out of bounds or a draft
    pub fn dialog_at(&self, index: usize) -> Result<Option<Dialog>, SessionError> {
        match self.records.get(index).and_then(|r| r.identifier.as_deref()) {
            Some(identifier) => self.read_record(identifier).map(Some),
            None => Ok(None),
        }
    }

    /// Flush `dialog` into the front record.
    ///
    /// The first flush of a draft names it (content hash plus summary); every flush
    /// overwrites the dialog file. A draft with nothing but system prompts stays a draft.
    pub async fn update_top(&mut self, dialog: &Dialog) -> Result<(), SessionError> {
        if self.records.is_empty() {
            self.push_blank()?;
        }

        if let Some(identifier) = self.records[0].identifier.clone() {
            return self.write_record(&identifier, dialog);
        }

        if !dialog.has_conversation() {
            debug!("Nothing said yet, leaving the draft unnamed");
            return Ok(());
        }

        let identifier = self.unique_identifier(dialog)?;
        let summary = self
            .summarizer
            .summarize(dialog)
            .await
            .map_err(SessionError::Summarize)?;

        self.write_record(&identifier, dialog)?;

        self.records[0] = SessionRecord {
            identifier: Some(identifier),
            summary: Some(summary).filter(|s| !s.is_empty()),
        };
        if let Err(e) = self.save_index() {
            // Keep memory in line with the index on disk; the written file is left behind
            self.records[0] = SessionRecord::draft();
            return Err(e);
        }

        Ok(())
    }

    /// Delete the record at `index`. Out-of-bounds indices are ignored.
    ///
    /// A dialog file that cannot be deleted is logged and left behind.
    pub fn remove(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.records.len() {
            return Ok(());
        }

        let record = self.records.remove(index);
        if let Some(identifier) = record.identifier {
            let path = self.record_path(&identifier);
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove session record {}: {}", path.display(), e);
            }
            self.retired.insert(identifier);
        }

        self.save_index()
    }

    pub fn remove_all(&mut self) -> Result<(), SessionError> {
        for _ in 0..self.records.len() {
            self.remove(0)?;
        }
        Ok(())
    }

    /// Move the record at `index` to the front, keeping the order of the rest.
    /// Any other draft is dropped.
    pub fn pick(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.records.len() {
            return Ok(());
        }

        let picked = self.records.remove(index);
        let mut reordered = Vec::with_capacity(self.records.len() + 1);
        reordered.push(picked);
        reordered.extend(self.records.drain(..).filter(|r| !r.is_draft()));

        self.records = reordered;
        self.save_index()
    }

    /// Summaries front to back; a draft yields an empty string
    pub fn list_iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(SessionRecord::summary_text)
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_records(&self) -> usize {
        self.max_records.get()
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Path of the dialog file for `identifier`
    pub fn record_path(&self, identifier: &str) -> PathBuf {
        self.records_dir.join(identifier)
    }

    fn unique_identifier(&self, dialog: &Dialog) -> Result<String, SessionError> {
        let mut identifier = (self.identify)(dialog)?;
        while self.record_path(&identifier).exists() || self.is_known(&identifier) {
            identifier.push(IDENTIFIER_SUFFIX);
        }
        Ok(identifier)
    }

    fn is_known(&self, identifier: &str) -> bool {
        self.retired.contains(identifier)
            || self
                .records
                .iter()
                .any(|r| r.identifier.as_deref() == Some(identifier))
    }

    fn read_record(&self, identifier: &str) -> Result<Dialog, SessionError> {
        let path = self.record_path(identifier);
        let json = fs::read_to_string(&path).map_err(|e| SessionError::io("reading", &path, e))?;
        serde_json::from_str(&json).map_err(|source| SessionError::Record { path, source })
    }

    fn write_record(&self, identifier: &str, dialog: &Dialog) -> Result<(), SessionError> {
        fs::create_dir_all(&self.records_dir)
            .map_err(|e| SessionError::io("creating", &self.records_dir, e))?;

        let path = self.record_path(identifier);
        let json = serde_json::to_string_pretty(dialog)?;
        fs::write(&path, json).map_err(|e| SessionError::io("writing", &path, e))
    }

    fn save_index(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.index_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::io("creating", parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.index_path, json)
            .map_err(|e| SessionError::io("writing", &self.index_path, e))
    }
}

fn load_index(path: &Path) -> Result<Vec<SessionRecord>, SessionError> {
    let json = fs::read_to_string(path).map_err(|e| SessionError::io("reading", path, e))?;
    let records: Vec<SessionRecord> =
        serde_json::from_str(&json).map_err(|source| SessionError::Index {
            path: path.to_path_buf(),
            source,
        })?;

    if records.iter().skip(1).any(SessionRecord::is_draft) {
        return Err(SessionError::CorruptIndex {
            path: path.to_path_buf(),
            reason: "unnamed record below the front".to_string(),
        });
    }

    Ok(records)
}
