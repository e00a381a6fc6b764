//! Score ledger: per-user bake score and last bake time.
//!
//! The in-memory map is authoritative for the running process. Every mutation
//! is written through to a [`LedgerStore`] before returning; a failed write is
//! logged and picked up again by the next mutation, never rolled back.

mod memory;
mod text_file;

pub use memory::MemoryStore;
pub use text_file::TextFileStore;

use itertools::Itertools;
use std::collections::HashMap;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The id would not survive the line-oriented ledger format.
    #[error("invalid user id {0:?}")]
    InvalidUserId(String),

    #[error("score overflow for user {0}")]
    ScoreOverflow(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: String,
    pub score: u64,
    pub last_action_at: OffsetDateTime,
}

impl UserRecord {
    /// A user who has never baked.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            score: 0,
            last_action_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// Persistence collaborator for the ledger.
pub trait LedgerStore: Send + Sync {
    /// Read every stored record, in stored order.
    fn load_all(&self) -> Result<Vec<UserRecord>, LedgerError>;

    /// Replace the stored records with `records`.
    fn save_all(&self, records: &[UserRecord]) -> Result<(), LedgerError>;
}

/// Reject ids that would corrupt a pipe-delimited, line-oriented file.
pub fn validate_user_id(user_id: &str) -> Result<(), LedgerError> {
    let trimmed = user_id.trim();
    let invalid = trimmed.is_empty()
        || trimmed != user_id
        || user_id.starts_with('#')
        || user_id.contains(['|', '\n', '\r']);
    if invalid {
        return Err(LedgerError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

struct Entry {
    record: UserRecord,
    /// First-seen order, used to break score ties.
    seq: u64,
}

pub struct Ledger {
    entries: HashMap<String, Entry>,
    next_seq: u64,
    store: Box<dyn LedgerStore>,
}

impl Ledger {
    /// Load the ledger from `store`.
    ///
    /// A load failure starts an empty ledger; it is never fatal.
    pub fn open(store: impl LedgerStore + 'static) -> Self {
        let mut ledger = Self {
            entries: HashMap::new(),
            next_seq: 0,
            store: Box::new(store),
        };

        match ledger.store.load_all() {
            Ok(records) => {
                for record in records {
                    ledger.upsert(record);
                }
                info!(users = ledger.entries.len(), "Ledger loaded");
            }
            Err(e) => {
                warn!(error = %e, "Could not load ledger, starting with an empty one");
            }
        }

        ledger
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stored record, or a zero record if the user never baked.
    pub fn get(&self, user_id: &str) -> UserRecord {
        self.entries
            .get(user_id)
            .map(|entry| entry.record.clone())
            .unwrap_or_else(|| UserRecord::new(user_id))
    }

    /// Add one point and stamp the bake time, then write the ledger through.
    pub fn record_action(
        &mut self,
        user_id: &str,
        timestamp: OffsetDateTime,
    ) -> Result<UserRecord, LedgerError> {
        validate_user_id(user_id)?;

        let mut record = self.get(user_id);
        record.score = record
            .score
            .checked_add(1)
            .ok_or_else(|| LedgerError::ScoreOverflow(user_id.to_string()))?;
        record.last_action_at = record.last_action_at.max(timestamp);

        self.upsert(record.clone());
        self.persist();

        Ok(record)
    }

    /// Highest scores first; ties keep first-seen order.
    pub fn top_n(&self, n: usize) -> Vec<UserRecord> {
        self.sorted_entries()
            .take(n)
            .map(|entry| entry.record.clone())
            .collect()
    }

    fn sorted_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .values()
            .sorted_by(|a, b| b.record.score.cmp(&a.record.score).then(a.seq.cmp(&b.seq)))
    }

    fn upsert(&mut self, record: UserRecord) {
        match self.entries.get_mut(&record.user_id) {
            Some(entry) => entry.record = record,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries
                    .insert(record.user_id.clone(), Entry { record, seq });
            }
        }
    }

    fn persist(&self) {
        let records: Vec<UserRecord> = self
            .sorted_entries()
            .map(|entry| entry.record.clone())
            .collect();
        match self.store.save_all(&records) {
            Ok(()) => debug!(users = records.len(), "Ledger saved"),
            Err(e) => error!(error = %e, "Failed to save ledger, in-memory scores are kept"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    struct FailingStore {
        attempts: Arc<AtomicUsize>,
    }

    impl LedgerStore for FailingStore {
        fn load_all(&self) -> Result<Vec<UserRecord>, LedgerError> {
            Err(LedgerError::Io(std::io::Error::other("disk on fire")))
        }

        fn save_all(&self, _records: &[UserRecord]) -> Result<(), LedgerError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::Io(std::io::Error::other("disk on fire")))
        }
    }

    #[test]
    fn test_get_unknown_user_is_zero_and_not_stored() {
        let store = MemoryStore::default();
        let ledger = Ledger::open(store.clone());
        let record = ledger.get("alice");
        assert_eq!(record, UserRecord::new("alice"));
        assert!(ledger.is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_record_action_writes_through() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::open(store.clone());

        let record = ledger.record_action("alice", at(100)).unwrap();
        assert_eq!(record.score, 1);
        assert_eq!(record.last_action_at, at(100));

        let record = ledger.record_action("alice", at(200)).unwrap();
        assert_eq!(record.score, 2);
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.records(), vec![record]);
    }

    #[test]
    fn test_last_action_never_moves_back() {
        let mut ledger = Ledger::open(MemoryStore::default());
        ledger.record_action("alice", at(500)).unwrap();
        let record = ledger.record_action("alice", at(100)).unwrap();
        assert_eq!(record.last_action_at, at(500));
    }

    #[test]
    fn test_top_n_orders_by_score_then_first_seen() {
        let mut ledger = Ledger::open(MemoryStore::default());
        ledger.record_action("carol", at(1)).unwrap();
        ledger.record_action("bob", at(1)).unwrap();
        ledger.record_action("alice", at(1)).unwrap();
        ledger.record_action("alice", at(100)).unwrap();

        let top: Vec<_> = ledger.top_n(5).into_iter().map(|r| r.user_id).collect();
        assert_eq!(top, vec!["alice", "carol", "bob"]);
        assert_eq!(ledger.top_n(1).len(), 1);
        assert!(ledger.top_n(0).is_empty());
    }

    #[test]
    fn test_load_failure_starts_empty() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ledger = Ledger::open(FailingStore {
            attempts: attempts.clone(),
        });
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_save_failure_keeps_memory() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut ledger = Ledger::open(FailingStore {
            attempts: attempts.clone(),
        });
        assert_eq!(ledger.record_action("alice", at(1)).unwrap().score, 1);
        assert_eq!(ledger.record_action("alice", at(100)).unwrap().score, 2);
        assert_eq!(ledger.get("alice").score, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_loaded_duplicates_keep_last_value() {
        let store = MemoryStore::with_records(vec![
            UserRecord {
                user_id: "alice".into(),
                score: 3,
                last_action_at: at(10),
            },
            UserRecord {
                user_id: "alice".into(),
                score: 7,
                last_action_at: at(20),
            },
        ]);
        let ledger = Ledger::open(store);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("alice").score, 7);
    }

    #[test]
    fn test_rejects_ids_that_break_the_file_format() {
        let mut ledger = Ledger::open(MemoryStore::default());
        for bad in ["", "  ", "a|b", "line\nbreak", "#comment", " padded"] {
            assert!(
                matches!(
                    ledger.record_action(bad, at(1)),
                    Err(LedgerError::InvalidUserId(_))
                ),
                "accepted {bad:?}"
            );
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_score_overflow_is_an_error() {
        let store = MemoryStore::with_records(vec![UserRecord {
            user_id: "alice".into(),
            score: u64::MAX,
            last_action_at: at(0),
        }]);
        let mut ledger = Ledger::open(store);
        assert!(matches!(
            ledger.record_action("alice", at(100)),
            Err(LedgerError::ScoreOverflow(_))
        ));
        assert_eq!(ledger.get("alice").score, u64::MAX);
    }
}
