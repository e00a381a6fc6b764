use super::{LedgerError, LedgerStore, UserRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Keeps the "persisted" ledger in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    records: Mutex<Vec<UserRecord>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_records(records: Vec<UserRecord>) -> Self {
        let store = Self::default();
        *store.lock() = records;
        store
    }

    /// Records as of the last save.
    pub fn records(&self) -> Vec<UserRecord> {
        self.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<UserRecord>> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<UserRecord>, LedgerError> {
        Ok(self.records())
    }

    fn save_all(&self, records: &[UserRecord]) -> Result<(), LedgerError> {
        *self.lock() = records.to_vec();
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
