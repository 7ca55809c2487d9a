use async_trait::async_trait;
use gate_core::model::UnlockLedger;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Name of the single durable slot holding the whole ledger blob.
///
/// Versioned so a future incompatible shape can move to a new slot instead of
/// fighting old blobs.
pub const LEDGER_SLOT: &str = "quiz-unlock:v2";

/// Errors surfaced by storage adapters.
///
/// A missing or corrupt blob is deliberately not represented here: `load`
/// recovers it to an empty ledger (see `decode_ledger`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the unlock ledger.
///
/// The ledger is one durable record: `load` reads it whole, `save` overwrites
/// it whole. There are no partial updates and no cross-writer coordination;
/// callers own the load/mutate/save cycle and must not interleave two of them
/// for the same item.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Load the full ledger.
    ///
    /// Always returns a structurally valid ledger: a missing or unreadable
    /// blob yields `UnlockLedger::default()`, never an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for adapter failures (e.g. a dead
    /// connection), not for bad data.
    async fn load(&self) -> Result<UnlockLedger, StorageError>;

    /// Durably persist the full ledger, overwriting prior content.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the blob cannot be written.
    async fn save(&self, ledger: &UnlockLedger) -> Result<(), StorageError>;

    /// Erase all persisted state for all items.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn reset(&self) -> Result<(), StorageError>;
}

/// Decode a raw blob, substituting a fresh ledger when it does not parse.
///
/// Corruption is recovered locally and logged, never surfaced to the caller.
#[must_use]
pub fn decode_ledger(raw: &str) -> UnlockLedger {
    match serde_json::from_str(raw) {
        Ok(ledger) => ledger,
        Err(err) => {
            log::warn!("unlock ledger blob is corrupt, starting fresh: {err}");
            UnlockLedger::default()
        }
    }
}

/// In-memory repository for tests and prototyping.
///
/// Stores the serialized blob rather than the ledger itself so the JSON
/// round-trip and the corrupt-blob recovery path are exercised the same way
/// the durable adapter exercises them.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    blob: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-seeded raw blob, valid or not.
    #[must_use]
    pub fn with_blob(raw: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }
}

#[async_trait]
impl LedgerRepository for InMemoryRepository {
    async fn load(&self) -> Result<UnlockLedger, StorageError> {
        let guard = self
            .blob
            .lock()
            .map_err(|_| StorageError::Connection("in-memory lock poisoned".into()))?;
        Ok(guard.as_deref().map(decode_ledger).unwrap_or_default())
    }

    async fn save(&self, ledger: &UnlockLedger) -> Result<(), StorageError> {
        let raw = serde_json::to_string(ledger)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| StorageError::Connection("in-memory lock poisoned".into()))?;
        *guard = Some(raw);
        Ok(())
    }

    async fn reset(&self) -> Result<(), StorageError> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| StorageError::Connection("in-memory lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

/// Bundle of repository handles the services layer takes by injection.
#[derive(Clone)]
pub struct Storage {
    pub ledger: Arc<dyn LedgerRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            ledger: Arc::new(InMemoryRepository::new()),
        }
    }
}
