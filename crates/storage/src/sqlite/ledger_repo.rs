use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{LEDGER_SLOT, LedgerRepository, StorageError, decode_ledger};
use gate_core::model::UnlockLedger;

use super::SqliteRepository;

#[async_trait]
impl LedgerRepository for SqliteRepository {
    async fn load(&self) -> Result<UnlockLedger, StorageError> {
        let row = sqlx::query("SELECT payload FROM unlock_ledger WHERE slot = ?1")
            .bind(LEDGER_SLOT)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(UnlockLedger::default());
        };

        let payload: String = row
            .try_get("payload")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Ok(decode_ledger(&payload))
    }

    async fn save(&self, ledger: &UnlockLedger) -> Result<(), StorageError> {
        let payload = serde_json::to_string(ledger)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO unlock_ledger (slot, payload)
            VALUES (?1, ?2)
            ON CONFLICT(slot) DO UPDATE SET
                payload = excluded.payload
            ",
        )
        .bind(LEDGER_SLOT)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn reset(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM unlock_ledger WHERE slot = ?1")
            .bind(LEDGER_SLOT)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
