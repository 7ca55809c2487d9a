use gate_core::model::{GroupId, ItemId, ItemKey, QuestionId, UnlockLedger};
use storage::repository::{LEDGER_SLOT, LedgerRepository};
use storage::sqlite::SqliteRepository;

fn key(group: &str, item: &str) -> ItemKey {
    ItemKey::new(&GroupId::new(group), &ItemId::new(item))
}

#[tokio::test]
async fn sqlite_roundtrip_persists_full_ledger() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut ledger = UnlockLedger::new();
    let pending = key("day1", "a");
    ledger.ensure_initialized(&pending);
    ledger.mark_served(&pending, QuestionId::new("q1"));
    ledger.record_wrong_answer(&pending);
    ledger.record_correct_answer(&key("day1", "b"));

    repo.save(&ledger).await.unwrap();

    let loaded = repo.load().await.unwrap();
    assert_eq!(loaded, ledger);
    assert_eq!(loaded.attempts_left(&pending), 2);
    assert_eq!(loaded.served(&pending), [QuestionId::new("q1")]);
    assert!(loaded.is_unlocked(&key("day1", "b")));
}

#[tokio::test]
async fn sqlite_missing_slot_loads_empty() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let ledger = repo.load().await.unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn sqlite_corrupt_payload_recovers_to_empty() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    sqlx::query("INSERT INTO unlock_ledger (slot, payload) VALUES (?1, ?2)")
        .bind(LEDGER_SLOT)
        .bind("{definitely not json")
        .execute(repo.pool())
        .await
        .unwrap();

    let ledger = repo.load().await.unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn sqlite_save_overwrites_prior_blob() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut first = UnlockLedger::new();
    first.record_correct_answer(&key("day1", "a"));
    repo.save(&first).await.unwrap();

    let mut second = UnlockLedger::new();
    second.record_wrong_answer(&key("day2", "b"));
    repo.save(&second).await.unwrap();

    let loaded = repo.load().await.unwrap();
    assert_eq!(loaded, second);
    assert!(!loaded.is_unlocked(&key("day1", "a")));
}

#[tokio::test]
async fn sqlite_reset_clears_slot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_reset?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut ledger = UnlockLedger::new();
    ledger.record_correct_answer(&key("day1", "a"));
    repo.save(&ledger).await.unwrap();

    repo.reset().await.unwrap();
    assert!(repo.load().await.unwrap().is_empty());

    // reset of an already-empty slot is fine
    repo.reset().await.unwrap();
}
