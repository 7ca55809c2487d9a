use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{ItemKey, QuestionId};

/// Wrong answers allowed per item before it locks for good.
pub const ATTEMPT_BUDGET: u32 = 3;

//
// ─── ITEM STATUS ───────────────────────────────────────────────────────────────
//

/// Resolved view of one item's unlock state.
///
/// `Pending` always carries a positive attempt count: an item at zero
/// attempts reads as `Locked` even before the lock flag has been repaired,
/// so no caller ever observes the intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Unlocked,
    Locked,
    Pending { attempts_left: u32 },
}

//
// ─── UNLOCK LEDGER ─────────────────────────────────────────────────────────────
//

/// The durable aggregate for every item's unlock state.
///
/// This is the whole persisted record: repositories load it in full and write
/// it back in full, never field by field. Every field defaults so blobs
/// written by older versions (or hand-edited ones missing a map) still load.
///
/// `BTreeMap` keeps the serialized blob deterministic for a given state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockLedger {
    #[serde(default)]
    unlocked: BTreeMap<ItemKey, bool>,
    #[serde(default)]
    locked: BTreeMap<ItemKey, bool>,
    #[serde(default)]
    attempts_left: BTreeMap<ItemKey, u32>,
    #[serde(default)]
    served_questions: BTreeMap<ItemKey, Vec<QuestionId>>,
}

impl UnlockLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily create the item's slice of the ledger: a full attempt budget
    /// and an empty served list. Idempotent; existing entries are untouched.
    pub fn ensure_initialized(&mut self, key: &ItemKey) {
        self.attempts_left
            .entry(key.clone())
            .or_insert(ATTEMPT_BUDGET);
        self.served_questions.entry(key.clone()).or_default();
    }

    /// Record a wrong answer: decrement the budget (floored at zero) and flip
    /// the permanent lock when it hits zero. Returns the new remaining count.
    ///
    /// The decrement and the lock flip are one mutation; callers persist and
    /// report feedback only after this returns.
    pub fn record_wrong_answer(&mut self, key: &ItemKey) -> u32 {
        let left = self
            .attempts_left
            .entry(key.clone())
            .or_insert(ATTEMPT_BUDGET);
        *left = left.saturating_sub(1);
        let left = *left;
        if left == 0 {
            self.locked.insert(key.clone(), true);
        }
        left
    }

    /// Record a correct answer: the item unlocks and is resolved. Attempts
    /// and served questions are left as-is; they no longer matter.
    pub fn record_correct_answer(&mut self, key: &ItemKey) {
        self.unlocked.insert(key.clone(), true);
    }

    /// Selection side effect: remember that `question` was offered to this
    /// item so it is not offered again within the current cycle.
    pub fn mark_served(&mut self, key: &ItemKey, question: QuestionId) {
        self.served_questions.entry(key.clone()).or_default().push(question);
    }

    /// Self-heal after an abnormal shutdown: an item whose budget reached
    /// zero without the lock flag being persisted gets locked now. Returns
    /// true when the flag was flipped (the caller must persist).
    pub fn repair_lock(&mut self, key: &ItemKey) -> bool {
        if self.is_unlocked(key) || self.is_locked(key) {
            return false;
        }
        if self.attempts_left(key) > 0 {
            return false;
        }
        self.locked.insert(key.clone(), true);
        true
    }

    #[must_use]
    pub fn is_unlocked(&self, key: &ItemKey) -> bool {
        self.unlocked.get(key).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn is_locked(&self, key: &ItemKey) -> bool {
        self.locked.get(key).copied().unwrap_or(false)
    }

    /// Remaining wrong-answer budget; a never-seen item reports the full
    /// budget.
    #[must_use]
    pub fn attempts_left(&self, key: &ItemKey) -> u32 {
        self.attempts_left.get(key).copied().unwrap_or(ATTEMPT_BUDGET)
    }

    /// Questions already offered to this item in its current cycle.
    #[must_use]
    pub fn served(&self, key: &ItemKey) -> &[QuestionId] {
        self.served_questions.get(key).map_or(&[], Vec::as_slice)
    }

    /// Resolved status. Unlocked wins over locked; zero attempts read as
    /// locked whether or not the flag made it to disk.
    #[must_use]
    pub fn status(&self, key: &ItemKey) -> ItemStatus {
        if self.is_unlocked(key) {
            ItemStatus::Unlocked
        } else if self.is_locked(key) || self.attempts_left(key) == 0 {
            ItemStatus::Locked
        } else {
            ItemStatus::Pending {
                attempts_left: self.attempts_left(key),
            }
        }
    }

    /// True when no item has any recorded state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
            && self.locked.is_empty()
            && self.attempts_left.is_empty()
            && self.served_questions.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
