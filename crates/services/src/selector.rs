//! Question selection and per-presentation choice shuffling.
//!
//! Both take the RNG as a parameter so callers (and tests) control the
//! randomness source.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use gate_core::model::{ItemKey, QuestionId, QuestionPool, QuestionRecord, UnlockLedger};

/// Pick the next question for an item.
///
/// Questions already served to this item in its current cycle are excluded;
/// when the item has seen the whole pool, selection falls back to the full
/// pool and repeats become possible. The pick is recorded on the ledger
/// immediately (the caller persists before evaluating any answer), so a
/// question is never re-offered within a cycle while unserved ones remain.
pub fn pick_next<'p, R: Rng + ?Sized>(
    pool: &'p QuestionPool,
    ledger: &mut UnlockLedger,
    key: &ItemKey,
    rng: &mut R,
) -> &'p QuestionRecord {
    let questions = pool.questions();
    let served: HashSet<&QuestionId> = ledger.served(key).iter().collect();
    let candidates: Vec<&QuestionRecord> = questions
        .iter()
        .filter(|question| !served.contains(question.id()))
        .collect();

    let picked = match candidates.choose(rng) {
        Some(question) => *question,
        // served-set exhausted; the pool is non-empty by construction
        None => questions.choose(rng).unwrap_or(&questions[0]),
    };

    ledger.mark_served(key, picked.id().clone());
    picked
}

/// Choices re-shuffled for one presentation.
///
/// The record's own choice order is never shown as given, so the correct
/// answer's display position cannot be learned from prior attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledChoices {
    display: Vec<String>,
    order: Vec<usize>,
}

impl ShuffledChoices {
    /// Choice texts in display order.
    #[must_use]
    pub fn display(&self) -> &[String] {
        &self.display
    }

    /// For each display position, the original choice index.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Map a display position back to the record's choice index.
    #[must_use]
    pub fn original_index(&self, display_index: usize) -> Option<usize> {
        self.order.get(display_index).copied()
    }
}

/// Produce a freshly randomized display order for a question's choices.
pub fn shuffle_presentation<R: Rng + ?Sized>(
    question: &QuestionRecord,
    rng: &mut R,
) -> ShuffledChoices {
    let mut order: Vec<usize> = (0..question.choices().len()).collect();
    order.shuffle(rng);
    let display = order
        .iter()
        .map(|&idx| question.choices()[idx].clone())
        .collect();
    ShuffledChoices { display, order }
}
