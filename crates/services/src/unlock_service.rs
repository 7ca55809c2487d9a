//! The per-item unlock session.
//!
//! One quiz interaction for one item: offer a question, evaluate the answer,
//! drive the attempt budget, and persist after every mutation. All state is
//! recomputed from the persisted ledger at `open_item` time; nothing survives
//! a restart except the ledger itself.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use gate_core::model::{
    Catalog, GroupId, ItemId, ItemKey, ItemStatus, QuestionPool, UnlockLedger,
};
use storage::repository::LedgerRepository;

use crate::error::UnlockError;
use crate::selector;

/// Terminal message shown for a permanently locked item.
pub const LOCKED_MESSAGE: &str =
    "This content is permanently locked: the wrong-answer budget is spent.";

//
// ─── SESSION OUTCOMES ──────────────────────────────────────────────────────────
//

/// A question as presented to the caller: choices in freshly shuffled display
/// order, with the remaining attempt count for the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    pub key: ItemKey,
    pub title: String,
    pub prompt: String,
    pub choices: Vec<String>,
    pub attempts_left: u32,
}

/// Result of opening an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Already resolved in the caller's favor; the gated body comes straight
    /// back, no quiz.
    Unlocked { title: String, body: String },
    /// Terminal; no question is ever offered again.
    PermanentlyLocked { title: String, message: &'static str },
    /// Attempts remain; a question is on offer.
    Question(QuestionPrompt),
}

/// Result of answering the pending question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct {
        title: String,
        body: String,
    },
    /// Wrong, but attempts remain: feedback plus the next question.
    IncorrectContinue {
        attempts_left: u32,
        next: QuestionPrompt,
    },
    /// Wrong, and that was the last attempt.
    IncorrectLocked { message: &'static str },
}

/// One row of a group's item listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOverview {
    pub key: ItemKey,
    pub title: String,
    pub summary: String,
    pub status: ItemStatus,
}

//
// ─── UNLOCK SERVICE ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct PendingQuestion {
    key: ItemKey,
    /// Display position -> original choice index for the offered question.
    order: Vec<usize>,
    correct_choice: usize,
}

/// Orchestrates quiz-gated access to catalog items.
///
/// Holds no durable state of its own: every `open_item` starts from a fresh
/// ledger load, and every mutation is written back before the outcome is
/// reported. The only in-memory carry-over is the pending question between
/// an offer and its answer.
pub struct UnlockService {
    ledger: Arc<dyn LedgerRepository>,
    catalog: Catalog,
    pool: Option<QuestionPool>,
    rng: StdRng,
    pending: Option<PendingQuestion>,
}

impl UnlockService {
    /// Create a service. `pool` is `None` when the question bank failed to
    /// load: already-unlocked items stay viewable, quiz-taking is refused.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerRepository>,
        catalog: Catalog,
        pool: Option<QuestionPool>,
    ) -> Self {
        Self::with_rng(ledger, catalog, pool, StdRng::from_os_rng())
    }

    /// Like `new`, but with a caller-supplied RNG so tests can pin outcomes.
    #[must_use]
    pub fn with_rng(
        ledger: Arc<dyn LedgerRepository>,
        catalog: Catalog,
        pool: Option<QuestionPool>,
        rng: StdRng,
    ) -> Self {
        Self {
            ledger,
            catalog,
            pool,
            rng,
            pending: None,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// True when a question bank is loaded and quizzes can be offered.
    #[must_use]
    pub fn quiz_available(&self) -> bool {
        self.pool.is_some()
    }

    /// Open an item: return its body if unlocked, the terminal message if
    /// locked, or offer a question.
    ///
    /// An exhausted budget without a persisted lock flag (possible after an
    /// abnormal shutdown) is healed here: the flag is set and persisted, and
    /// the item reports locked without a question.
    ///
    /// # Errors
    ///
    /// Returns `UnlockError::UnknownItem` for a key not in the catalog,
    /// `UnlockError::QuizUnavailable` when a quiz would be needed but no bank
    /// is loaded, or a storage error.
    pub async fn open_item(
        &mut self,
        group: &GroupId,
        item: &ItemId,
    ) -> Result<OpenOutcome, UnlockError> {
        let key = ItemKey::new(group, item);
        let content = self
            .catalog
            .item(&key)
            .cloned()
            .ok_or_else(|| UnlockError::UnknownItem(key.clone()))?;

        // any previously offered question is abandoned by a fresh open
        self.pending = None;

        let mut ledger = self.ledger.load().await?;
        ledger.ensure_initialized(&key);

        if ledger.is_unlocked(&key) {
            return Ok(OpenOutcome::Unlocked {
                title: content.title,
                body: content.body,
            });
        }

        if ledger.is_locked(&key) {
            // lock already durable; no need to re-persist it on every open
            return Ok(OpenOutcome::PermanentlyLocked {
                title: content.title,
                message: LOCKED_MESSAGE,
            });
        }

        if ledger.repair_lock(&key) {
            log::warn!("item {key}: budget exhausted without lock flag, locking now");
            self.ledger.save(&ledger).await?;
            return Ok(OpenOutcome::PermanentlyLocked {
                title: content.title,
                message: LOCKED_MESSAGE,
            });
        }

        let prompt = self.offer_question(&mut ledger, &key, content.title).await?;
        Ok(OpenOutcome::Question(prompt))
    }

    /// Evaluate an answer to the pending question by its display position.
    ///
    /// # Errors
    ///
    /// Returns `UnlockError::NoQuestionPending` when nothing is on offer and
    /// `UnlockError::ChoiceOutOfRange` for a bad display index; neither
    /// changes any state.
    pub async fn submit_answer(
        &mut self,
        display_index: usize,
    ) -> Result<AnswerOutcome, UnlockError> {
        let Some(pending) = self.pending.clone() else {
            return Err(UnlockError::NoQuestionPending);
        };
        let Some(&original) = pending.order.get(display_index) else {
            return Err(UnlockError::ChoiceOutOfRange {
                index: display_index,
                choices: pending.order.len(),
            });
        };
        let content = self
            .catalog
            .item(&pending.key)
            .cloned()
            .ok_or_else(|| UnlockError::UnknownItem(pending.key.clone()))?;

        let mut ledger = self.ledger.load().await?;

        if original == pending.correct_choice {
            ledger.record_correct_answer(&pending.key);
            self.ledger.save(&ledger).await?;
            self.pending = None;
            log::info!("item {} unlocked", pending.key);
            return Ok(AnswerOutcome::Correct {
                title: content.title,
                body: content.body,
            });
        }

        let attempts_left = ledger.record_wrong_answer(&pending.key);
        self.ledger.save(&ledger).await?;

        if attempts_left == 0 {
            self.pending = None;
            log::info!("item {} permanently locked", pending.key);
            return Ok(AnswerOutcome::IncorrectLocked {
                message: LOCKED_MESSAGE,
            });
        }

        let next = self
            .offer_question(&mut ledger, &pending.key, content.title)
            .await?;
        Ok(AnswerOutcome::IncorrectContinue {
            attempts_left,
            next,
        })
    }

    /// Status listing for every item of a group, read-only.
    ///
    /// # Errors
    ///
    /// Returns `UnlockError::UnknownGroup` for a group not in the catalog, or
    /// a storage error.
    pub async fn group_overview(&self, group: &GroupId) -> Result<Vec<ItemOverview>, UnlockError> {
        let content_group = self
            .catalog
            .group(group)
            .ok_or_else(|| UnlockError::UnknownGroup(group.clone()))?;
        let ledger = self.ledger.load().await?;

        Ok(content_group
            .items
            .iter()
            .map(|item| {
                let key = ItemKey::new(group, &item.id);
                ItemOverview {
                    status: ledger.status(&key),
                    key,
                    title: item.title.clone(),
                    summary: item.summary.clone(),
                }
            })
            .collect())
    }

    /// Erase all unlock state for all items. Destructive and unconditional.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the slot cannot be cleared.
    pub async fn reset_all(&mut self) -> Result<(), UnlockError> {
        self.pending = None;
        self.ledger.reset().await?;
        log::info!("unlock state reset for all items");
        Ok(())
    }

    /// Select, persist, shuffle, and stash the next question for an item.
    async fn offer_question(
        &mut self,
        ledger: &mut UnlockLedger,
        key: &ItemKey,
        title: String,
    ) -> Result<QuestionPrompt, UnlockError> {
        let Some(pool) = self.pool.as_ref() else {
            return Err(UnlockError::QuizUnavailable);
        };

        let picked = selector::pick_next(pool, ledger, key, &mut self.rng);
        // the serve-mark is durable before the answer is ever evaluated
        self.ledger.save(ledger).await?;

        let shuffled = selector::shuffle_presentation(picked, &mut self.rng);
        let attempts_left = ledger.attempts_left(key);

        let prompt = QuestionPrompt {
            key: key.clone(),
            title,
            prompt: picked.prompt().to_owned(),
            choices: shuffled.display().to_vec(),
            attempts_left,
        };
        self.pending = Some(PendingQuestion {
            key: key.clone(),
            order: shuffled.order().to_vec(),
            correct_choice: picked.correct_choice(),
        });
        Ok(prompt)
    }
}
