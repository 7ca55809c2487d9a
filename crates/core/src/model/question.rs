use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question data as read from the bank file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
}

impl QuestionDraft {
    /// Validate the draft into a `QuestionRecord`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are fewer than
    /// two choices, or `correct_choice` does not index into `choices`.
    pub fn validate(self) -> Result<QuestionRecord, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        if self.choices.len() < 2 {
            return Err(QuestionError::TooFewChoices {
                id: self.id,
                got: self.choices.len(),
            });
        }
        if self.correct_choice >= self.choices.len() {
            return Err(QuestionError::CorrectChoiceOutOfBounds {
                id: self.id,
                index: self.correct_choice,
                choices: self.choices.len(),
            });
        }
        Ok(QuestionRecord {
            id: self.id,
            prompt: self.prompt,
            choices: self.choices,
            correct_choice: self.correct_choice,
        })
    }
}

/// A single multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    id: QuestionId,
    prompt: String,
    choices: Vec<String>,
    correct_choice: usize,
}

impl QuestionRecord {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Choices in the record's own order. Presentation re-shuffles this order
    /// every time the question is shown.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Index into `choices` of the correct answer.
    #[must_use]
    pub fn correct_choice(&self) -> usize {
        self.correct_choice
    }
}

//
// ─── QUESTION POOL ─────────────────────────────────────────────────────────────
//

/// The loaded-once question bank.
///
/// Construction is the single validation point: a pool is never empty and
/// never holds duplicate ids, so selection downstream cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPool {
    questions: Vec<QuestionRecord>,
}

impl QuestionPool {
    /// Build a pool from validated records.
    ///
    /// # Errors
    ///
    /// Returns `QuestionPoolError::Empty` for an empty bank (a fatal
    /// configuration error) or `QuestionPoolError::DuplicateId` when two
    /// records share an id.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, QuestionPoolError> {
        if questions.is_empty() {
            return Err(QuestionPoolError::Empty);
        }
        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id().clone()) {
                return Err(QuestionPoolError::DuplicateId {
                    id: question.id().clone(),
                });
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; an empty pool cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.questions.iter().any(|q| q.id() == id)
    }
}

//
// ─── VALIDATION ERRORS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} needs at least two choices, got {got}")]
    TooFewChoices { id: QuestionId, got: usize },

    #[error("question {id}: correct choice index {index} out of bounds for {choices} choices")]
    CorrectChoiceOutOfBounds {
        id: QuestionId,
        index: usize,
        choices: usize,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionPoolError {
    #[error("question pool is empty")]
    Empty,

    #[error("duplicate question id {id}")]
    DuplicateId { id: QuestionId },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
