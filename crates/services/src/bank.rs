//! Question bank loading.
//!
//! The bank is a read-once JSON file:
//!
//! ```json
//! { "questions": [ { "qid": "q1", "question": "...",
//!                    "choices": ["...", "..."], "answerIndex": 0 } ] }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use gate_core::model::{ATTEMPT_BUDGET, QuestionDraft, QuestionId, QuestionPool};

use crate::error::BankError;

#[derive(Debug, Deserialize)]
struct RawBank {
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    qid: String,
    #[serde(rename = "question")]
    prompt: String,
    choices: Vec<String>,
    #[serde(rename = "answerIndex")]
    answer_index: usize,
}

/// Parse and validate a question bank from raw JSON.
///
/// Warns when the bank holds fewer questions than the attempt budget: such a
/// bank cannot guarantee distinct questions across all attempts of one item.
/// That is an accepted limitation, not an error.
///
/// # Errors
///
/// Returns `BankError` for malformed JSON, invalid questions, duplicate ids,
/// or an empty bank.
pub fn parse_question_pool(raw: &str) -> Result<QuestionPool, BankError> {
    let bank: RawBank = serde_json::from_str(raw)?;

    let mut questions = Vec::with_capacity(bank.questions.len());
    for raw in bank.questions {
        let draft = QuestionDraft {
            id: QuestionId::new(raw.qid),
            prompt: raw.prompt,
            choices: raw.choices,
            correct_choice: raw.answer_index,
        };
        questions.push(draft.validate()?);
    }

    let pool = QuestionPool::new(questions)?;
    if pool.len() < ATTEMPT_BUDGET as usize {
        log::warn!(
            "question bank has {} questions, fewer than the attempt budget of {}; \
             repeats within a single item are possible",
            pool.len(),
            ATTEMPT_BUDGET
        );
    }
    Ok(pool)
}

/// Load the question bank from a file.
///
/// # Errors
///
/// Returns `BankError::Io` when the file cannot be read, otherwise whatever
/// `parse_question_pool` reports.
pub fn load_question_pool(path: &Path) -> Result<QuestionPool, BankError> {
    let raw = fs::read_to_string(path).map_err(|source| BankError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_question_pool(&raw)
}
