use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::questions::{Question, Subscale, MAX_ANSWER, QUESTION_COUNT};

/// Response value for a question that has not been answered yet.
pub const UNANSWERED: i8 = -1;

/// Raw DASS-42 subscale totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscaleScores {
    pub depression: u32,
    pub anxiety: u32,
    pub stress: u32,
}

impl SubscaleScores {
    pub fn get(&self, subscale: Subscale) -> u32 {
        match subscale {
            Subscale::Depression => self.depression,
            Subscale::Anxiety => self.anxiety,
            Subscale::Stress => self.stress,
        }
    }

    pub fn scores(&self) -> (u32, u32, u32) {
        (self.depression, self.anxiety, self.stress)
    }

    fn add(&mut self, subscale: Subscale, value: u32) {
        match subscale {
            Subscale::Depression => self.depression += value,
            Subscale::Anxiety => self.anxiety += value,
            Subscale::Stress => self.stress += value,
        }
    }
}

/// Check a single response value.
pub fn validate_answer(value: i8) -> Result<(), Error> {
    if value == UNANSWERED || (0..=MAX_ANSWER as i8).contains(&value) {
        Ok(())
    } else {
        Err(Error::IllegalAnswer(value.into()))
    }
}

/// Sum answered responses into their subscales.
///
/// Unweighted sums: the DASS-42 uses raw totals (the DASS-21 doubles them).
/// Unanswered items (`-1`) contribute nothing, so a partial set under-counts
/// instead of failing. Completeness is checked at submission, see
/// [`crate::assessment::ResponseSet::submit`].
pub fn compute_scores(responses: &[i8], questions: &[Question]) -> Result<SubscaleScores, Error> {
    if responses.len() != QUESTION_COUNT {
        return Err(Error::IllegalQuestionCount {
            expected: QUESTION_COUNT,
            actual: responses.len(),
        });
    }
    if questions.len() != QUESTION_COUNT {
        return Err(Error::IllegalQuestionCount {
            expected: QUESTION_COUNT,
            actual: questions.len(),
        });
    }

    let mut scores = SubscaleScores::default();
    for (&response, question) in responses.iter().zip(questions) {
        validate_answer(response)?;
        if response != UNANSWERED {
            scores.add(question.category, response as u32);
        }
    }
    Ok(scores)
}
