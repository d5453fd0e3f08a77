use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Number of items on the DASS-42.
pub const QUESTION_COUNT: usize = 42;

/// Items per subscale.
pub const ITEMS_PER_SUBSCALE: usize = 14;

/// Highest answer value.
pub const MAX_ANSWER: u8 = 3;

pub static QUESTIONS: Lazy<QuestionMaster> = Lazy::new(|| {
    serde_json::from_str(include_str!("../resources/dass42.json"))
        .expect("resources/dass42.json is a valid question master")
});

/// One of the three dimensions the DASS measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subscale {
    Depression,
    Anxiety,
    Stress,
}

impl Subscale {
    pub fn ordered() -> [Subscale; 3] {
        [Subscale::Depression, Subscale::Anxiety, Subscale::Stress]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Subscale::Depression => "Depression",
            Subscale::Anxiety => "Anxiety",
            Subscale::Stress => "Stress",
        }
    }
}

impl FromStr for Subscale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subscale::ordered()
            .into_iter()
            .find(|subscale| subscale.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown subscale '{s}'"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Score {
    pub score: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub category: Subscale,
}

/// DASS-42 question master: instructions, answer scale and the 42 items in
/// presentation order.
#[derive(Debug, Deserialize)]
pub struct QuestionMaster {
    pub instructions: String,
    pub scores: Vec<Score>,
    pub questions: Vec<Question>,
}

impl QuestionMaster {
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Look a question up by its id.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Items belonging to one subscale, in presentation order.
    pub fn by_subscale(&self, subscale: Subscale) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |question| question.category == subscale)
    }

    /// Label shown for an answer value.
    pub fn answer_label(&self, score: u8) -> Option<&str> {
        self.scores
            .iter()
            .find(|s| s.score == score)
            .map(|s| s.text.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get() {
        assert_eq!(Some(0), QUESTIONS.get(0).map(|q| q.id));
        assert_eq!(Some(41), QUESTIONS.get(41).map(|q| q.id));
        assert_eq!(None, QUESTIONS.get(42).map(|q| q.id));
    }

    #[test]
    fn test_question() {
        assert_eq!(
            Some("I felt terrified"),
            QUESTIONS.question(25).map(|q| q.text.as_str())
        );
        assert!(QUESTIONS.question(42).is_none());
    }

    #[test]
    fn test_ids_follow_index() {
        for (index, question) in QUESTIONS.questions().iter().enumerate() {
            assert_eq!(question.id as usize, index);
        }
    }

    #[test]
    fn test_category_blocks() {
        let questions = QUESTIONS.questions();
        assert_eq!(questions.len(), QUESTION_COUNT);
        assert!(questions[..14]
            .iter()
            .all(|q| q.category == Subscale::Depression));
        assert!(questions[14..28]
            .iter()
            .all(|q| q.category == Subscale::Anxiety));
        assert!(questions[28..].iter().all(|q| q.category == Subscale::Stress));
        for subscale in Subscale::ordered() {
            assert_eq!(QUESTIONS.by_subscale(subscale).count(), ITEMS_PER_SUBSCALE);
        }
    }

    #[test]
    fn test_parse_subscale() {
        assert_eq!("stress".parse::<Subscale>(), Ok(Subscale::Stress));
        assert_eq!("Depression".parse::<Subscale>(), Ok(Subscale::Depression));
        assert!("mood".parse::<Subscale>().is_err());
    }

    #[test]
    fn test_answer_labels() {
        assert_eq!(QUESTIONS.answer_label(0), Some("Did not apply to me at all"));
        assert_eq!(QUESTIONS.answer_label(3), Some("Applied to me very much"));
        assert_eq!(QUESTIONS.answer_label(4), None);
    }
}
