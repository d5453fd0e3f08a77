use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::questions::{QUESTIONS, QUESTION_COUNT};
use crate::scoring::{compute_scores, validate_answer, SubscaleScores, UNANSWERED};
use crate::severity::Graded;

/// Departments offered on the profile form.
pub const DEPARTMENTS: [&str; 8] = [
    "Computer Engineering",
    "Information Technology",
    "Computer Science and Bussiness System",
    "Automation and Robotics",
    "Mechanical",
    "Civil",
    "Electronics & Telecommunication",
    "Electrical",
];

/// Years of study offered on the profile form.
pub const YEARS: [&str; 4] = ["First Year", "Second Year", "Third Year", "Fourth Year"];

/// Answers of one in-progress assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSet {
    values: [i8; QUESTION_COUNT],
}

impl Default for ResponseSet {
    fn default() -> Self {
        Self {
            values: [UNANSWERED; QUESTION_COUNT],
        }
    }
}

impl ResponseSet {
    /// Build a set from stored values. Length and answer range are checked.
    pub fn from_slice(values: &[i8]) -> Result<Self, Error> {
        let values: [i8; QUESTION_COUNT] =
            values
                .try_into()
                .map_err(|_| Error::IllegalQuestionCount {
                    expected: QUESTION_COUNT,
                    actual: values.len(),
                })?;
        for &value in &values {
            validate_answer(value)?;
        }
        Ok(Self { values })
    }

    /// Answer the first unanswered question. Only 0..=3 is accepted.
    pub fn push(&mut self, score: i8) -> Result<(), Error> {
        if score == UNANSWERED {
            return Err(Error::IllegalAnswer(score.into()));
        }
        validate_answer(score)?;
        let slot = self
            .values
            .iter_mut()
            .find(|value| **value == UNANSWERED)
            .ok_or(Error::QuestionIndex(QUESTION_COUNT))?;
        *slot = score;
        Ok(())
    }

    /// Set the answer at a zero-based question index. `-1` clears it.
    pub fn insert(&mut self, index: usize, score: i8) -> Result<(), Error> {
        validate_answer(score)?;
        let slot = self
            .values
            .get_mut(index)
            .ok_or(Error::QuestionIndex(index))?;
        *slot = score;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<i8> {
        self.values.get(index).copied()
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.get(index).is_some_and(|value| value != UNANSWERED)
    }

    pub fn answered(&self) -> usize {
        self.values
            .iter()
            .filter(|&&value| value != UNANSWERED)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.answered() == QUESTION_COUNT
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.values
    }

    /// Running totals, unanswered items counting as zero.
    pub fn scores(&self) -> Result<SubscaleScores, Error> {
        compute_scores(&self.values, QUESTIONS.questions())
    }

    /// Freeze the answers into a result. Every question must be answered.
    pub fn submit(
        &self,
        user_id: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Result<AssessmentResult, Error> {
        if !self.is_complete() {
            return Err(Error::NotFulfilled {
                missing: QUESTION_COUNT - self.answered(),
            });
        }
        let scores = self.scores()?;
        Ok(AssessmentResult {
            depression_score: scores.depression,
            anxiety_score: scores.anxiety,
            stress_score: scores.stress,
            timestamp: submitted_at.timestamp_millis(),
            user_id: user_id.into(),
            responses: self.values.to_vec(),
        })
    }
}

/// A completed assessment as persisted in the result store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    #[serde(default)]
    pub depression_score: u32,
    #[serde(default)]
    pub anxiety_score: u32,
    #[serde(default)]
    pub stress_score: u32,
    /// Epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub responses: Vec<i8>,
}

impl AssessmentResult {
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// e.g. `Mar 04, 2025 at 09:30`
    pub fn formatted_date_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self.submitted_at() {
            Some(at) => at
                .with_timezone(tz)
                .format("%b %d, %Y at %H:%M")
                .to_string(),
            None => String::from("Unknown date"),
        }
    }

    pub fn formatted_date(&self) -> String {
        self.formatted_date_in(&Local)
    }
}

impl Graded for AssessmentResult {
    fn subscale_scores(&self) -> SubscaleScores {
        SubscaleScores {
            depression: self.depression_score,
            anxiety: self.anxiety_score,
            stress: self.stress_score,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

fn not_available() -> String {
    String::from("N/A")
}

/// Student profile document. Field names match the stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "className", default = "not_available")]
    pub department: String,
    #[serde(rename = "division", default = "not_available")]
    pub year: String,
    #[serde(rename = "rbt", default = "not_available")]
    pub roll_number: String,
    #[serde(rename = "mobileNumber", default = "not_available")]
    pub mobile_number: String,
    #[serde(rename = "parentContactNumber", default = "not_available")]
    pub parent_contact_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: String::new(),
            department: not_available(),
            year: not_available(),
            roll_number: not_available(),
            mobile_number: not_available(),
            parent_contact_number: not_available(),
            email: None,
            role: Role::Student,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }

    /// A student must fill in a name before taking assessments.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Partial profile write; only `Some` fields replace stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
    pub roll_number: Option<String>,
    pub mobile_number: Option<String>,
    pub parent_contact_number: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl ProfileUpdate {
    pub fn apply(&self, profile: &mut UserProfile) {
        fn merge(slot: &mut String, value: &Option<String>) {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
        merge(&mut profile.name, &self.name);
        merge(&mut profile.department, &self.department);
        merge(&mut profile.year, &self.year);
        merge(&mut profile.roll_number, &self.roll_number);
        merge(&mut profile.mobile_number, &self.mobile_number);
        merge(&mut profile.parent_contact_number, &self.parent_contact_number);
        if self.email.is_some() {
            profile.email.clone_from(&self.email);
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::severity::SeverityLevel;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_push_until_full() {
        let mut set = ResponseSet::default();
        for _ in 0..QUESTION_COUNT {
            assert!(set.push(1).is_ok());
        }
        assert!(set.is_complete());
        assert!(set.push(1).is_err());
    }

    #[test]
    fn test_push_rejects_out_of_range() {
        let mut set = ResponseSet::default();
        assert!(set.push(4).is_err());
        assert!(set.push(-1).is_err());
        assert_eq!(set.answered(), 0);
    }

    #[test]
    fn test_push_skips_inserted_answers() {
        let mut set = ResponseSet::default();
        set.insert(0, 3).unwrap();
        set.insert(2, 0).unwrap();
        set.push(1).unwrap();
        set.push(2).unwrap();
        assert_eq!(set.get(0), Some(3));
        assert_eq!(set.get(1), Some(1));
        assert_eq!(set.get(2), Some(0));
        assert_eq!(set.get(3), Some(2));
        assert_eq!(set.answered(), 4);

        set.insert(1, UNANSWERED).unwrap();
        set.push(3).unwrap();
        assert_eq!(set.get(1), Some(3));
        assert_eq!(set.get(4), Some(UNANSWERED));
    }

    #[test]
    fn test_insert() {
        let mut set = ResponseSet::default();
        assert!(set.insert(0, 2).is_ok());
        assert!(set.insert(41, 3).is_ok());
        assert!(set.insert(42, 1).is_err());
        assert!(set.insert(10, 5).is_err());
        assert_eq!(set.answered(), 2);
        assert!(set.insert(0, UNANSWERED).is_ok());
        assert!(!set.is_answered(0));
        assert_eq!(set.answered(), 1);
    }

    #[test]
    fn test_submit_requires_all_answers() {
        let mut set = ResponseSet::default();
        for _ in 0..41 {
            set.push(2).unwrap();
        }
        assert!(matches!(
            set.submit("u1", at(0)),
            Err(Error::NotFulfilled { missing: 1 })
        ));
        set.push(2).unwrap();
        let result = set.submit("u1", at(1_700_000_000_000)).unwrap();
        assert_eq!(result.depression_score, 28);
        assert_eq!(result.anxiety_score, 28);
        assert_eq!(result.stress_score, 28);
        assert_eq!(result.timestamp, 1_700_000_000_000);
        assert_eq!(result.user_id, "u1");
        assert_eq!(result.responses.len(), QUESTION_COUNT);
        assert_eq!(result.levels().depression, SeverityLevel::ExtremelySevere);
        assert_eq!(result.levels().stress, SeverityLevel::Severe);
    }

    #[test]
    fn test_from_slice() {
        let mut values = vec![0i8; QUESTION_COUNT];
        values[3] = UNANSWERED;
        let set = ResponseSet::from_slice(&values).unwrap();
        assert_eq!(set.answered(), 41);
        assert!(ResponseSet::from_slice(&values[..10]).is_err());
        values[0] = 7;
        assert!(ResponseSet::from_slice(&values).is_err());
    }

    #[test]
    fn test_result_field_names() {
        let result = AssessmentResult {
            depression_score: 10,
            anxiety_score: 8,
            stress_score: 15,
            timestamp: 1_700_000_000_000,
            user_id: String::from("abc"),
            responses: vec![1, 2],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["depressionScore"], 10);
        assert_eq!(value["anxietyScore"], 8);
        assert_eq!(value["stressScore"], 15);
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
        assert_eq!(value["userId"], "abc");
        assert_eq!(value["responses"][1], 2);
    }

    #[test]
    fn test_result_missing_fields_default() {
        let result: AssessmentResult = serde_json::from_str(r#"{"userId":"x"}"#).unwrap();
        assert_eq!(result.depression_score, 0);
        assert_eq!(result.timestamp, 0);
        assert!(result.responses.is_empty());
    }

    #[test]
    fn test_formatted_date() {
        let result = AssessmentResult {
            depression_score: 0,
            anxiety_score: 0,
            stress_score: 0,
            timestamp: 1_741_080_600_000,
            user_id: String::from("abc"),
            responses: vec![],
        };
        assert_eq!(result.formatted_date_in(&Utc), "Mar 04, 2025 at 09:30");
    }

    #[test]
    fn test_profile_document() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"name":"Asha","className":"Civil","division":"First Year","role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(profile.department, "Civil");
        assert_eq!(profile.year, "First Year");
        assert_eq!(profile.mobile_number, "N/A");
        assert_eq!(profile.role, Role::Admin);

        let blank: UserProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(blank.display_name(), "Unknown");
        assert!(!blank.is_complete());
        assert_eq!(blank.role, Role::Student);
    }

    #[test]
    fn test_profile_update_merges() {
        let mut profile = UserProfile::new("u1");
        profile.name = String::from("Asha");
        profile.department = String::from("Civil");
        let update = ProfileUpdate {
            year: Some(String::from("Second Year")),
            email: Some(String::from("asha@example.com")),
            ..ProfileUpdate::default()
        };
        update.apply(&mut profile);
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.department, "Civil");
        assert_eq!(profile.year, "Second Year");
        assert_eq!(profile.email.as_deref(), Some("asha@example.com"));
    }
}
