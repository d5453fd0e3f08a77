//! DASS-42 (Depression Anxiety Stress Scales) scoring.
//!
//! Turns 42 Likert answers into three subscale totals, grades each total into
//! a severity band and aggregates many students' results for the admin
//! dashboard. Storage, session flow and the bulk CSV reader sit around that
//! core.

pub mod assessment;
pub mod config;
pub mod error;
pub mod questions;
pub mod report;
pub mod scoring;
pub mod session;
pub mod severity;
pub mod store;
pub mod telemetry;

use std::io::Read;

pub use assessment::{AssessmentResult, ProfileUpdate, ResponseSet, Role, UserProfile};
pub use error::Error;
pub use questions::{Question, Subscale, QUESTIONS, QUESTION_COUNT};
pub use report::{aggregate, AggregatedReport, Filter, StudentSummary};
pub use scoring::{compute_scores, SubscaleScores, UNANSWERED};
pub use severity::{classify_anxiety, classify_depression, classify_stress, Graded, SeverityLevel};

/// Read respondents from CSV.
///
/// The first row is a header. Each following row is an id followed by 42
/// answers; an empty cell or `-1` means unanswered.
pub fn read_bulk<R: Read>(reader: R) -> impl Iterator<Item = Result<(String, ResponseSet), Error>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_records()
        .map(|record| {
            let record = record?;
            let mut fields = record.iter();
            let id = fields.next().unwrap_or_default().to_string();
            let values = fields
                .map(|field| {
                    if field.is_empty() {
                        return Ok(UNANSWERED);
                    }
                    field
                        .parse::<i8>()
                        .map_err(|_| Error::UnparsableAnswer(field.to_string()))
                })
                .collect::<Result<Vec<i8>, Error>>()?;
            Ok((id, ResponseSet::from_slice(&values)?))
        })
}
