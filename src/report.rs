//! Admin dashboard aggregation over many users' results.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::assessment::{AssessmentResult, UserProfile};
use crate::error::Error;
use crate::questions::Subscale;
use crate::severity::{Graded, Levels, SeverityLevel};

/// Dropdown selection: everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(expected) => expected == value,
        }
    }
}

impl FromStr for Filter<String> {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "All" {
            Filter::All
        } else {
            Filter::Only(s.to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity level '{0}'")]
pub struct UnknownLevel(pub String);

impl FromStr for Filter<SeverityLevel> {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Filter::All);
        }
        SeverityLevel::from_label(s)
            .map(Filter::Only)
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("All"),
            Filter::Only(value) => value.fmt(f),
        }
    }
}

/// One student row on a subscale list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub user_id: String,
    pub profile: UserProfile,
    pub levels: Levels,
    pub timestamp: i64,
}

/// Per-level counts for one subscale. Levels with no result are absent.
pub type LevelCounts = BTreeMap<SeverityLevel, usize>;

/// One slice of a severity distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub level: SeverityLevel,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedReport {
    pub total: usize,
    pub counts: HashMap<Subscale, LevelCounts>,
    pub students: HashMap<Subscale, Vec<StudentSummary>>,
}

impl AggregatedReport {
    pub fn counts(&self, subscale: Subscale) -> Option<&LevelCounts> {
        self.counts.get(&subscale)
    }

    pub fn count(&self, subscale: Subscale, level: SeverityLevel) -> usize {
        self.counts
            .get(&subscale)
            .and_then(|counts| counts.get(&level))
            .copied()
            .unwrap_or(0)
    }

    /// Non-Normal students for a subscale, optionally narrowed to one level.
    pub fn students(
        &self,
        subscale: Subscale,
        level: &Filter<SeverityLevel>,
    ) -> Vec<&StudentSummary> {
        self.students
            .get(&subscale)
            .map(|students| {
                students
                    .iter()
                    .filter(|student| level.matches(&student.levels.get(subscale)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Share of each level, in severity order.
    pub fn distribution(&self, subscale: Subscale) -> Vec<DistributionEntry> {
        let Some(counts) = self.counts.get(&subscale) else {
            return Vec::new();
        };
        let total: usize = counts.values().sum();
        if total == 0 {
            return Vec::new();
        }
        counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(&level, &count)| DistributionEntry {
                level,
                count,
                percentage: count as f64 / total as f64 * 100.0,
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct StudentRow<'a> {
    subscale: &'static str,
    name: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
    department: &'a str,
    year: &'a str,
    #[serde(rename = "rollNumber")]
    roll_number: &'a str,
    #[serde(rename = "mobileNumber")]
    mobile_number: &'a str,
    #[serde(rename = "parentContactNumber")]
    parent_contact_number: &'a str,
    depression: &'static str,
    anxiety: &'static str,
    stress: &'static str,
    timestamp: i64,
}

/// Export the student lists of the given subscales as CSV.
pub fn write_students_csv<W: Write>(
    report: &AggregatedReport,
    subscales: &[Subscale],
    level: &Filter<SeverityLevel>,
    writer: W,
) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for &subscale in subscales {
        for student in report.students(subscale, level) {
            let profile = &student.profile;
            writer.serialize(StudentRow {
                subscale: subscale.label(),
                name: profile.display_name(),
                user_id: &student.user_id,
                department: &profile.department,
                year: &profile.year,
                roll_number: &profile.roll_number,
                mobile_number: &profile.mobile_number,
                parent_contact_number: &profile.parent_contact_number,
                depression: student.levels.depression.label(),
                anxiety: student.levels.anxiety.label(),
                stress: student.levels.stress.label(),
                timestamp: student.timestamp,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Filter, classify, count and list stored results for the dashboard.
///
/// Results whose owner has no profile are skipped. Student lists hold only
/// non-Normal entries, sorted by name, one row per user.
pub fn aggregate(
    results: &[AssessmentResult],
    profiles: &HashMap<String, UserProfile>,
    department: &Filter<String>,
    year: &Filter<String>,
) -> AggregatedReport {
    let filtered: Vec<(&AssessmentResult, &UserProfile)> = results
        .iter()
        .filter_map(|result| {
            let profile = profiles.get(&result.user_id)?;
            (department.matches(&profile.department) && year.matches(&profile.year))
                .then_some((result, profile))
        })
        .collect();

    if filtered.is_empty() {
        return AggregatedReport::default();
    }

    let mut counts: HashMap<Subscale, LevelCounts> = HashMap::new();
    let mut students: HashMap<Subscale, Vec<StudentSummary>> = HashMap::new();

    for (result, profile) in &filtered {
        let levels = result.levels();
        for subscale in Subscale::ordered() {
            let level = levels.get(subscale);
            *counts
                .entry(subscale)
                .or_default()
                .entry(level)
                .or_insert(0) += 1;
            if level != SeverityLevel::Normal {
                students.entry(subscale).or_default().push(StudentSummary {
                    user_id: result.user_id.clone(),
                    profile: (*profile).clone(),
                    levels,
                    timestamp: result.timestamp,
                });
            }
        }
    }

    for list in students.values_mut() {
        list.sort_by(|a, b| a.profile.name.cmp(&b.profile.name));
        let mut seen = HashSet::new();
        list.retain(|student| seen.insert(student.user_id.clone()));
    }

    AggregatedReport {
        total: filtered.len(),
        counts,
        students,
    }
}
