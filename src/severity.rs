//! DASS-42 severity bands and their presentation tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::questions::Subscale;
use crate::scoring::SubscaleScores;

/// Ordinal severity band. Derived from a score, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    Normal,
    Mild,
    Moderate,
    Severe,
    #[serde(rename = "Extremely Severe")]
    ExtremelySevere,
}

impl SeverityLevel {
    pub fn ordered() -> [SeverityLevel; 5] {
        [
            SeverityLevel::Normal,
            SeverityLevel::Mild,
            SeverityLevel::Moderate,
            SeverityLevel::Severe,
            SeverityLevel::ExtremelySevere,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityLevel::Normal => "Normal",
            SeverityLevel::Mild => "Mild",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Severe => "Severe",
            SeverityLevel::ExtremelySevere => "Extremely Severe",
        }
    }

    /// Parse a display label back into a level.
    pub fn from_label(label: &str) -> Option<SeverityLevel> {
        SeverityLevel::ordered()
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Result-card color.
    pub fn color(&self) -> &'static str {
        match self {
            SeverityLevel::Normal => "#10B981",
            SeverityLevel::Mild => "#F59E0B",
            SeverityLevel::Moderate => "#EF4444",
            SeverityLevel::Severe => "#DC2626",
            SeverityLevel::ExtremelySevere => "#991B1B",
        }
    }

    /// Dashboard distribution chart color.
    pub fn chart_color(&self) -> &'static str {
        match self {
            SeverityLevel::Normal => "#4CAF50",
            SeverityLevel::Mild => "#2196F3",
            SeverityLevel::Moderate => "#FFC107",
            SeverityLevel::Severe => "#FF5722",
            SeverityLevel::ExtremelySevere => "#E53935",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Inclusive upper bounds for Normal, Mild, Moderate and Severe.
const DEPRESSION_BOUNDS: [u32; 4] = [9, 13, 20, 27];
const ANXIETY_BOUNDS: [u32; 4] = [7, 9, 14, 19];
const STRESS_BOUNDS: [u32; 4] = [14, 18, 25, 33];

fn classify(score: u32, bounds: &[u32; 4]) -> SeverityLevel {
    match score {
        score if score <= bounds[0] => SeverityLevel::Normal,
        score if score <= bounds[1] => SeverityLevel::Mild,
        score if score <= bounds[2] => SeverityLevel::Moderate,
        score if score <= bounds[3] => SeverityLevel::Severe,
        _ => SeverityLevel::ExtremelySevere,
    }
}

pub fn classify_depression(score: u32) -> SeverityLevel {
    classify(score, &DEPRESSION_BOUNDS)
}

pub fn classify_anxiety(score: u32) -> SeverityLevel {
    classify(score, &ANXIETY_BOUNDS)
}

pub fn classify_stress(score: u32) -> SeverityLevel {
    classify(score, &STRESS_BOUNDS)
}

impl Subscale {
    pub fn classify(&self, score: u32) -> SeverityLevel {
        match self {
            Subscale::Depression => classify_depression(score),
            Subscale::Anxiety => classify_anxiety(score),
            Subscale::Stress => classify_stress(score),
        }
    }
}

/// Text shown under a subscale score on the result view.
///
/// Stress reuses the anxiety wording; the band still comes from the stress
/// thresholds.
pub fn description(subscale: Subscale, level: SeverityLevel) -> &'static str {
    use SeverityLevel::*;
    match (subscale, level) {
        (Subscale::Depression, Normal) => {
            "Your depression levels are within the normal range. You're experiencing minimal symptoms of depression."
        }
        (Subscale::Depression, Mild) => {
            "You may be experiencing mild depression symptoms. Consider monitoring your mood and practicing self-care."
        }
        (Subscale::Depression, Moderate) => {
            "You're showing moderate levels of depression. It may be beneficial to speak with a mental health professional."
        }
        (Subscale::Depression, Severe) => {
            "You're experiencing severe depression symptoms. Professional support is strongly recommended."
        }
        (Subscale::Depression, ExtremelySevere) => {
            "You're showing extremely severe depression levels. Please seek immediate professional help."
        }
        (Subscale::Anxiety | Subscale::Stress, Normal) => {
            "Your anxiety levels are within the normal range. You're managing stress and worry effectively."
        }
        (Subscale::Anxiety | Subscale::Stress, Mild) => {
            "You may be experiencing mild anxiety symptoms. Consider relaxation techniques and stress management."
        }
        (Subscale::Anxiety | Subscale::Stress, Moderate) => {
            "You're showing moderate anxiety levels. Professional guidance could help you develop coping strategies."
        }
        (Subscale::Anxiety | Subscale::Stress, Severe) => {
            "You're experiencing severe anxiety symptoms. Professional support is strongly recommended."
        }
        (Subscale::Anxiety | Subscale::Stress, ExtremelySevere) => {
            "You're showing extremely severe anxiety levels. Please seek immediate professional help."
        }
    }
}

/// The three severity bands of one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Levels {
    pub depression: SeverityLevel,
    pub anxiety: SeverityLevel,
    pub stress: SeverityLevel,
}

impl Levels {
    pub fn get(&self, subscale: Subscale) -> SeverityLevel {
        match subscale {
            Subscale::Depression => self.depression,
            Subscale::Anxiety => self.anxiety,
            Subscale::Stress => self.stress,
        }
    }
}

/// One row of the result view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub subscale: Subscale,
    pub score: u32,
    pub level: SeverityLevel,
    pub color: &'static str,
    pub description: &'static str,
}

/// Anything carrying the three DASS subscale totals.
pub trait Graded {
    fn subscale_scores(&self) -> SubscaleScores;

    fn levels(&self) -> Levels {
        let scores = self.subscale_scores();
        Levels {
            depression: classify_depression(scores.depression),
            anxiety: classify_anxiety(scores.anxiety),
            stress: classify_stress(scores.stress),
        }
    }

    fn interpret(&self) -> Vec<Interpretation> {
        let scores = self.subscale_scores();
        Subscale::ordered()
            .into_iter()
            .map(|subscale| {
                let score = scores.get(subscale);
                let level = subscale.classify(score);
                Interpretation {
                    subscale,
                    score,
                    level,
                    color: level.color(),
                    description: description(subscale, level),
                }
            })
            .collect()
    }
}

impl Graded for SubscaleScores {
    fn subscale_scores(&self) -> SubscaleScores {
        *self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_depression_boundaries() {
        assert_eq!(classify_depression(0), SeverityLevel::Normal);
        assert_eq!(classify_depression(9), SeverityLevel::Normal);
        assert_eq!(classify_depression(10), SeverityLevel::Mild);
        assert_eq!(classify_depression(13), SeverityLevel::Mild);
        assert_eq!(classify_depression(14), SeverityLevel::Moderate);
        assert_eq!(classify_depression(20), SeverityLevel::Moderate);
        assert_eq!(classify_depression(21), SeverityLevel::Severe);
        assert_eq!(classify_depression(27), SeverityLevel::Severe);
        assert_eq!(classify_depression(28), SeverityLevel::ExtremelySevere);
        assert_eq!(classify_depression(42), SeverityLevel::ExtremelySevere);
    }

    #[test]
    fn test_anxiety_boundaries() {
        assert_eq!(classify_anxiety(7), SeverityLevel::Normal);
        assert_eq!(classify_anxiety(8), SeverityLevel::Mild);
        assert_eq!(classify_anxiety(9), SeverityLevel::Mild);
        assert_eq!(classify_anxiety(10), SeverityLevel::Moderate);
        assert_eq!(classify_anxiety(14), SeverityLevel::Moderate);
        assert_eq!(classify_anxiety(15), SeverityLevel::Severe);
        assert_eq!(classify_anxiety(19), SeverityLevel::Severe);
        assert_eq!(classify_anxiety(20), SeverityLevel::ExtremelySevere);
    }

    #[test]
    fn test_stress_boundaries() {
        assert_eq!(classify_stress(14), SeverityLevel::Normal);
        assert_eq!(classify_stress(15), SeverityLevel::Mild);
        assert_eq!(classify_stress(18), SeverityLevel::Mild);
        assert_eq!(classify_stress(19), SeverityLevel::Moderate);
        assert_eq!(classify_stress(25), SeverityLevel::Moderate);
        assert_eq!(classify_stress(26), SeverityLevel::Severe);
        assert_eq!(classify_stress(33), SeverityLevel::Severe);
        assert_eq!(classify_stress(34), SeverityLevel::ExtremelySevere);
    }

    #[test]
    fn test_subscale_dispatch() {
        assert_eq!(Subscale::Depression.classify(10), SeverityLevel::Mild);
        assert_eq!(Subscale::Anxiety.classify(10), SeverityLevel::Moderate);
        assert_eq!(Subscale::Stress.classify(10), SeverityLevel::Normal);
    }

    #[test]
    fn test_labels() {
        assert_eq!(SeverityLevel::ExtremelySevere.to_string(), "Extremely Severe");
        assert_eq!(
            SeverityLevel::from_label("extremely severe"),
            Some(SeverityLevel::ExtremelySevere)
        );
        assert_eq!(SeverityLevel::from_label("Mild"), Some(SeverityLevel::Mild));
        assert_eq!(SeverityLevel::from_label("High"), None);
        assert!(SeverityLevel::Normal < SeverityLevel::ExtremelySevere);
    }

    #[test]
    fn test_interpret() {
        let scores = SubscaleScores {
            depression: 12,
            anxiety: 20,
            stress: 15,
        };
        let rows = scores.interpret();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].level, SeverityLevel::Mild);
        assert_eq!(rows[0].color, "#F59E0B");
        assert_eq!(rows[1].level, SeverityLevel::ExtremelySevere);
        assert_eq!(rows[1].color, "#991B1B");
        assert!(rows[1].description.contains("extremely severe anxiety"));
        assert_eq!(rows[2].level, SeverityLevel::Mild);
        assert_eq!(
            scores.levels(),
            Levels {
                depression: SeverityLevel::Mild,
                anxiety: SeverityLevel::ExtremelySevere,
                stress: SeverityLevel::Mild,
            }
        );
    }
}
