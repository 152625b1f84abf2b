// src/catalog.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::OPTIONS_PER_QUESTION;

/// The five fixed subject areas of the study planner.
/// Serialized as course codes, which is also how results rows store them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "VU23213")]
    Vu23213,
    #[serde(rename = "VU23215")]
    Vu23215,
    #[serde(rename = "VU23217")]
    Vu23217,
    #[serde(rename = "VU23220")]
    Vu23220,
    #[serde(rename = "PYTHON101")]
    Python101,
}

impl Subject {
    pub fn code(&self) -> &'static str {
        match self {
            Subject::Vu23213 => "VU23213",
            Subject::Vu23215 => "VU23215",
            Subject::Vu23217 => "VU23217",
            Subject::Vu23220 => "VU23220",
            Subject::Python101 => "PYTHON101",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Subject::Vu23213 => "Network Concepts & Protocols",
            Subject::Vu23215 => "Cyber Security Testing",
            Subject::Vu23217 => "Organisational Security",
            Subject::Vu23220 => "Cyber Threat Fundamentals",
            Subject::Python101 => "Python Fundamentals",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single multiple-choice question as bundled in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    /// Exactly four options; validated at catalog load.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option: usize,
    pub explanation: String,
}

/// DTO for sending a question to the client (excludes answer and explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub text: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}

/// Per-difficulty summary used by the selection screen. Difficulties without
/// content are omitted entirely, which is what gates `select_difficulty`.
#[derive(Debug, Serialize)]
pub struct DifficultyOverview {
    pub difficulty: Difficulty,
    pub question_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SubjectOverview {
    pub subject: Subject,
    pub display_name: &'static str,
    pub difficulties: Vec<DifficultyOverview>,
}

#[derive(Debug)]
pub enum CatalogError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Parse(e) => write!(f, "catalog parse error: {}", e),
            CatalogError::Invalid(msg) => write!(f, "invalid catalog entry: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

/// The read-only question bank: subject -> difficulty -> ordered questions.
/// Parsed once at startup from the JSON bundled into the binary and held in
/// `AppState`; never mutated afterwards.
#[derive(Debug)]
pub struct Catalog {
    subjects: BTreeMap<Subject, BTreeMap<Difficulty, Vec<Question>>>,
}

/// Question bank compiled into the binary.
const BUNDLED_CATALOG: &str = include_str!("../content/catalog.json");

impl Catalog {
    /// Parses and validates the bundled catalog. A malformed bundle is a
    /// build defect, so callers abort startup on error.
    pub fn load_bundled() -> Result<Catalog, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Catalog, CatalogError> {
        let subjects: BTreeMap<Subject, BTreeMap<Difficulty, Vec<Question>>> =
            serde_json::from_str(raw).map_err(CatalogError::Parse)?;

        for (subject, tiers) in &subjects {
            for (difficulty, questions) in tiers {
                for (i, q) in questions.iter().enumerate() {
                    if q.options.len() != OPTIONS_PER_QUESTION {
                        return Err(CatalogError::Invalid(format!(
                            "{}/{} question {} has {} options, expected {}",
                            subject,
                            difficulty,
                            i,
                            q.options.len(),
                            OPTIONS_PER_QUESTION
                        )));
                    }
                    if q.correct_option >= q.options.len() {
                        return Err(CatalogError::Invalid(format!(
                            "{}/{} question {} correct_option {} out of range",
                            subject, difficulty, i, q.correct_option
                        )));
                    }
                }
            }
        }

        Ok(Catalog { subjects })
    }

    /// Ordered question list for a subject/difficulty pair. Empty when the
    /// catalog has no content for the pair.
    pub fn questions(&self, subject: Subject, difficulty: Difficulty) -> &[Question] {
        self.subjects
            .get(&subject)
            .and_then(|tiers| tiers.get(&difficulty))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_questions(&self, subject: Subject, difficulty: Difficulty) -> bool {
        !self.questions(subject, difficulty).is_empty()
    }

    /// Selection-screen view: every subject with the difficulties that
    /// actually have content.
    pub fn overview(&self) -> Vec<SubjectOverview> {
        self.subjects
            .iter()
            .map(|(subject, tiers)| SubjectOverview {
                subject: *subject,
                display_name: subject.display_name(),
                difficulties: tiers
                    .iter()
                    .filter(|(_, questions)| !questions.is_empty())
                    .map(|(difficulty, questions)| DifficultyOverview {
                        difficulty: *difficulty,
                        question_count: questions.len(),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_loads() {
        let catalog = Catalog::load_bundled().expect("bundled catalog must be valid");
        assert_eq!(catalog.overview().len(), 5);
    }

    #[test]
    fn every_bundled_pair_is_well_formed() {
        let catalog = Catalog::load_bundled().unwrap();
        for entry in catalog.overview() {
            for tier in &entry.difficulties {
                let questions = catalog.questions(entry.subject, tier.difficulty);
                assert_eq!(questions.len(), tier.question_count);
                for q in questions {
                    assert_eq!(q.options.len(), OPTIONS_PER_QUESTION);
                    assert!(q.correct_option < OPTIONS_PER_QUESTION);
                    assert!(!q.explanation.is_empty());
                }
            }
        }
    }

    #[test]
    fn missing_pair_yields_empty_slice() {
        let catalog = Catalog::from_json(
            r#"{ "VU23213": { "easy": [] } }"#,
        )
        .unwrap();
        assert!(catalog.questions(Subject::Vu23215, Difficulty::Hard).is_empty());
        assert!(!catalog.has_questions(Subject::Vu23213, Difficulty::Easy));
    }

    #[test]
    fn rejects_wrong_option_count() {
        let raw = r#"{ "VU23213": { "easy": [
            { "text": "q", "options": ["a", "b"], "correct_option": 0, "explanation": "e" }
        ] } }"#;
        assert!(matches!(
            Catalog::from_json(raw),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let raw = r#"{ "VU23213": { "easy": [
            { "text": "q", "options": ["a", "b", "c", "d"], "correct_option": 4, "explanation": "e" }
        ] } }"#;
        assert!(matches!(
            Catalog::from_json(raw),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn overview_hides_empty_difficulties() {
        let raw = r#"{ "VU23213": { "easy": [
            { "text": "q", "options": ["a", "b", "c", "d"], "correct_option": 1, "explanation": "e" }
        ], "hard": [] } }"#;
        let catalog = Catalog::from_json(raw).unwrap();
        let overview = catalog.overview();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].difficulties.len(), 1);
        assert_eq!(overview[0].difficulties[0].difficulty, Difficulty::Easy);
    }
}
