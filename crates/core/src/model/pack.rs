use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{CategoryId, PackId};
use crate::model::question::Question;

/// Time limit given to new packs.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PackError {
    #[error("pack name cannot be empty")]
    EmptyName,

    #[error("time limit must be at least one second")]
    InvalidTimeLimit,

    #[error("question index {index} is out of range (pack has {len})")]
    QuestionOutOfRange { index: usize, len: usize },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.pad(label)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseDifficultyError(s.to_owned()))
    }
}

//
// ─── PACK ──────────────────────────────────────────────────────────────────────
//

/// A named, ordered collection of questions sharing a difficulty and a
/// per-question time limit.
///
/// `id` is `None` until the pack has been saved for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<PackId>,
    name: String,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(rename = "timeLimitInSeconds")]
    time_limit_secs: u32,
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category_id: Option<CategoryId>,
    created_at: DateTime<Utc>,
}

impl QuestionPack {
    /// Creates an unsaved, empty pack.
    ///
    /// # Errors
    ///
    /// Returns `PackError::EmptyName` for a blank name and
    /// `PackError::InvalidTimeLimit` for a zero time limit.
    pub fn new(
        name: impl Into<String>,
        difficulty: Difficulty,
        time_limit_secs: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PackError> {
        let name = normalize_name(name.into())?;
        if time_limit_secs == 0 {
            return Err(PackError::InvalidTimeLimit);
        }
        Ok(Self {
            id: None,
            name,
            difficulty,
            time_limit_secs,
            questions: Vec::new(),
            category_id: None,
            created_at,
        })
    }

    /// Rebuild a pack from persisted fields.
    ///
    /// # Errors
    ///
    /// Returns `PackError` if the stored fields no longer validate.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: PackId,
        name: String,
        difficulty: Difficulty,
        time_limit_secs: u32,
        questions: Vec<Question>,
        category_id: Option<CategoryId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PackError> {
        let mut pack = Self::new(name, difficulty, time_limit_secs, created_at)?;
        pack.id = Some(id);
        pack.questions = questions;
        pack.category_id = category_id;
        Ok(pack)
    }

    /// Re-checks invariants after deserialization from an external document.
    ///
    /// # Errors
    ///
    /// Returns `PackError` if the name or time limit is invalid.
    pub fn validate(&self) -> Result<(), PackError> {
        normalize_name(self.name.clone())?;
        if self.time_limit_secs == 0 {
            return Err(PackError::InvalidTimeLimit);
        }
        Ok(())
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> Option<PackId> {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn summary(&self) -> PackSummary {
        PackSummary {
            id: self.id,
            name: self.name.clone(),
            difficulty: self.difficulty,
            time_limit_secs: self.time_limit_secs,
            question_count: self.questions.len(),
            category_id: self.category_id,
        }
    }

    // Mutators used by the editor. Callers persist explicitly afterwards.

    pub fn assign_id(&mut self, id: PackId) {
        self.id = Some(id);
    }

    /// Drops the stored id so the pack is saved as a new record.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// # Errors
    ///
    /// Returns `PackError::EmptyName` if the new name is blank.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), PackError> {
        self.name = normalize_name(name.into())?;
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// # Errors
    ///
    /// Returns `PackError::InvalidTimeLimit` for zero.
    pub fn set_time_limit_secs(&mut self, secs: u32) -> Result<(), PackError> {
        if secs == 0 {
            return Err(PackError::InvalidTimeLimit);
        }
        self.time_limit_secs = secs;
        Ok(())
    }

    pub fn set_category(&mut self, category_id: Option<CategoryId>) {
        self.category_id = category_id;
    }

    pub fn push_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    /// # Errors
    ///
    /// Returns `PackError::QuestionOutOfRange` for an invalid index.
    pub fn replace_question(&mut self, index: usize, question: Question) -> Result<(), PackError> {
        let len = self.questions.len();
        let slot = self
            .questions
            .get_mut(index)
            .ok_or(PackError::QuestionOutOfRange { index, len })?;
        *slot = question;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `PackError::QuestionOutOfRange` for an invalid index.
    pub fn remove_question(&mut self, index: usize) -> Result<Question, PackError> {
        let len = self.questions.len();
        if index >= len {
            return Err(PackError::QuestionOutOfRange { index, len });
        }
        Ok(self.questions.remove(index))
    }
}

fn normalize_name(name: String) -> Result<String, PackError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PackError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

/// Listing row for a pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub id: Option<PackId>,
    pub name: String,
    pub difficulty: Difficulty,
    pub time_limit_secs: u32,
    pub question_count: usize,
    pub category_id: Option<CategoryId>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn question(n: u32) -> Question {
        Question::new(
            format!("Q{n}"),
            format!("A{n}"),
            [format!("B{n}"), format!("C{n}"), format!("D{n}")],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_blank_name_and_zero_limit() {
        assert_eq!(
            QuestionPack::new("  ", Difficulty::Easy, 30, fixed_now()).unwrap_err(),
            PackError::EmptyName
        );
        assert_eq!(
            QuestionPack::new("Pack", Difficulty::Easy, 0, fixed_now()).unwrap_err(),
            PackError::InvalidTimeLimit
        );
    }

    #[test]
    fn new_pack_is_unsaved_and_trimmed() {
        let pack = QuestionPack::new("  Geography ", Difficulty::Hard, 15, fixed_now()).unwrap();
        assert_eq!(pack.id(), None);
        assert_eq!(pack.name(), "Geography");
        assert_eq!(pack.difficulty(), Difficulty::Hard);
        assert_eq!(pack.time_limit_secs(), 15);
        assert_eq!(pack.question_count(), 0);
    }

    #[test]
    fn question_editing_keeps_order() {
        let mut pack = QuestionPack::new("P", Difficulty::Medium, 30, fixed_now()).unwrap();
        pack.push_question(question(1));
        pack.push_question(question(2));
        pack.push_question(question(3));

        pack.replace_question(1, question(9)).unwrap();
        let removed = pack.remove_question(0).unwrap();
        assert_eq!(removed.query(), "Q1");

        let queries: Vec<&str> = pack.questions().iter().map(Question::query).collect();
        assert_eq!(queries, vec!["Q9", "Q3"]);

        assert_eq!(
            pack.remove_question(5).unwrap_err(),
            PackError::QuestionOutOfRange { index: 5, len: 2 }
        );
    }

    #[test]
    fn summary_reflects_pack() {
        let mut pack = QuestionPack::new("P", Difficulty::Easy, 20, fixed_now()).unwrap();
        pack.assign_id(PackId::new(4));
        pack.set_category(Some(CategoryId::new(2)));
        pack.push_question(question(1));

        let summary = pack.summary();
        assert_eq!(summary.id, Some(PackId::new(4)));
        assert_eq!(summary.question_count, 1);
        assert_eq!(summary.time_limit_secs, 20);
        assert_eq!(summary.category_id, Some(CategoryId::new(2)));
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("EASY".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        assert_eq!(Difficulty::Medium.to_string(), "Medium");
    }

    #[test]
    fn json_document_round_trip_keeps_questions() {
        let mut pack = QuestionPack::new("Doc", Difficulty::Easy, 10, fixed_now()).unwrap();
        pack.push_question(question(1));

        let json = serde_json::to_string(&pack).unwrap();
        assert!(json.contains("\"timeLimitInSeconds\":10"));
        assert!(!json.contains("\"id\""));

        let back: QuestionPack = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pack);
    }
}
