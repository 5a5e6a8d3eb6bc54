use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of wrong answers every question carries.
pub const INCORRECT_ANSWER_COUNT: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyQuery,

    #[error("correct answer cannot be empty")]
    EmptyCorrectAnswer,

    #[error("incorrect answer #{index} cannot be empty")]
    EmptyIncorrectAnswer { index: usize },

    #[error("answer \"{answer}\" appears more than once")]
    DuplicateAnswer { answer: String },
}

/// A multiple-choice question: one correct answer and three distractors.
///
/// All four answers are trimmed, non-empty and pairwise distinct, so the
/// correct option can always be identified by its text alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDocument", into = "QuestionDocument")]
pub struct Question {
    query: String,
    correct_answer: String,
    incorrect_answers: [String; INCORRECT_ANSWER_COUNT],
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any text is blank or two answers coincide.
    pub fn new(
        query: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: [impl Into<String>; INCORRECT_ANSWER_COUNT],
    ) -> Result<Self, QuestionError> {
        let query = query.into().trim().to_owned();
        if query.is_empty() {
            return Err(QuestionError::EmptyQuery);
        }

        let correct_answer = correct_answer.into().trim().to_owned();
        if correct_answer.is_empty() {
            return Err(QuestionError::EmptyCorrectAnswer);
        }

        let incorrect_answers = incorrect_answers.map(|a| a.into().trim().to_owned());
        if let Some(index) = incorrect_answers.iter().position(String::is_empty) {
            return Err(QuestionError::EmptyIncorrectAnswer { index: index + 1 });
        }

        let mut seen: Vec<&str> = Vec::with_capacity(INCORRECT_ANSWER_COUNT + 1);
        for answer in std::iter::once(&correct_answer).chain(incorrect_answers.iter()) {
            if seen.contains(&answer.as_str()) {
                return Err(QuestionError::DuplicateAnswer {
                    answer: answer.clone(),
                });
            }
            seen.push(answer);
        }

        Ok(Self {
            query,
            correct_answer,
            incorrect_answers,
        })
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> &[String; INCORRECT_ANSWER_COUNT] {
        &self.incorrect_answers
    }

    /// All answers, correct one first.
    pub fn answers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.correct_answer.as_str())
            .chain(self.incorrect_answers.iter().map(String::as_str))
    }

    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Serialized shape of a question; validated on the way back in.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDocument {
    query: String,
    correct_answer: String,
    incorrect_answers: [String; INCORRECT_ANSWER_COUNT],
}

impl TryFrom<QuestionDocument> for Question {
    type Error = QuestionError;

    fn try_from(doc: QuestionDocument) -> Result<Self, Self::Error> {
        Question::new(doc.query, doc.correct_answer, doc.incorrect_answers)
    }
}

impl From<Question> for QuestionDocument {
    fn from(q: Question) -> Self {
        Self {
            query: q.query,
            correct_answer: q.correct_answer,
            incorrect_answers: q.incorrect_answers,
        }
    }
}
