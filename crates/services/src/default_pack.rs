//! The pack offered when nothing else is stored.

use chrono::{DateTime, Utc};
use quiz_core::model::{DEFAULT_TIME_LIMIT_SECS, Difficulty, Question, QuestionPack};

pub const DEFAULT_PACK_NAME: &str = "Default Question Pack";

const QUESTIONS: [(&str, &str, [&str; 3]); 6] = [
    (
        "What is the capital of Australia?",
        "Canberra",
        ["Sydney", "Melbourne", "Perth"],
    ),
    (
        "Which planet is known as the Red Planet?",
        "Mars",
        ["Venus", "Jupiter", "Mercury"],
    ),
    (
        "How many continents are there on Earth?",
        "7",
        ["5", "6", "8"],
    ),
    (
        "Which element has the chemical symbol O?",
        "Oxygen",
        ["Gold", "Osmium", "Oganesson"],
    ),
    (
        "Who painted the Mona Lisa?",
        "Leonardo da Vinci",
        ["Michelangelo", "Raphael", "Rembrandt"],
    ),
    (
        "What is the largest ocean on Earth?",
        "Pacific Ocean",
        ["Atlantic Ocean", "Indian Ocean", "Arctic Ocean"],
    ),
];

/// Builds the unsaved default pack.
///
/// # Errors
///
/// Returns `quiz_core::Error` if the built-in questions fail validation.
pub fn default_pack(created_at: DateTime<Utc>) -> Result<QuestionPack, quiz_core::Error> {
    let mut pack = QuestionPack::new(
        DEFAULT_PACK_NAME,
        Difficulty::Medium,
        DEFAULT_TIME_LIMIT_SECS,
        created_at,
    )?;
    for (query, correct, wrong) in QUESTIONS {
        pack.push_question(Question::new(query, correct, wrong)?);
    }
    Ok(pack)
}
