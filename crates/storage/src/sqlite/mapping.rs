use quiz_core::model::{CategoryId, Difficulty, PackId, Question};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn pack_id_from_i64(v: i64) -> Result<PackId, StorageError> {
    Ok(PackId::new(i64_to_u64("pack_id", v)?))
}

pub(crate) fn pack_id_to_i64(id: PackId) -> Result<i64, StorageError> {
    u64_to_i64("pack_id", id.value())
}

pub(crate) fn category_id_from_i64(v: i64) -> Result<CategoryId, StorageError> {
    Ok(CategoryId::new(i64_to_u64("category_id", v)?))
}

pub(crate) fn category_id_to_i64(id: CategoryId) -> Result<i64, StorageError> {
    u64_to_i64("category_id", id.value())
}

pub(crate) fn parse_difficulty(s: &str) -> Result<Difficulty, StorageError> {
    s.parse::<Difficulty>().map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    Question::new(
        row.try_get::<String, _>("query").map_err(ser)?,
        row.try_get::<String, _>("correct_answer").map_err(ser)?,
        [
            row.try_get::<String, _>("incorrect_1").map_err(ser)?,
            row.try_get::<String, _>("incorrect_2").map_err(ser)?,
            row.try_get::<String, _>("incorrect_3").map_err(ser)?,
        ],
    )
    .map_err(ser)
}

/// Detects a violated UNIQUE constraint so it can surface as a name conflict.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Detects a violated FOREIGN KEY constraint (a dangling category reference).
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_text_matches_schema_check() {
        for d in Difficulty::ALL {
            assert_eq!(parse_difficulty(d.as_str()).unwrap(), d);
        }
        assert!(parse_difficulty("legendary").is_err());
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(pack_id_from_i64(-1).is_err());
        assert_eq!(pack_id_from_i64(5).unwrap(), PackId::new(5));
        assert!(pack_id_to_i64(PackId::new(u64::MAX)).is_err());
    }
}
