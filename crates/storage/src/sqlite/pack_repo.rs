use chrono::{DateTime, Utc};
use quiz_core::model::{PackId, PackSummary, QuestionPack};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    category_id_from_i64, category_id_to_i64, conn, is_foreign_key_violation,
    is_unique_violation, map_question_row, pack_id_from_i64, pack_id_to_i64, parse_difficulty,
    ser,
};
use crate::repository::{PackRepository, StorageError};

fn write_err(e: sqlx::Error, pack: &QuestionPack) -> StorageError {
    if is_unique_violation(&e) {
        return StorageError::NameConflict {
            name: pack.name().to_owned(),
        };
    }
    match pack.category_id() {
        Some(id) if is_foreign_key_violation(&e) => StorageError::UnknownCategory { id },
        _ => conn(e),
    }
}

#[async_trait::async_trait]
impl PackRepository for SqliteRepository {
    async fn save_pack(&self, pack: &QuestionPack) -> Result<PackId, StorageError> {
        let name = pack.name().to_owned();
        let difficulty = pack.difficulty().as_str();
        let time_limit = i64::from(pack.time_limit_secs());
        let category_id = pack.category_id().map(category_id_to_i64).transpose()?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let id = match pack.id() {
            None => {
                let res = sqlx::query(
                    r"
                    INSERT INTO packs (name, difficulty, time_limit_secs, category_id, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ",
                )
                .bind(name.as_str())
                .bind(difficulty)
                .bind(time_limit)
                .bind(category_id)
                .bind(pack.created_at())
                .execute(&mut *tx)
                .await
                .map_err(|e| write_err(e, pack))?;
                pack_id_from_i64(res.last_insert_rowid())?
            }
            Some(id) => {
                let res = sqlx::query(
                    r"
                    UPDATE packs
                    SET name = ?2, difficulty = ?3, time_limit_secs = ?4, category_id = ?5
                    WHERE id = ?1
                    ",
                )
                .bind(pack_id_to_i64(id)?)
                .bind(name.as_str())
                .bind(difficulty)
                .bind(time_limit)
                .bind(category_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| write_err(e, pack))?;
                if res.rows_affected() == 0 {
                    return Err(StorageError::NotFound);
                }

                sqlx::query("DELETE FROM questions WHERE pack_id = ?1")
                    .bind(pack_id_to_i64(id)?)
                    .execute(&mut *tx)
                    .await
                    .map_err(conn)?;
                id
            }
        };

        let pack_id = pack_id_to_i64(id)?;
        for (position, question) in pack.questions().iter().enumerate() {
            let [wrong_1, wrong_2, wrong_3] = question.incorrect_answers();
            sqlx::query(
                r"
                INSERT INTO questions (pack_id, position, query, correct_answer, incorrect_1, incorrect_2, incorrect_3)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(pack_id)
            .bind(i64::try_from(position).map_err(|_| ser("position overflow"))?)
            .bind(question.query())
            .bind(question.correct_answer())
            .bind(wrong_1.as_str())
            .bind(wrong_2.as_str())
            .bind(wrong_3.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(id)
    }

    async fn load_pack(&self, name: &str) -> Result<Option<QuestionPack>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, difficulty, time_limit_secs, category_id, created_at
            FROM packs WHERE name = ?1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i64 = row.try_get("id").map_err(ser)?;
        let question_rows = sqlx::query(
            r"
            SELECT query, correct_answer, incorrect_1, incorrect_2, incorrect_3
            FROM questions WHERE pack_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let questions = question_rows
            .iter()
            .map(map_question_row)
            .collect::<Result<Vec<_>, _>>()?;

        QuestionPack::from_persisted(
            pack_id_from_i64(id)?,
            row.try_get::<String, _>("name").map_err(ser)?,
            parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?,
            time_limit_from_row(&row)?,
            questions,
            row.try_get::<Option<i64>, _>("category_id")
                .map_err(ser)?
                .map(category_id_from_i64)
                .transpose()?,
            row.try_get::<DateTime<Utc>, _>("created_at").map_err(ser)?,
        )
        .map(Some)
        .map_err(ser)
    }

    async fn list_packs(&self) -> Result<Vec<PackSummary>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT p.id, p.name, p.difficulty, p.time_limit_secs, p.category_id,
                   COUNT(q.position) AS question_count
            FROM packs p
            LEFT JOIN questions q ON q.pack_id = p.id
            GROUP BY p.id
            ORDER BY p.name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn delete_pack(&self, name: &str) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM packs WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn pack_exists(&self, name: &str) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM packs WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        Ok(row.is_some())
    }
}

fn time_limit_from_row(row: &SqliteRow) -> Result<u32, StorageError> {
    let raw: i64 = row.try_get("time_limit_secs").map_err(ser)?;
    u32::try_from(raw).map_err(|_| StorageError::Serialization(format!("invalid time limit: {raw}")))
}

fn summary_from_row(row: &SqliteRow) -> Result<PackSummary, StorageError> {
    let count: i64 = row.try_get("question_count").map_err(ser)?;
    Ok(PackSummary {
        id: Some(pack_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?),
        name: row.try_get("name").map_err(ser)?,
        difficulty: parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?,
        time_limit_secs: time_limit_from_row(row)?,
        question_count: usize::try_from(count)
            .map_err(|_| StorageError::Serialization("question_count sign overflow".into()))?,
        category_id: row
            .try_get::<Option<i64>, _>("category_id")
            .map_err(ser)?
            .map(category_id_from_i64)
            .transpose()?,
    })
}
