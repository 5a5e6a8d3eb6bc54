use quiz_core::model::{Category, CategoryId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{category_id_from_i64, category_id_to_i64, conn, is_unique_violation, ser};
use crate::repository::{CategoryRepository, StorageError};

#[async_trait::async_trait]
impl CategoryRepository for SqliteRepository {
    async fn save_category(&self, category: &Category) -> Result<CategoryId, StorageError> {
        let conflict = |e: sqlx::Error| {
            if is_unique_violation(&e) {
                StorageError::NameConflict {
                    name: category.name().to_owned(),
                }
            } else {
                conn(e)
            }
        };

        match category.id() {
            None => {
                let res = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
                    .bind(category.name())
                    .execute(&self.pool)
                    .await
                    .map_err(conflict)?;
                category_id_from_i64(res.last_insert_rowid())
            }
            Some(id) => {
                let res = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
                    .bind(category_id_to_i64(id)?)
                    .bind(category.name())
                    .execute(&self.pool)
                    .await
                    .map_err(conflict)?;
                if res.rows_affected() == 0 {
                    return Err(StorageError::NotFound);
                }
                Ok(id)
            }
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let id = category_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
                Category::from_persisted(id, row.try_get("name").map_err(ser)?).map_err(ser)
            })
            .collect()
    }
}
