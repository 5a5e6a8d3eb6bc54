use async_trait::async_trait;
use quiz_core::model::{Category, CategoryId, PackId, PackSummary, QuestionPack};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("name already in use: {name}")]
    NameConflict { name: String },

    /// A pack refers to a category that is not stored.
    #[error("unknown category: {id}")]
    UnknownCategory { id: CategoryId },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for question packs.
///
/// Packs are addressed by their unique name; the numeric id is assigned on
/// first save and used to detect renames.
#[async_trait]
pub trait PackRepository: Send + Sync {
    /// Insert a new pack (no id) or update the stored pack with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NameConflict` if another pack already uses the
    /// name, `StorageError::UnknownCategory` if its category is not stored,
    /// `StorageError::NotFound` if the pack carries an id that is not stored,
    /// or other storage errors.
    async fn save_pack(&self, pack: &QuestionPack) -> Result<PackId, StorageError>;

    /// Fetch a pack by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn load_pack(&self, name: &str) -> Result<Option<QuestionPack>, StorageError>;

    /// List all packs ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn list_packs(&self) -> Result<Vec<PackSummary>, StorageError>;

    /// Delete a pack by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no pack has this name.
    async fn delete_pack(&self, name: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn pack_exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.load_pack(name).await?.is_some())
    }
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a new category or rename an existing one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NameConflict` for a duplicate name.
    async fn save_category(&self, category: &Category) -> Result<CategoryId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn list_categories(&self) -> Result<Vec<Category>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    next_pack_id: u64,
    next_category_id: u64,
    packs: BTreeMap<PackId, QuestionPack>,
    categories: BTreeMap<CategoryId, Category>,
}

/// In-memory repository used by tests and as the fallback store when the
/// database cannot be opened.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl PackRepository for InMemoryRepository {
    async fn save_pack(&self, pack: &QuestionPack) -> Result<PackId, StorageError> {
        let mut guard = self.lock()?;

        let clash = guard
            .packs
            .values()
            .any(|p| p.name() == pack.name() && p.id() != pack.id());
        if clash {
            return Err(StorageError::NameConflict {
                name: pack.name().to_owned(),
            });
        }
        if let Some(id) = pack
            .category_id()
            .filter(|id| !guard.categories.contains_key(id))
        {
            return Err(StorageError::UnknownCategory { id });
        }

        let id = match pack.id() {
            Some(id) if guard.packs.contains_key(&id) => id,
            Some(_) => return Err(StorageError::NotFound),
            None => {
                guard.next_pack_id += 1;
                PackId::new(guard.next_pack_id)
            }
        };

        let mut stored = pack.clone();
        stored.assign_id(id);
        guard.packs.insert(id, stored);
        Ok(id)
    }

    async fn load_pack(&self, name: &str) -> Result<Option<QuestionPack>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.packs.values().find(|p| p.name() == name).cloned())
    }

    async fn list_packs(&self) -> Result<Vec<PackSummary>, StorageError> {
        let guard = self.lock()?;
        let mut summaries: Vec<PackSummary> =
            guard.packs.values().map(QuestionPack::summary).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn delete_pack(&self, name: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let id = guard
            .packs
            .values()
            .find(|p| p.name() == name)
            .and_then(QuestionPack::id)
            .ok_or(StorageError::NotFound)?;
        guard.packs.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository {
    async fn save_category(&self, category: &Category) -> Result<CategoryId, StorageError> {
        let mut guard = self.lock()?;

        let clash = guard
            .categories
            .values()
            .any(|c| c.name() == category.name() && c.id() != category.id());
        if clash {
            return Err(StorageError::NameConflict {
                name: category.name().to_owned(),
            });
        }

        let id = match category.id() {
            Some(id) if guard.categories.contains_key(&id) => id,
            Some(_) => return Err(StorageError::NotFound),
            None => {
                guard.next_category_id += 1;
                CategoryId::new(guard.next_category_id)
            }
        };

        let mut stored = category.clone();
        stored.assign_id(id);
        guard.categories.insert(id, stored);
        Ok(id)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let guard = self.lock()?;
        let mut categories: Vec<Category> = guard.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub packs: Arc<dyn PackRepository>,
    pub categories: Arc<dyn CategoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let packs: Arc<dyn PackRepository> = Arc::new(repo.clone());
        let categories: Arc<dyn CategoryRepository> = Arc::new(repo);
        Self { packs, categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, Question};
    use quiz_core::time::fixed_now;

    fn build_pack(name: &str, questions: u32) -> QuestionPack {
        let mut pack = QuestionPack::new(name, Difficulty::Medium, 30, fixed_now()).unwrap();
        for n in 0..questions {
            pack.push_question(
                Question::new(format!("Q{n}"), "yes", ["no", "maybe", "never"]).unwrap(),
            );
        }
        pack
    }

    #[tokio::test]
    async fn save_assigns_ids_and_loads_by_name() {
        let repo = InMemoryRepository::new();
        let first = repo.save_pack(&build_pack("Alpha", 2)).await.unwrap();
        let second = repo.save_pack(&build_pack("Beta", 0)).await.unwrap();
        assert_ne!(first, second);

        let loaded = repo.load_pack("Alpha").await.unwrap().unwrap();
        assert_eq!(loaded.id(), Some(first));
        assert_eq!(loaded.question_count(), 2);
        assert!(repo.load_pack("Gamma").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn new_pack_with_taken_name_conflicts() {
        let repo = InMemoryRepository::new();
        repo.save_pack(&build_pack("Alpha", 0)).await.unwrap();
        let err = repo.save_pack(&build_pack("Alpha", 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::NameConflict { name } if name == "Alpha"));
    }

    #[tokio::test]
    async fn update_keeps_id_and_allows_rename() {
        let repo = InMemoryRepository::new();
        let id = repo.save_pack(&build_pack("Alpha", 0)).await.unwrap();

        let mut pack = repo.load_pack("Alpha").await.unwrap().unwrap();
        pack.rename("Renamed").unwrap();
        pack.push_question(Question::new("q", "a", ["b", "c", "d"]).unwrap());
        assert_eq!(repo.save_pack(&pack).await.unwrap(), id);

        assert!(repo.load_pack("Alpha").await.unwrap().is_none());
        let renamed = repo.load_pack("Renamed").await.unwrap().unwrap();
        assert_eq!(renamed.question_count(), 1);
    }

    #[tokio::test]
    async fn rename_onto_other_pack_conflicts() {
        let repo = InMemoryRepository::new();
        repo.save_pack(&build_pack("Alpha", 0)).await.unwrap();
        repo.save_pack(&build_pack("Beta", 0)).await.unwrap();

        let mut beta = repo.load_pack("Beta").await.unwrap().unwrap();
        beta.rename("Alpha").unwrap();
        let err = repo.save_pack(&beta).await.unwrap_err();
        assert!(matches!(err, StorageError::NameConflict { .. }));
    }

    #[tokio::test]
    async fn delete_missing_pack_is_not_found() {
        let repo = InMemoryRepository::new();
        repo.save_pack(&build_pack("Alpha", 0)).await.unwrap();
        repo.delete_pack("Alpha").await.unwrap();
        assert!(!repo.pack_exists("Alpha").await.unwrap());
        assert!(matches!(
            repo.delete_pack("Alpha").await.unwrap_err(),
            StorageError::NotFound
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let repo = InMemoryRepository::new();
        repo.save_pack(&build_pack("Zoology", 1)).await.unwrap();
        repo.save_pack(&build_pack("Art", 3)).await.unwrap();

        let list = repo.list_packs().await.unwrap();
        let names: Vec<&str> = list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Art", "Zoology"]);
        assert_eq!(list[0].question_count, 3);
    }

    #[tokio::test]
    async fn pack_with_unknown_category_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut pack = build_pack("Alpha", 1);
        pack.set_category(Some(CategoryId::new(99)));
        let err = repo.save_pack(&pack).await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownCategory { id } if id == CategoryId::new(99)));
        assert!(!repo.pack_exists("Alpha").await.unwrap());

        let known = repo
            .save_category(&Category::new("Science").unwrap())
            .await
            .unwrap();
        pack.set_category(Some(known));
        repo.save_pack(&pack).await.unwrap();
    }

    #[tokio::test]
    async fn categories_list_in_name_order() {
        let repo = InMemoryRepository::new();
        for name in ["Zoology", "Art", "Music"] {
            repo.save_category(&Category::new(name).unwrap())
                .await
                .unwrap();
        }
        let names: Vec<String> = repo
            .list_categories()
            .await
            .unwrap()
            .iter()
            .map(|c| c.name().to_owned())
            .collect();
        assert_eq!(names, vec!["Art", "Music", "Zoology"]);
    }

    #[tokio::test]
    async fn categories_are_unique_by_name() {
        let repo = InMemoryRepository::new();
        repo.save_category(&Category::new("Science").unwrap())
            .await
            .unwrap();
        let err = repo
            .save_category(&Category::new("Science").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NameConflict { .. }));
        assert_eq!(repo.list_categories().await.unwrap().len(), 1);
    }
}
