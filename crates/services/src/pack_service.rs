use std::sync::Arc;

use quiz_core::model::{CategoryId, Difficulty, PackId, PackSummary, Question, QuestionPack};
use storage::repository::{PackRepository, StorageError};

use crate::Clock;
use crate::error::PackServiceError;

/// Editable pack settings, as shown in the pack options dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOptions {
    pub name: String,
    pub difficulty: Difficulty,
    pub time_limit_secs: u32,
    pub category_id: Option<CategoryId>,
}

impl PackOptions {
    #[must_use]
    pub fn of(pack: &QuestionPack) -> Self {
        Self {
            name: pack.name().to_owned(),
            difficulty: pack.difficulty(),
            time_limit_secs: pack.time_limit_secs(),
            category_id: pack.category_id(),
        }
    }
}

/// Pack and question editing.
///
/// Every mutating call loads the stored pack, applies one change and saves it
/// before returning; nothing is written implicitly.
#[derive(Clone)]
pub struct PackService {
    clock: Clock,
    packs: Arc<dyn PackRepository>,
}

impl PackService {
    #[must_use]
    pub fn new(clock: Clock, packs: Arc<dyn PackRepository>) -> Self {
        Self { clock, packs }
    }

    /// Create and persist an empty pack.
    ///
    /// # Errors
    ///
    /// Returns `PackServiceError::Validation` for an invalid name or time limit.
    /// Returns `PackServiceError::Storage` with `NameConflict` if the name is
    /// taken, or with `UnknownCategory` if the category is not stored.
    pub async fn create_pack(
        &self,
        name: impl Into<String>,
        difficulty: Difficulty,
        time_limit_secs: u32,
        category_id: Option<CategoryId>,
    ) -> Result<PackId, PackServiceError> {
        let mut pack = QuestionPack::new(name, difficulty, time_limit_secs, self.clock.now())?;
        pack.set_category(category_id);
        let id = self.packs.save_pack(&pack).await?;
        tracing::info!(pack = %pack.name(), %id, "created pack");
        Ok(id)
    }

    /// Persist a whole pack, inserting it when it has no id yet.
    ///
    /// # Errors
    ///
    /// Returns `PackServiceError::Validation` if the pack fails validation, or
    /// `PackServiceError::Storage` for name conflicts and backend failures.
    pub async fn save_pack(&self, pack: &QuestionPack) -> Result<PackId, PackServiceError> {
        pack.validate()?;
        Ok(self.packs.save_pack(pack).await?)
    }

    /// Fetch a pack by name. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PackServiceError::Storage` if repository access fails.
    pub async fn load_pack(&self, name: &str) -> Result<Option<QuestionPack>, PackServiceError> {
        Ok(self.packs.load_pack(name).await?)
    }

    /// # Errors
    ///
    /// Returns `PackServiceError::Storage` if repository access fails.
    pub async fn list_packs(&self) -> Result<Vec<PackSummary>, PackServiceError> {
        Ok(self.packs.list_packs().await?)
    }

    /// # Errors
    ///
    /// Returns `PackServiceError::Storage` if repository access fails.
    pub async fn pack_exists(&self, name: &str) -> Result<bool, PackServiceError> {
        Ok(self.packs.pack_exists(name).await?)
    }

    /// # Errors
    ///
    /// Returns `PackServiceError::Storage` with `NotFound` for an unknown name.
    pub async fn delete_pack(&self, name: &str) -> Result<(), PackServiceError> {
        self.packs.delete_pack(name).await?;
        tracing::info!(pack = %name, "deleted pack");
        Ok(())
    }

    /// Apply new options (possibly a rename) to a stored pack.
    ///
    /// # Errors
    ///
    /// Returns `PackServiceError::Validation` if the options are invalid and
    /// `PackServiceError::Storage` for unknown packs or name conflicts.
    pub async fn update_options(
        &self,
        name: &str,
        options: PackOptions,
    ) -> Result<(), PackServiceError> {
        let mut pack = self.require_pack(name).await?;
        pack.rename(options.name)?;
        pack.set_difficulty(options.difficulty);
        pack.set_time_limit_secs(options.time_limit_secs)?;
        pack.set_category(options.category_id);
        self.packs.save_pack(&pack).await?;
        Ok(())
    }

    /// Append a question and return its index.
    ///
    /// # Errors
    ///
    /// Returns `PackServiceError::Storage` for unknown packs or backend failures.
    pub async fn add_question(
        &self,
        pack_name: &str,
        question: Question,
    ) -> Result<usize, PackServiceError> {
        let mut pack = self.require_pack(pack_name).await?;
        pack.push_question(question);
        self.packs.save_pack(&pack).await?;
        Ok(pack.question_count() - 1)
    }

    /// # Errors
    ///
    /// Returns `PackServiceError::Validation` for an out-of-range index.
    pub async fn update_question(
        &self,
        pack_name: &str,
        index: usize,
        question: Question,
    ) -> Result<(), PackServiceError> {
        let mut pack = self.require_pack(pack_name).await?;
        pack.replace_question(index, question)?;
        self.packs.save_pack(&pack).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `PackServiceError::Validation` for an out-of-range index.
    pub async fn remove_question(
        &self,
        pack_name: &str,
        index: usize,
    ) -> Result<Question, PackServiceError> {
        let mut pack = self.require_pack(pack_name).await?;
        let removed = pack.remove_question(index)?;
        self.packs.save_pack(&pack).await?;
        Ok(removed)
    }

    /// Serialize a stored pack as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `PackServiceError::Storage` for unknown packs.
    pub async fn export_json(&self, name: &str) -> Result<String, PackServiceError> {
        let mut pack = self.require_pack(name).await?;
        pack.clear_id();
        Ok(serde_json::to_string_pretty(&pack)?)
    }

    /// Store a pack read from a JSON document as a new pack.
    ///
    /// Category ids are local to a store; a category the document names but
    /// this store lacks is dropped from the imported pack.
    ///
    /// # Errors
    ///
    /// Returns `PackServiceError::Document` for malformed JSON or invalid
    /// questions, `PackServiceError::Validation` for an invalid pack, and
    /// `PackServiceError::Storage` on name conflicts.
    pub async fn import_json(&self, json: &str) -> Result<PackId, PackServiceError> {
        let mut pack: QuestionPack = serde_json::from_str(json)?;
        pack.clear_id();
        match self.save_pack(&pack).await {
            Err(PackServiceError::Storage(StorageError::UnknownCategory { id })) => {
                tracing::warn!(
                    pack = %pack.name(),
                    category = %id,
                    "dropping unknown category on import"
                );
                pack.set_category(None);
                self.save_pack(&pack).await
            }
            saved => saved,
        }
    }

    async fn require_pack(&self, name: &str) -> Result<QuestionPack, PackServiceError> {
        self.packs
            .load_pack(name)
            .await?
            .ok_or(PackServiceError::Storage(StorageError::NotFound))
    }
}
