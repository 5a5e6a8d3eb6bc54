use std::sync::Arc;

use quiz_core::model::{Category, CategoryId};
use storage::repository::CategoryRepository;

use crate::error::CategoryServiceError;

/// Creates and lists pack categories.
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    #[must_use]
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// # Errors
    ///
    /// Returns `CategoryServiceError::Category` for a blank name and
    /// `CategoryServiceError::Storage` for duplicates or backend failures.
    pub async fn create_category(
        &self,
        name: impl Into<String>,
    ) -> Result<CategoryId, CategoryServiceError> {
        let category = Category::new(name)?;
        Ok(self.categories.save_category(&category).await?)
    }

    /// # Errors
    ///
    /// Returns `CategoryServiceError::Storage` if repository access fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.categories.list_categories().await?)
    }

    /// Looks a category up by name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryServiceError::Storage` if repository access fails.
    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, CategoryServiceError> {
        let categories = self.categories.list_categories().await?;
        Ok(categories.into_iter().find(|c| c.name() == name.trim()))
    }
}
