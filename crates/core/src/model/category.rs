use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CategoryId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,
}

/// A named grouping for packs. Names are unique within a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: Option<CategoryId>,
    name: String,
}

impl Category {
    /// Create an unsaved category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` if the name is empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, CategoryError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        Ok(Self {
            id: None,
            name: trimmed.to_owned(),
        })
    }

    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` if the stored name is blank.
    pub fn from_persisted(id: CategoryId, name: String) -> Result<Self, CategoryError> {
        let mut category = Self::new(name)?;
        category.id = Some(id);
        Ok(category)
    }

    #[must_use]
    pub fn id(&self) -> Option<CategoryId> {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assign_id(&mut self, id: CategoryId) {
        self.id = Some(id);
    }
}
