use std::sync::Arc;

use storage::repository::{Storage, StorageError};

use crate::Clock;
use crate::category_service::CategoryService;
use crate::default_pack::{DEFAULT_PACK_NAME, default_pack};
use crate::error::{AppServicesError, PackServiceError};
use crate::pack_service::PackService;
use crate::sessions::{PlayerOptions, QuizPlayer};

/// Where the assembled services keep their packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    /// Nothing survives the process; used when the database cannot be opened.
    InMemory,
}

/// Assembles app-facing services and makes sure a playable pack exists.
#[derive(Clone)]
pub struct AppServices {
    backend: Backend,
    seeded_default: bool,
    packs: Arc<PackService>,
    categories: Arc<CategoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or default pack
    /// setup fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::assemble(storage, clock, Backend::Sqlite).await
    }

    /// Build services over a fresh in-memory store holding the default pack.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the default pack cannot be stored.
    pub async fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::assemble(Storage::in_memory(), clock, Backend::InMemory).await
    }

    /// Open the database, or fall back to the in-memory store if it cannot be
    /// opened.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for failures other than opening the database.
    pub async fn connect_or_fallback(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        match Self::new_sqlite(db_url, clock).await {
            Err(AppServicesError::Sqlite(err)) => {
                tracing::warn!(%err, db_url, "database unavailable, using in-memory store");
                Self::in_memory(clock).await
            }
            other => other,
        }
    }

    async fn assemble(
        storage: Storage,
        clock: Clock,
        backend: Backend,
    ) -> Result<Self, AppServicesError> {
        let packs = Arc::new(PackService::new(clock, Arc::clone(&storage.packs)));
        let categories = Arc::new(CategoryService::new(Arc::clone(&storage.categories)));
        let seeded_default = ensure_default_pack(&packs, clock).await?;

        Ok(Self {
            backend,
            seeded_default,
            packs,
            categories,
        })
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Whether startup found no packs and stored the default one.
    #[must_use]
    pub fn seeded_default(&self) -> bool {
        self.seeded_default
    }

    #[must_use]
    pub fn pack_service(&self) -> Arc<PackService> {
        Arc::clone(&self.packs)
    }

    #[must_use]
    pub fn category_service(&self) -> Arc<CategoryService> {
        Arc::clone(&self.categories)
    }

    /// Store the default pack unless a pack with its name already exists.
    /// Returns `true` if it was stored.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the pack cannot be built or stored.
    pub async fn seed_default_pack(&self, clock: Clock) -> Result<bool, AppServicesError> {
        if self.packs.pack_exists(DEFAULT_PACK_NAME).await? {
            return Ok(false);
        }
        self.packs.save_pack(&default_pack(clock.now())?).await?;
        Ok(true)
    }

    /// Load `pack_name` and start playing it on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Pack` with `NotFound` for an unknown pack and
    /// `AppServicesError::Session` if the pack cannot be played.
    pub async fn start_quiz(
        &self,
        pack_name: &str,
        options: PlayerOptions,
    ) -> Result<QuizPlayer, AppServicesError> {
        let pack = self
            .packs
            .load_pack(pack_name)
            .await?
            .ok_or(PackServiceError::Storage(StorageError::NotFound))?;
        let player = QuizPlayer::current(options)?;
        player.start(&pack)?;
        Ok(player)
    }
}

async fn ensure_default_pack(packs: &PackService, clock: Clock) -> Result<bool, AppServicesError> {
    if !packs.list_packs().await?.is_empty() {
        return Ok(false);
    }
    let pack = default_pack(clock.now())?;
    packs.save_pack(&pack).await?;
    tracing::info!(pack = DEFAULT_PACK_NAME, "stored default pack");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;
    use crate::sessions::SessionState;
    use quiz_core::model::Difficulty;
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn in_memory_starts_with_default_pack() {
        let services = AppServices::in_memory(fixed_clock()).await.unwrap();
        assert_eq!(services.backend(), Backend::InMemory);
        assert!(services.seeded_default());

        let packs = services.pack_service().list_packs().await.unwrap();
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].name, DEFAULT_PACK_NAME);
        assert!(!services.seed_default_pack(fixed_clock()).await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_database_falls_back_to_memory() {
        let services = AppServices::connect_or_fallback(
            "sqlite:///nonexistent-dir/definitely/missing.sqlite3",
            fixed_clock(),
        )
        .await
        .unwrap();
        assert_eq!(services.backend(), Backend::InMemory);
        assert!(services.pack_service().pack_exists(DEFAULT_PACK_NAME).await.unwrap());
    }

    #[tokio::test]
    async fn start_quiz_plays_stored_pack() {
        let services = AppServices::in_memory(fixed_clock()).await.unwrap();
        let player = services
            .start_quiz(DEFAULT_PACK_NAME, PlayerOptions::default())
            .await
            .unwrap();
        let snapshot = player.snapshot();
        assert_eq!(snapshot.state, SessionState::ShowingQuestion);
        assert_eq!(snapshot.pack_name.as_deref(), Some(DEFAULT_PACK_NAME));
        assert_eq!(snapshot.options.len(), 4);
        player.end();
    }

    #[tokio::test]
    async fn start_quiz_reports_missing_and_empty_packs() {
        let services = AppServices::in_memory(fixed_clock()).await.unwrap();
        assert!(matches!(
            services
                .start_quiz("Nope", PlayerOptions::default())
                .await
                .err(),
            Some(AppServicesError::Pack(PackServiceError::Storage(
                StorageError::NotFound
            )))
        ));

        services
            .pack_service()
            .create_pack("Empty", Difficulty::Easy, 10, None)
            .await
            .unwrap();
        assert!(matches!(
            services
                .start_quiz("Empty", PlayerOptions::default())
                .await
                .err(),
            Some(AppServicesError::Session(SessionError::EmptyPack))
        ));
    }
}
