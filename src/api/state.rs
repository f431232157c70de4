use std::sync::Arc;

use sqlx::PgPool;

use crate::services::{FilmService, UserService};
use crate::storage::{MemoryBackend, PgBackend};

/// Shared application state: the two orchestration services wired to one
/// storage backend
#[derive(Clone)]
pub struct AppState {
    pub films: FilmService,
    pub users: UserService,
}

impl AppState {
    /// Wires the services to the ephemeral in-memory backend.
    pub fn in_memory() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        Self::assemble(backend)
    }

    /// Wires the services to the PostgreSQL backend.
    pub fn postgres(pool: PgPool) -> Self {
        let backend = Arc::new(PgBackend::new(pool));
        Self::assemble(backend)
    }

    fn assemble<B>(backend: Arc<B>) -> Self
    where
        B: crate::storage::FilmStorage
            + crate::storage::UserStorage
            + crate::storage::GenreStorage
            + crate::storage::MpaStorage
            + crate::storage::LikeStorage
            + crate::storage::FriendshipStorage
            + 'static,
    {
        Self {
            films: FilmService::new(
                backend.clone(),
                backend.clone(),
                backend.clone(),
                backend.clone(),
                backend.clone(),
            ),
            users: UserService::new(backend.clone(), backend),
        }
    }
}
