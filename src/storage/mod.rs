//! Storage abstraction for the catalog
//!
//! Each concern (films, users, catalogs, friendship edges, like edges) gets
//! its own trait so the services depend only on the operations they use.
//! Two backends implement the full set: [`MemoryBackend`] for tests and
//! standalone runs, [`PgBackend`] for the relational deployment. Backends are
//! picked at startup and injected as `Arc<dyn Trait>`.

use crate::error::AppResult;
use crate::models::{FilmDraft, FilmRecord, Genre, Mpa, User, UserDraft};

pub mod memory;
pub mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

/// Keyed store for film rows and their genre links
///
/// `create` and `update` write the film row and its genre set as one atomic
/// unit; callers never touch the genre junction directly. Genre labels are
/// not resolved here — rows carry catalog ids only.
#[async_trait::async_trait]
pub trait FilmStorage: Send + Sync {
    /// Inserts the draft and returns the assigned id. Ids start at 1 and
    /// increase monotonically.
    async fn create(&self, draft: &FilmDraft) -> AppResult<i64>;

    /// Full replace of the stored row; the genre set is cleared and
    /// reinserted. Fails with `NotFound` when the id is absent.
    async fn update(&self, id: i64, draft: &FilmDraft) -> AppResult<()>;

    async fn get(&self, id: i64) -> AppResult<Option<FilmRecord>>;

    /// All films ordered by id ascending.
    async fn list(&self) -> AppResult<Vec<FilmRecord>>;

    /// Genre ids of one film, in the order they were attached.
    async fn genre_ids_of(&self, id: i64) -> AppResult<Vec<i32>>;

    async fn contains(&self, id: i64) -> AppResult<bool>;

    /// Test-teardown bulk clear. Removes films together with their genre
    /// links and likes.
    async fn clear(&self) -> AppResult<()>;
}

/// Keyed store for user rows
#[async_trait::async_trait]
pub trait UserStorage: Send + Sync {
    /// Inserts the draft and returns the assigned id. The draft's display
    /// name must already be resolved (never blank) by the caller.
    async fn create(&self, draft: &UserDraft) -> AppResult<i64>;

    /// Full replace of the stored row. Fails with `NotFound` when the id is
    /// absent.
    async fn update(&self, user: &User) -> AppResult<()>;

    async fn get(&self, id: i64) -> AppResult<Option<User>>;

    /// All users ordered by id ascending.
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn contains(&self, id: i64) -> AppResult<bool>;

    /// Test-teardown bulk clear. Removes users together with their
    /// friendship edges and likes.
    async fn clear(&self) -> AppResult<()>;
}

/// Read-only genre lookup table, seeded at initialization
#[async_trait::async_trait]
pub trait GenreStorage: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<Option<Genre>>;

    /// All genres ordered by id ascending.
    async fn list(&self) -> AppResult<Vec<Genre>>;

    async fn contains(&self, id: i32) -> AppResult<bool>;
}

/// Read-only MPA rating lookup table, seeded at initialization
#[async_trait::async_trait]
pub trait MpaStorage: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<Option<Mpa>>;

    /// All rating tiers ordered by id ascending.
    async fn list(&self) -> AppResult<Vec<Mpa>>;

    async fn contains(&self, id: i32) -> AppResult<bool>;
}

/// One directed friendship edge with its reciprocation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendshipEdge {
    pub user_id: i64,
    pub friend_id: i64,
    /// True when the reverse edge also exists
    pub reciprocated: bool,
}

/// Directed edge store over user-id pairs
///
/// Mutuality is two independent edges; adding one direction never inserts
/// the other. User-id existence is the orchestration layer's concern.
#[async_trait::async_trait]
pub trait FriendshipStorage: Send + Sync {
    /// Inserts the directed edge. When the reverse edge already exists both
    /// edges are marked reciprocated. The caller must have ruled out
    /// duplicates and self-edges.
    async fn add(&self, user_id: i64, friend_id: i64) -> AppResult<()>;

    /// Removes the directed edge, downgrading a surviving reverse edge to
    /// unreciprocated. Returns false when no such edge exists.
    async fn remove(&self, user_id: i64, friend_id: i64) -> AppResult<bool>;

    /// Outgoing edge targets of a user, ordered by friend id ascending.
    async fn targets(&self, user_id: i64) -> AppResult<Vec<i64>>;

    async fn edge(&self, user_id: i64, friend_id: i64) -> AppResult<Option<FriendshipEdge>>;

    async fn contains(&self, user_id: i64, friend_id: i64) -> AppResult<bool>;

    async fn clear(&self) -> AppResult<()>;
}

/// Edge store over (film-id, user-id) pairs with per-film cardinality
#[async_trait::async_trait]
pub trait LikeStorage: Send + Sync {
    /// Records the like. The caller must have ruled out duplicates.
    async fn add(&self, film_id: i64, user_id: i64) -> AppResult<()>;

    /// Removes the like; returns false when it was not present.
    async fn remove(&self, film_id: i64, user_id: i64) -> AppResult<bool>;

    async fn is_liked(&self, film_id: i64, user_id: i64) -> AppResult<bool>;

    async fn count(&self, film_id: i64) -> AppResult<i64>;

    async fn clear(&self) -> AppResult<()>;
}
