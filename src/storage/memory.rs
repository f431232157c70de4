use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::{FilmDraft, FilmRecord, Genre, Mpa, User, UserDraft};

use super::{
    FilmStorage, FriendshipEdge, FriendshipStorage, GenreStorage, LikeStorage, MpaStorage,
    UserStorage,
};

#[derive(Debug, Clone)]
struct Edge {
    friend_id: i64,
    reciprocated: bool,
}

#[derive(Default)]
struct MemoryState {
    films: HashMap<i64, FilmRecord>,
    /// Genre ids per film, in attachment order
    film_genres: HashMap<i64, Vec<i32>>,
    users: HashMap<i64, User>,
    /// Outgoing friendship edges per user, in insertion order
    friendships: HashMap<i64, Vec<Edge>>,
    /// Liking user ids per film
    likes: HashMap<i64, Vec<i64>>,
    next_film_id: i64,
    next_user_id: i64,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            next_film_id: 1,
            next_user_id: 1,
            ..Self::default()
        }
    }

    fn edge_mut(&mut self, user_id: i64, friend_id: i64) -> Option<&mut Edge> {
        self.friendships
            .get_mut(&user_id)?
            .iter_mut()
            .find(|e| e.friend_id == friend_id)
    }
}

/// Ephemeral backend holding everything in process memory.
///
/// Ids are handed out under the state lock, so concurrent creators never
/// collide. Unlike the relational backend, `clear()` resets the id counters.
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    genres: BTreeMap<i32, Genre>,
    mpa: BTreeMap<i32, Mpa>,
}

impl MemoryBackend {
    /// Creates an empty backend with the standard catalog seed data.
    pub fn new() -> Self {
        let genres = [
            "Comedy",
            "Drama",
            "Cartoon",
            "Thriller",
            "Documentary",
            "Action",
        ]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let id = i as i32 + 1;
            (
                id,
                Genre {
                    id,
                    name: name.to_string(),
                },
            )
        })
        .collect();

        let mpa = ["G", "PG", "PG-13", "R", "NC-17"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let id = i as i32 + 1;
                (
                    id,
                    Mpa {
                        id,
                        name: name.to_string(),
                    },
                )
            })
            .collect();

        Self {
            state: RwLock::new(MemoryState::new()),
            genres,
            mpa,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FilmStorage for MemoryBackend {
    async fn create(&self, draft: &FilmDraft) -> AppResult<i64> {
        let mut state = self.state.write().await;
        let id = state.next_film_id;
        state.next_film_id += 1;
        state.films.insert(
            id,
            FilmRecord {
                id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                release_date: draft.release_date,
                duration: draft.duration,
                mpa_id: draft.mpa_id,
            },
        );
        state.film_genres.insert(id, draft.genre_ids.clone());
        Ok(id)
    }

    async fn update(&self, id: i64, draft: &FilmDraft) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.films.contains_key(&id) {
            return Err(crate::error::AppError::NotFound(format!(
                "film with id {id} not found"
            )));
        }
        state.films.insert(
            id,
            FilmRecord {
                id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                release_date: draft.release_date,
                duration: draft.duration,
                mpa_id: draft.mpa_id,
            },
        );
        state.film_genres.insert(id, draft.genre_ids.clone());
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Option<FilmRecord>> {
        Ok(self.state.read().await.films.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<FilmRecord>> {
        let state = self.state.read().await;
        let mut films: Vec<FilmRecord> = state.films.values().cloned().collect();
        films.sort_by_key(|f| f.id);
        Ok(films)
    }

    async fn genre_ids_of(&self, id: i64) -> AppResult<Vec<i32>> {
        let state = self.state.read().await;
        Ok(state.film_genres.get(&id).cloned().unwrap_or_default())
    }

    async fn contains(&self, id: i64) -> AppResult<bool> {
        Ok(self.state.read().await.films.contains_key(&id))
    }

    async fn clear(&self) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.films.clear();
        state.film_genres.clear();
        state.likes.clear();
        state.next_film_id = 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserStorage for MemoryBackend {
    async fn create(&self, draft: &UserDraft) -> AppResult<i64> {
        let mut state = self.state.write().await;
        let id = state.next_user_id;
        state.next_user_id += 1;
        state.users.insert(
            id,
            User {
                id,
                email: draft.email.clone(),
                login: draft.login.clone(),
                name: draft.name.clone().unwrap_or_else(|| draft.login.clone()),
                birthday: draft.birthday,
            },
        );
        Ok(id)
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(crate::error::AppError::NotFound(format!(
                "user with id {} not found",
                user.id
            )));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn contains(&self, id: i64) -> AppResult<bool> {
        Ok(self.state.read().await.users.contains_key(&id))
    }

    async fn clear(&self) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.users.clear();
        state.friendships.clear();
        state.likes.clear();
        state.next_user_id = 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl GenreStorage for MemoryBackend {
    async fn get(&self, id: i32) -> AppResult<Option<Genre>> {
        Ok(self.genres.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Genre>> {
        Ok(self.genres.values().cloned().collect())
    }

    async fn contains(&self, id: i32) -> AppResult<bool> {
        Ok(self.genres.contains_key(&id))
    }
}

#[async_trait::async_trait]
impl MpaStorage for MemoryBackend {
    async fn get(&self, id: i32) -> AppResult<Option<Mpa>> {
        Ok(self.mpa.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Mpa>> {
        Ok(self.mpa.values().cloned().collect())
    }

    async fn contains(&self, id: i32) -> AppResult<bool> {
        Ok(self.mpa.contains_key(&id))
    }
}

#[async_trait::async_trait]
impl FriendshipStorage for MemoryBackend {
    async fn add(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        let reciprocated = match state.edge_mut(friend_id, user_id) {
            Some(reverse) => {
                reverse.reciprocated = true;
                true
            }
            None => false,
        };
        state.friendships.entry(user_id).or_default().push(Edge {
            friend_id,
            reciprocated,
        });
        Ok(())
    }

    async fn remove(&self, user_id: i64, friend_id: i64) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(edges) = state.friendships.get_mut(&user_id) else {
            return Ok(false);
        };
        let Some(pos) = edges.iter().position(|e| e.friend_id == friend_id) else {
            return Ok(false);
        };
        let removed = edges.remove(pos);
        if removed.reciprocated {
            if let Some(reverse) = state.edge_mut(friend_id, user_id) {
                reverse.reciprocated = false;
            }
        }
        Ok(true)
    }

    async fn targets(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let state = self.state.read().await;
        let mut targets: Vec<i64> = state
            .friendships
            .get(&user_id)
            .map(|edges| edges.iter().map(|e| e.friend_id).collect())
            .unwrap_or_default();
        targets.sort_unstable();
        Ok(targets)
    }

    async fn edge(&self, user_id: i64, friend_id: i64) -> AppResult<Option<FriendshipEdge>> {
        let state = self.state.read().await;
        Ok(state
            .friendships
            .get(&user_id)
            .and_then(|edges| edges.iter().find(|e| e.friend_id == friend_id))
            .map(|e| FriendshipEdge {
                user_id,
                friend_id,
                reciprocated: e.reciprocated,
            }))
    }

    async fn contains(&self, user_id: i64, friend_id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .friendships
            .get(&user_id)
            .is_some_and(|edges| edges.iter().any(|e| e.friend_id == friend_id)))
    }

    async fn clear(&self) -> AppResult<()> {
        self.state.write().await.friendships.clear();
        Ok(())
    }
}

#[async_trait::async_trait]
impl LikeStorage for MemoryBackend {
    async fn add(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.likes.entry(film_id).or_default().push(user_id);
        Ok(())
    }

    async fn remove(&self, film_id: i64, user_id: i64) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(users) = state.likes.get_mut(&film_id) else {
            return Ok(false);
        };
        let Some(pos) = users.iter().position(|u| *u == user_id) else {
            return Ok(false);
        };
        users.remove(pos);
        Ok(true)
    }

    async fn is_liked(&self, film_id: i64, user_id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .likes
            .get(&film_id)
            .is_some_and(|users| users.contains(&user_id)))
    }

    async fn count(&self, film_id: i64) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.likes.get(&film_id).map_or(0, |users| users.len() as i64))
    }

    async fn clear(&self) -> AppResult<()> {
        self.state.write().await.likes.clear();
        Ok(())
    }
}
