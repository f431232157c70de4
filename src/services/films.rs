use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::models::{Film, FilmDraft, FilmRecord, Genre, Mpa};
use crate::storage::{FilmStorage, GenreStorage, LikeStorage, MpaStorage, UserStorage};

/// Earliest acceptable release date: the first public film screening.
const CINEMA_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1895, 12, 28) {
    Some(date) => date,
    None => panic!("invalid cinema epoch"),
};

const DEFAULT_POPULAR_COUNT: i64 = 10;

/// Film orchestration: validation, catalog reference checks, like edges and
/// popularity ranking. Every film leaving this service has its rating label
/// and genre set resolved.
#[derive(Clone)]
pub struct FilmService {
    films: Arc<dyn FilmStorage>,
    users: Arc<dyn UserStorage>,
    genres: Arc<dyn GenreStorage>,
    mpa: Arc<dyn MpaStorage>,
    likes: Arc<dyn LikeStorage>,
}

impl FilmService {
    pub fn new(
        films: Arc<dyn FilmStorage>,
        users: Arc<dyn UserStorage>,
        genres: Arc<dyn GenreStorage>,
        mpa: Arc<dyn MpaStorage>,
        likes: Arc<dyn LikeStorage>,
    ) -> Self {
        Self {
            films,
            users,
            genres,
            mpa,
            likes,
        }
    }

    pub async fn create_film(&self, mut draft: FilmDraft) -> AppResult<Film> {
        tracing::debug!(name = %draft.name, "create_film");
        validate(&draft)?;
        self.check_references(&draft).await?;
        dedupe_genres(&mut draft);
        let id = self.films.create(&draft).await?;
        self.get_film(id).await
    }

    pub async fn update_film(&self, id: i64, mut draft: FilmDraft) -> AppResult<Film> {
        tracing::debug!(id, "update_film");
        if !self.films.contains(id).await? {
            return Err(AppError::NotFound(format!("film with id {id} not found")));
        }
        validate(&draft)?;
        self.check_references(&draft).await?;
        dedupe_genres(&mut draft);
        self.films.update(id, &draft).await?;
        self.get_film(id).await
    }

    pub async fn get_film(&self, id: i64) -> AppResult<Film> {
        let record = self
            .films
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("film with id {id} not found")))?;
        self.resolve(record).await
    }

    pub async fn list_films(&self) -> AppResult<Vec<Film>> {
        let records = self.films.list().await?;
        let mut films = Vec::with_capacity(records.len());
        for record in records {
            films.push(self.resolve(record).await?);
        }
        Ok(films)
    }

    /// Films ordered by descending like count, ties broken by ascending id.
    pub async fn popular_films(&self, count: Option<i64>) -> AppResult<Vec<Film>> {
        let count = count.unwrap_or(DEFAULT_POPULAR_COUNT);
        if count <= 0 {
            return Err(AppError::Validation(
                "popular film count must be positive".to_string(),
            ));
        }
        tracing::debug!(count, "popular_films");

        let records = self.films.list().await?;
        let mut scored = Vec::with_capacity(records.len());
        for record in records {
            let likes = self.likes.count(record.id).await?;
            scored.push((record, likes));
        }
        scored.sort_by(|(a, a_likes), (b, b_likes)| {
            b_likes.cmp(a_likes).then(a.id.cmp(&b.id))
        });
        scored.truncate(count as usize);

        let mut films = Vec::with_capacity(scored.len());
        for (record, _) in scored {
            films.push(self.resolve(record).await?);
        }
        Ok(films)
    }

    pub async fn like_film(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        tracing::debug!(film_id, user_id, "like_film");
        self.ensure_film_and_user(film_id, user_id).await?;
        if self.likes.is_liked(film_id, user_id).await? {
            return Err(AppError::AlreadyExists(format!(
                "user {user_id} already liked film {film_id}"
            )));
        }
        self.likes.add(film_id, user_id).await
    }

    pub async fn unlike_film(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        tracing::debug!(film_id, user_id, "unlike_film");
        self.ensure_film_and_user(film_id, user_id).await?;
        if !self.likes.remove(film_id, user_id).await? {
            return Err(AppError::NotFound(format!(
                "user {user_id} has not liked film {film_id}"
            )));
        }
        Ok(())
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.genres
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("genre with id {id} not found")))
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.genres.list().await
    }

    pub async fn get_mpa(&self, id: i32) -> AppResult<Mpa> {
        self.mpa
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("mpa rating with id {id} not found")))
    }

    pub async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        self.mpa.list().await
    }

    /// Expands a stored row into the resolved view. A dangling catalog
    /// reference here means the referential invariant was broken at write
    /// time, so it surfaces as an internal error rather than NotFound.
    async fn resolve(&self, record: FilmRecord) -> AppResult<Film> {
        let mpa = self.mpa.get(record.mpa_id).await?.ok_or_else(|| {
            AppError::Internal(format!("mpa id {} missing from catalog", record.mpa_id))
        })?;

        let genre_ids = self.films.genre_ids_of(record.id).await?;
        let mut genres = Vec::with_capacity(genre_ids.len());
        for genre_id in genre_ids {
            let genre = self.genres.get(genre_id).await?.ok_or_else(|| {
                AppError::Internal(format!("genre id {genre_id} missing from catalog"))
            })?;
            genres.push(genre);
        }

        Ok(Film {
            id: record.id,
            name: record.name,
            description: record.description,
            release_date: record.release_date,
            duration: record.duration,
            mpa,
            genres,
        })
    }

    async fn check_references(&self, draft: &FilmDraft) -> AppResult<()> {
        if !self.mpa.contains(draft.mpa_id).await? {
            return Err(AppError::Validation(format!(
                "unknown mpa rating id {}",
                draft.mpa_id
            )));
        }
        for genre_id in &draft.genre_ids {
            if !self.genres.contains(*genre_id).await? {
                return Err(AppError::Validation(format!("unknown genre id {genre_id}")));
            }
        }
        Ok(())
    }

    async fn ensure_film_and_user(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        if !self.films.contains(film_id).await? {
            return Err(AppError::NotFound(format!(
                "film with id {film_id} not found"
            )));
        }
        if !self.users.contains(user_id).await? {
            return Err(AppError::NotFound(format!(
                "user with id {user_id} not found"
            )));
        }
        Ok(())
    }
}

fn validate(draft: &FilmDraft) -> AppResult<()> {
    if draft.name.trim().is_empty() {
        return Err(AppError::Validation("film name must not be blank".to_string()));
    }
    let description_len = draft.description.chars().count();
    if description_len == 0 || description_len > 200 {
        return Err(AppError::Validation(
            "film description must be 1 to 200 characters".to_string(),
        ));
    }
    if draft.release_date < CINEMA_EPOCH {
        return Err(AppError::Validation(format!(
            "release date must not be before {CINEMA_EPOCH}"
        )));
    }
    if draft.duration <= 0 {
        return Err(AppError::Validation(
            "film duration must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Drops repeated genre references, keeping the first occurrence.
fn dedupe_genres(draft: &mut FilmDraft) {
    let mut seen = HashSet::new();
    draft.genre_ids.retain(|id| seen.insert(*id));
}

#[cfg(test)]
mod tests {
    use crate::models::UserDraft;
    use crate::storage::{MemoryBackend, UserStorage};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service() -> (FilmService, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let service = FilmService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
        );
        (service, backend)
    }

    fn draft(name: &str) -> FilmDraft {
        FilmDraft {
            name: name.to_string(),
            description: "a film".to_string(),
            release_date: date(2000, 1, 1),
            duration: 100,
            mpa_id: 1,
            genre_ids: vec![],
        }
    }

    async fn register_user(backend: &MemoryBackend, login: &str) -> i64 {
        UserStorage::create(
            backend,
            &UserDraft {
                email: format!("{login}@example.com"),
                login: login.to_string(),
                name: None,
                birthday: date(1990, 5, 1),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_created_film_comes_back_resolved() {
        let (service, _) = service();
        let mut input = draft("The Matrix");
        input.mpa_id = 4;
        input.genre_ids = vec![6, 1, 6];

        let film = service.create_film(input).await.unwrap();
        assert_eq!(film.id, 1);
        assert_eq!(film.mpa.name, "R");
        // duplicate reference dropped, first-occurrence order kept
        let genre_names: Vec<&str> = film.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genre_names, vec!["Action", "Comedy"]);

        let fetched = service.get_film(film.id).await.unwrap();
        assert_eq!(fetched, film);
    }

    #[tokio::test]
    async fn test_release_date_floor_is_exact() {
        let (service, _) = service();

        let mut too_early = draft("Before Cinema");
        too_early.release_date = date(1895, 12, 27);
        let err = service.create_film(too_early).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut first_day = draft("First Screening");
        first_day.release_date = date(1895, 12, 28);
        assert!(service.create_film(first_day).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_catalog_references_are_rejected() {
        let (service, _) = service();

        let mut bad_mpa = draft("Bad Rating");
        bad_mpa.mpa_id = 99;
        assert!(matches!(
            service.create_film(bad_mpa).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut bad_genre = draft("Bad Genre");
        bad_genre.genre_ids = vec![1, 42];
        assert!(matches!(
            service.create_film(bad_genre).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_description_length_bounds() {
        let (service, _) = service();

        let mut empty = draft("No Description");
        empty.description = String::new();
        assert!(matches!(
            service.create_film(empty).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut at_limit = draft("Long Description");
        at_limit.description = "x".repeat(200);
        assert!(service.create_film(at_limit).await.is_ok());

        let mut over_limit = draft("Too Long");
        over_limit.description = "x".repeat(201);
        assert!(matches!(
            service.create_film(over_limit).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_the_genre_set() {
        let (service, _) = service();
        let mut input = draft("Mutable");
        input.genre_ids = vec![1, 2];
        let film = service.create_film(input).await.unwrap();

        let mut replacement = draft("Mutable");
        replacement.genre_ids = vec![5];
        let updated = service.update_film(film.id, replacement).await.unwrap();
        let genre_names: Vec<&str> = updated.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genre_names, vec!["Documentary"]);
    }

    #[tokio::test]
    async fn test_update_of_unknown_film_is_not_found() {
        let (service, _) = service();
        let err = service.update_film(5, draft("Ghost")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_like_lifecycle() {
        let (service, backend) = service();
        let film = service.create_film(draft("Liked")).await.unwrap();
        let user = register_user(&backend, "fan").await;

        service.like_film(film.id, user).await.unwrap();
        assert!(matches!(
            service.like_film(film.id, user).await.unwrap_err(),
            AppError::AlreadyExists(_)
        ));

        service.unlike_film(film.id, user).await.unwrap();
        assert!(matches!(
            service.unlike_film(film.id, user).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_like_requires_both_entities() {
        let (service, backend) = service();
        let film = service.create_film(draft("Known")).await.unwrap();
        let user = register_user(&backend, "fan").await;

        assert!(matches!(
            service.like_film(99, user).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.like_film(film.id, 99).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_popular_orders_by_likes_then_id() {
        let (service, backend) = service();
        let first = service.create_film(draft("First")).await.unwrap();
        let second = service.create_film(draft("Second")).await.unwrap();
        let third = service.create_film(draft("Third")).await.unwrap();

        let a = register_user(&backend, "a").await;
        let b = register_user(&backend, "b").await;
        service.like_film(second.id, a).await.unwrap();
        service.like_film(second.id, b).await.unwrap();
        service.like_film(third.id, a).await.unwrap();

        let popular = service.popular_films(None).await.unwrap();
        let ids: Vec<i64> = popular.iter().map(|f| f.id).collect();
        // "First" has zero likes and ties with nothing; equal counts fall
        // back to ascending id
        assert_eq!(ids, vec![second.id, third.id, first.id]);

        let top_one = service.popular_films(Some(1)).await.unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].id, second.id);
    }

    #[tokio::test]
    async fn test_popular_count_must_be_positive() {
        let (service, _) = service();
        assert!(matches!(
            service.popular_films(Some(0)).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_catalog_lookups() {
        let (service, _) = service();
        assert_eq!(service.get_genre(2).await.unwrap().name, "Drama");
        assert_eq!(service.get_mpa(1).await.unwrap().name, "G");
        assert!(matches!(
            service.get_genre(42).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.get_mpa(42).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert_eq!(service.list_genres().await.unwrap().len(), 6);
        assert_eq!(service.list_mpa().await.unwrap().len(), 5);
    }
}
