use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::{AppError, AppResult};
use crate::models::{FilmDraft, FilmRecord, Genre, Mpa, User, UserDraft};

use super::{
    FilmStorage, FriendshipEdge, FriendshipStorage, GenreStorage, LikeStorage, MpaStorage,
    UserStorage,
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies pending migrations, including the catalog seed rows.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

/// Relational backend over PostgreSQL.
///
/// Ids come from BIGSERIAL sequences, so they stay unique under concurrent
/// creation and are never reused, not even after `clear()`. Multi-table
/// writes (film + genre links, friendship flag maintenance) run inside a
/// transaction.
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FilmStorage for PgBackend {
    async fn create(&self, draft: &FilmDraft) -> AppResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO films (name, description, release_date, duration, mpa_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.release_date)
        .bind(draft.duration)
        .bind(draft.mpa_id)
        .fetch_one(&mut *tx)
        .await?;

        for (position, genre_id) in draft.genre_ids.iter().enumerate() {
            sqlx::query("INSERT INTO film_genres (film_id, genre_id, position) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(genre_id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn update(&self, id: i64, draft: &FilmDraft) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE films SET name=$1, description=$2, release_date=$3, duration=$4, mpa_id=$5 \
             WHERE id=$6",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.release_date)
        .bind(draft.duration)
        .bind(draft.mpa_id)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound(format!("film with id {id} not found")));
        }

        sqlx::query("DELETE FROM film_genres WHERE film_id=$1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for (position, genre_id) in draft.genre_ids.iter().enumerate() {
            sqlx::query("INSERT INTO film_genres (film_id, genre_id, position) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(genre_id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Option<FilmRecord>> {
        let film = sqlx::query_as::<_, FilmRecord>(
            "SELECT id, name, description, release_date, duration, mpa_id FROM films WHERE id=$1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(film)
    }

    async fn list(&self) -> AppResult<Vec<FilmRecord>> {
        let films = sqlx::query_as::<_, FilmRecord>(
            "SELECT id, name, description, release_date, duration, mpa_id FROM films ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(films)
    }

    async fn genre_ids_of(&self, id: i64) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT genre_id FROM film_genres WHERE film_id=$1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn contains(&self, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM films WHERE id=$1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn clear(&self) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM likes").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM film_genres").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM films").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserStorage for PgBackend {
    async fn create(&self, draft: &UserDraft) -> AppResult<i64> {
        let name = draft.name.clone().unwrap_or_else(|| draft.login.clone());
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, login, name, birthday) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&draft.email)
        .bind(&draft.login)
        .bind(&name)
        .bind(draft.birthday)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let updated =
            sqlx::query("UPDATE users SET email=$1, login=$2, name=$3, birthday=$4 WHERE id=$5")
                .bind(&user.email)
                .bind(&user.login)
                .bind(&user.name)
                .bind(user.birthday)
                .bind(user.id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound(format!(
                "user with id {} not found",
                user.id
            )));
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, login, name, birthday FROM users WHERE id=$1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, login, name, birthday FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn contains(&self, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id=$1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn clear(&self) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM likes").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM friendships").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl GenreStorage for PgBackend {
    async fn get(&self, id: i32) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id=$1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn list(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn contains(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM genres WHERE id=$1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait::async_trait]
impl MpaStorage for PgBackend {
    async fn get(&self, id: i32) -> AppResult<Option<Mpa>> {
        let mpa = sqlx::query_as::<_, Mpa>("SELECT id, name FROM mpa WHERE id=$1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(mpa)
    }

    async fn list(&self) -> AppResult<Vec<Mpa>> {
        let tiers = sqlx::query_as::<_, Mpa>("SELECT id, name FROM mpa ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(tiers)
    }

    async fn contains(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM mpa WHERE id=$1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait::async_trait]
impl FriendshipStorage for PgBackend {
    async fn add(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let reciprocated: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_id=$1 AND friend_id=$2)",
        )
        .bind(friend_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO friendships (user_id, friend_id, reciprocated) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(friend_id)
            .bind(reciprocated)
            .execute(&mut *tx)
            .await?;

        if reciprocated {
            sqlx::query("UPDATE friendships SET reciprocated=TRUE WHERE user_id=$1 AND friend_id=$2")
                .bind(friend_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, user_id: i64, friend_id: i64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        let reciprocated: Option<bool> = sqlx::query_scalar(
            "SELECT reciprocated FROM friendships WHERE user_id=$1 AND friend_id=$2",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reciprocated) = reciprocated else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM friendships WHERE user_id=$1 AND friend_id=$2")
            .bind(user_id)
            .bind(friend_id)
            .execute(&mut *tx)
            .await?;

        if reciprocated {
            sqlx::query("UPDATE friendships SET reciprocated=FALSE WHERE user_id=$1 AND friend_id=$2")
                .bind(friend_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn targets(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let targets = sqlx::query_scalar::<_, i64>(
            "SELECT friend_id FROM friendships WHERE user_id=$1 ORDER BY friend_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(targets)
    }

    async fn edge(&self, user_id: i64, friend_id: i64) -> AppResult<Option<FriendshipEdge>> {
        let reciprocated: Option<bool> = sqlx::query_scalar(
            "SELECT reciprocated FROM friendships WHERE user_id=$1 AND friend_id=$2",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reciprocated.map(|reciprocated| FriendshipEdge {
            user_id,
            friend_id,
            reciprocated,
        }))
    }

    async fn contains(&self, user_id: i64, friend_id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_id=$1 AND friend_id=$2)",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM friendships").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LikeStorage for PgBackend {
    async fn add(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        sqlx::query("INSERT INTO likes (film_id, user_id) VALUES ($1, $2)")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, film_id: i64, user_id: i64) -> AppResult<bool> {
        let removed = sqlx::query("DELETE FROM likes WHERE film_id=$1 AND user_id=$2")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn is_liked(&self, film_id: i64, user_id: i64) -> AppResult<bool> {
        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE film_id=$1 AND user_id=$2)",
        )
        .bind(film_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(liked)
    }

    async fn count(&self, film_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE film_id=$1")
            .bind(film_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM likes").execute(&self.pool).await?;
        Ok(())
    }
}
