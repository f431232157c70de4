use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::error::{AppError, AppResult};
use crate::models::{User, UserDraft};
use crate::storage::{FriendshipStorage, UserStorage};

/// User orchestration: registration rules, display-name defaulting and the
/// friendship graph.
///
/// Friendship policy: `add_friend` records exactly the requested direction.
/// A mutual friendship is two calls, one per direction; `list_friends` only
/// follows outgoing edges.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStorage>,
    friendships: Arc<dyn FriendshipStorage>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStorage>, friendships: Arc<dyn FriendshipStorage>) -> Self {
        Self { users, friendships }
    }

    pub async fn create_user(&self, mut draft: UserDraft) -> AppResult<User> {
        tracing::debug!(login = %draft.login, "create_user");
        validate(&draft.email, &draft.login, draft.birthday)?;
        if draft.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            tracing::debug!(login = %draft.login, "defaulting display name to login");
            draft.name = Some(draft.login.clone());
        }
        let id = self.users.create(&draft).await?;
        self.get_user(id).await
    }

    pub async fn update_user(&self, mut user: User) -> AppResult<User> {
        tracing::debug!(id = user.id, "update_user");
        if !self.users.contains(user.id).await? {
            return Err(AppError::NotFound(format!(
                "user with id {} not found",
                user.id
            )));
        }
        validate(&user.email, &user.login, user.birthday)?;
        if user.name.trim().is_empty() {
            user.name = user.login.clone();
        }
        self.users.update(&user).await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user with id {id} not found")))
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    pub async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        tracing::debug!(user_id, friend_id, "add_friend");
        self.ensure_exists(user_id).await?;
        self.ensure_exists(friend_id).await?;
        if user_id == friend_id {
            return Err(AppError::Validation(format!(
                "user {user_id} cannot friend themselves"
            )));
        }
        if self.friendships.contains(user_id, friend_id).await? {
            return Err(AppError::AlreadyExists(format!(
                "user {friend_id} is already a friend of user {user_id}"
            )));
        }
        self.friendships.add(user_id, friend_id).await
    }

    pub async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        tracing::debug!(user_id, friend_id, "remove_friend");
        self.ensure_exists(user_id).await?;
        self.ensure_exists(friend_id).await?;
        if !self.friendships.remove(user_id, friend_id).await? {
            return Err(AppError::NotFound(format!(
                "user {friend_id} is not a friend of user {user_id}"
            )));
        }
        Ok(())
    }

    pub async fn list_friends(&self, user_id: i64) -> AppResult<Vec<User>> {
        self.ensure_exists(user_id).await?;
        self.resolve_all(self.friendships.targets(user_id).await?).await
    }

    /// Users both arguments have an outgoing edge to. Symmetric in content
    /// regardless of argument order; disjoint target sets yield an empty
    /// list.
    pub async fn common_friends(&self, user_id: i64, other_id: i64) -> AppResult<Vec<User>> {
        tracing::debug!(user_id, other_id, "common_friends");
        if user_id == other_id {
            return Err(AppError::Validation(format!(
                "common friends of user {user_id} with themselves is undefined"
            )));
        }
        self.ensure_exists(user_id).await?;
        self.ensure_exists(other_id).await?;

        let others: HashSet<i64> = self.friendships.targets(other_id).await?.into_iter().collect();
        let shared: Vec<i64> = self
            .friendships
            .targets(user_id)
            .await?
            .into_iter()
            .filter(|id| others.contains(id))
            .collect();
        self.resolve_all(shared).await
    }

    async fn resolve_all(&self, ids: Vec<i64>) -> AppResult<Vec<User>> {
        let mut friends = Vec::with_capacity(ids.len());
        for id in ids {
            // a dangling edge target means the graph invariant was broken
            let user = self
                .users
                .get(id)
                .await?
                .ok_or_else(|| AppError::Internal(format!("edge target {id} has no user row")))?;
            friends.push(user);
        }
        Ok(friends)
    }

    async fn ensure_exists(&self, id: i64) -> AppResult<()> {
        if !self.users.contains(id).await? {
            return Err(AppError::NotFound(format!("user with id {id} not found")));
        }
        Ok(())
    }
}

fn validate(email: &str, login: &str, birthday: NaiveDate) -> AppResult<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "email must not be blank and must contain '@'".to_string(),
        ));
    }
    if login.trim().is_empty() {
        return Err(AppError::Validation("login must not be blank".to_string()));
    }
    if birthday > Utc::now().date_naive() {
        return Err(AppError::Validation(
            "birth date must not be in the future".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use crate::storage::MemoryBackend;

    use super::*;

    fn service() -> UserService {
        let backend = Arc::new(MemoryBackend::new());
        UserService::new(backend.clone(), backend)
    }

    fn draft(login: &str) -> UserDraft {
        UserDraft {
            email: format!("{login}@example.com"),
            login: login.to_string(),
            name: None,
            birthday: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_display_name_defaults_to_login() {
        let service = service();

        let unnamed = service.create_user(draft("alice")).await.unwrap();
        assert_eq!(unnamed.name, "alice");

        let mut blank = draft("bob");
        blank.name = Some("   ".to_string());
        assert_eq!(service.create_user(blank).await.unwrap().name, "bob");

        let mut named = draft("carol");
        named.name = Some("Carol C.".to_string());
        assert_eq!(service.create_user(named).await.unwrap().name, "Carol C.");
    }

    #[tokio::test]
    async fn test_display_name_defaults_on_update_too() {
        let service = service();
        let mut user = service.create_user(draft("dave")).await.unwrap();
        user.name = String::new();
        let updated = service.update_user(user).await.unwrap();
        assert_eq!(updated.name, "dave");
    }

    #[tokio::test]
    async fn test_registration_validation() {
        let service = service();

        let mut bad_email = draft("x");
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            service.create_user(bad_email).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut blank_login = draft("y");
        blank_login.login = "  ".to_string();
        assert!(matches!(
            service.create_user(blank_login).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut unborn = draft("z");
        unborn.birthday = Utc::now().date_naive().checked_add_days(Days::new(1)).unwrap();
        assert!(matches!(
            service.create_user(unborn).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_update_of_unknown_user_is_not_found() {
        let service = service();
        let ghost = User {
            id: 9,
            email: "g@example.com".to_string(),
            login: "ghost".to_string(),
            name: "ghost".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
        };
        assert!(matches!(
            service.update_user(ghost).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_friendship_edges_are_directed() {
        let service = service();
        let a = service.create_user(draft("a")).await.unwrap();
        let b = service.create_user(draft("b")).await.unwrap();

        service.add_friend(a.id, b.id).await.unwrap();

        let a_friends = service.list_friends(a.id).await.unwrap();
        assert_eq!(a_friends.len(), 1);
        assert_eq!(a_friends[0].id, b.id);
        assert!(service.list_friends(b.id).await.unwrap().is_empty());

        service.add_friend(b.id, a.id).await.unwrap();
        assert_eq!(service.list_friends(b.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_friend_edge_rules() {
        let service = service();
        let a = service.create_user(draft("a")).await.unwrap();
        let b = service.create_user(draft("b")).await.unwrap();

        assert!(matches!(
            service.add_friend(a.id, a.id).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.add_friend(a.id, 99).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        service.add_friend(a.id, b.id).await.unwrap();
        assert!(matches!(
            service.add_friend(a.id, b.id).await.unwrap_err(),
            AppError::AlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_friend_requires_the_edge() {
        let service = service();
        let a = service.create_user(draft("a")).await.unwrap();
        let b = service.create_user(draft("b")).await.unwrap();

        assert!(matches!(
            service.remove_friend(a.id, b.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        service.add_friend(a.id, b.id).await.unwrap();
        service.remove_friend(a.id, b.id).await.unwrap();
        assert!(service.list_friends(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_common_friends_is_symmetric() {
        let service = service();
        let a = service.create_user(draft("a")).await.unwrap();
        let b = service.create_user(draft("b")).await.unwrap();
        let shared = service.create_user(draft("shared")).await.unwrap();
        let only_a = service.create_user(draft("only_a")).await.unwrap();

        service.add_friend(a.id, shared.id).await.unwrap();
        service.add_friend(a.id, only_a.id).await.unwrap();
        service.add_friend(b.id, shared.id).await.unwrap();

        let from_a = service.common_friends(a.id, b.id).await.unwrap();
        let from_b = service.common_friends(b.id, a.id).await.unwrap();
        assert_eq!(from_a, from_b);
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].id, shared.id);
    }

    #[tokio::test]
    async fn test_common_friends_edge_cases() {
        let service = service();
        let a = service.create_user(draft("a")).await.unwrap();
        let b = service.create_user(draft("b")).await.unwrap();

        assert!(service.common_friends(a.id, b.id).await.unwrap().is_empty());
        assert!(matches!(
            service.common_friends(a.id, a.id).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
