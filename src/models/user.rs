use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub login: String,
    /// Display name; falls back to the login when left blank
    pub name: String,
    pub birthday: NaiveDate,
}

/// User fields as supplied by a caller at registration
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub email: String,
    pub login: String,
    pub name: Option<String>,
    pub birthday: NaiveDate,
}
