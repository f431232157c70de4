use serde::{Deserialize, Serialize};

/// MPA content-rating tier referenced by films
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mpa {
    pub id: i32,
    pub name: String,
}

/// Descriptive genre tag, many-to-many with films
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}
