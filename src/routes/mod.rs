pub mod films;
pub mod genres;
pub mod mpa;
pub mod users;

use serde::Deserialize;

/// Catalog reference by id only, e.g. `{"id": 3}`
#[derive(Debug, Deserialize)]
pub struct IdRef {
    pub id: i32,
}
