mod catalog;
mod film;
mod user;

pub use catalog::{Genre, Mpa};
pub use film::{Film, FilmDraft, FilmRecord};
pub use user::{User, UserDraft};
