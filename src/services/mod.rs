mod films;
mod users;

pub use films::FilmService;
pub use users::UserService;
