pub mod attendance;
pub mod auth;
pub mod catalog;
pub mod scores;
pub mod students;

pub use attendance::*;
pub use auth::*;
pub use catalog::*;
pub use scores::*;
pub use students::*;

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
