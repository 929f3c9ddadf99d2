pub mod authentication;
pub mod session;
pub mod teacher;

pub use authentication::*;
pub use session::*;
pub use teacher::*;
