mod utils;
pub use utils::{test_db, test_utils};

mod api;
