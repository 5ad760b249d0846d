pub mod storage;
pub mod types;

pub use storage::{get_store_path, SessionStore};
pub use types::{Session, SessionId};
