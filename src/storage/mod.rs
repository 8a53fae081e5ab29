pub mod essay_store;
pub mod json_io;
pub mod user_store;

pub use essay_store::{EssayArchive, EssayStore};
pub use json_io::{backup_path, read_json_safe, write_json_safe};
pub use user_store::{UserDirectory, UserStore};
