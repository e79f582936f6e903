pub mod import;
pub mod story;
pub mod user;
