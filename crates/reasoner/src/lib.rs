pub mod conversation;
pub mod errors;
pub mod format;
pub mod models;
pub mod providers;
pub mod stream;
pub mod turn;
