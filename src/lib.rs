pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod history;
pub mod models;
pub mod progress;
pub mod state;
pub mod storage;
pub mod sync;
pub mod water;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::Store;
