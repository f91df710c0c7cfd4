//! HTTP surface: router, handlers and shared state

pub mod handlers;
pub mod server;
pub mod state;

pub use server::{build_router, spawn_store_connection, ApiServer};
pub use state::AppState;
