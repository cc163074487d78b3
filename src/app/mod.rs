pub mod pages;
pub mod server;

pub use server::{build_router, build_state, serve, AppState};
