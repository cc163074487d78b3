pub mod credential;
pub mod http;
