pub mod file;

pub use file::{LocalStore, StoredCredential};
