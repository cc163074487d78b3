pub mod content;
pub mod locale;
pub mod query;
pub mod router;
