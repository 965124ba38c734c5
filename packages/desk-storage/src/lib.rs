pub mod db;
pub mod documents;
pub mod messages;
pub mod models;
pub mod schema;
pub mod sessions;
pub mod tickets;
pub mod traces;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
