//! Persistence contracts used by the auth core, with in-memory
//! implementations.

pub mod activity;
pub mod session;
pub mod user;

pub use activity::{InMemorySessionActivityRepository, NoOpSessionActivityRepository, SessionActivityRepository};
pub use session::{InMemorySessionStore, SessionStore};
pub use user::{InMemoryUserDirectory, UserLookup};
