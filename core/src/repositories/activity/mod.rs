//! Session activity repository module.

mod r#trait;
pub use r#trait::SessionActivityRepository;

mod noop;
pub use noop::NoOpSessionActivityRepository;

mod memory;
pub use memory::InMemorySessionActivityRepository;
