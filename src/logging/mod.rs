//! Logging infrastructure for structured console output.

mod logger;
mod subscriber;
mod types;

pub use logger::Logger;
pub use subscriber::{LevelHandle, init_subscriber};
pub use types::{Log, TaskEntry, TaskStatus};
