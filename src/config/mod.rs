//! Profile configuration: typed task/profile models, the two-tier profile
//! registry with its `extends` resolver, the built-in default profiles, and
//! the project descriptor loader.
pub mod defaults;
pub mod loader;
pub mod profile;
pub mod registry;
pub mod task;

pub use profile::{LogLevel, Profile};
pub use registry::{NAMESPACE, ProfileRegistry};
pub use task::{
    CopyTask, DeleteTask, ExpressionType, FileSelector, OneOrMany, RunTask, Task, UpdateTask,
};
