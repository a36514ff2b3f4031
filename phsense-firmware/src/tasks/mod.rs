//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod console;
pub mod sampler;

pub use console::console_task;
pub use sampler::{sampler_task, ProbeSensor};
