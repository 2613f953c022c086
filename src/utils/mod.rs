// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;
pub mod timer;

pub use timer::{Callable, ElapsedTime, LogSink, Timed, Timer, completion_message, timer};
