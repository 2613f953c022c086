// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod environment;
pub mod error;
pub mod logging;
pub mod utils;

pub use config::{Config, EmailHandlerConfig, FileHandlerConfig, HandlerLevel, LoggingConfig};
pub use environment::{EnvironmentSettings, GeoprocessingEnvironment, Toolkit};
pub use error::{Result, UtilitiesError};
pub use logging::{
    HandlerInfo, HandlerKind, LOGGER_NAME, Logger, LoggingSetup, Mailer, setup_logging,
    setup_logging_with,
};
pub use utils::{ElapsedTime, LogSink, Timed, Timer, timer};
