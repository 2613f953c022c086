// file: src/logging/mod.rs
// description: configures the named script logger with console, rotating file and email handlers
// reference: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/index.html#per-layer-filtering

pub mod email;
pub mod formatter;
pub mod record;
pub mod rotating;

pub use email::{EmailLayer, Mailer, SmtpMailer};
pub use formatter::VerboseFormatter;
pub use record::LogRecord;
pub use rotating::RotatingFileWriter;

use crate::config::{Config, LoggingConfig};
use crate::error::{Result, UtilitiesError};
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Dispatch, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry, fmt};

/// Name every script logger is registered under. Also used as the event target.
pub const LOGGER_NAME: &str = "logger";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    RotatingFile {
        path: PathBuf,
        max_bytes: u64,
        backup_count: usize,
    },
    Email {
        mail_host: String,
        recipients: Vec<String>,
    },
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    pub kind: HandlerKind,
    pub level: Level,
}

/// Configure logging under `root` with the built-in agency defaults.
///
/// Creates `root/logs` when missing and returns the `"logger"` logger with a
/// rotating file handler (INFO), an email handler (WARNING) and a console
/// handler (DEBUG). Call once at process start; each call opens new handlers.
pub fn setup_logging(root: impl AsRef<Path>) -> Result<Logger> {
    LoggingSetup::new(root).build()
}

/// Same as [`setup_logging`] but with the `[logging]` section of a loaded config.
pub fn setup_logging_with(root: impl AsRef<Path>, config: &Config) -> Result<Logger> {
    LoggingSetup::new(root)
        .config(config.logging.clone())
        .build()
}

pub struct LoggingSetup {
    root: PathBuf,
    config: LoggingConfig,
    mailer: Option<Box<dyn Mailer>>,
    console: Option<BoxMakeWriter>,
    console_enabled: bool,
}

impl LoggingSetup {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: LoggingConfig::default(),
            mailer: None,
            console: None,
            console_enabled: true,
        }
    }

    pub fn config(mut self, config: LoggingConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace SMTP delivery, e.g. with a relay client or a test double.
    pub fn mailer(mut self, mailer: Box<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Console destination; standard error when unset.
    pub fn console_writer(mut self, writer: BoxMakeWriter) -> Self {
        self.console = Some(writer);
        self
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.console_enabled = enabled;
        self
    }

    pub fn log_directory(&self) -> PathBuf {
        self.root.join(&self.config.directory_name)
    }

    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;

        let log_directory = self.log_directory();
        if !log_directory.exists() {
            fs::create_dir(&log_directory).map_err(|source| UtilitiesError::LogDirectory {
                path: log_directory.clone(),
                source,
            })?;
        }

        let mut layers: Vec<BoxedLayer> = Vec::with_capacity(3);
        let mut handlers = Vec::with_capacity(3);

        let file_config = &self.config.file;
        let log_file = log_directory.join(&self.config.file_name);
        let file_writer =
            RotatingFileWriter::open(&log_file, file_config.max_bytes, file_config.backup_count)?;
        let file_level = file_config.level.as_tracing();
        layers.push(
            fmt::layer()
                .event_format(VerboseFormatter)
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(LevelFilter::from_level(file_level))
                .boxed(),
        );
        handlers.push(HandlerInfo {
            kind: HandlerKind::RotatingFile {
                path: log_file.clone(),
                max_bytes: file_config.max_bytes,
                backup_count: file_config.backup_count,
            },
            level: file_level,
        });

        let email_config = &self.config.email;
        if email_config.enabled {
            let mailer = match self.mailer {
                Some(mailer) => mailer,
                None => Box::new(SmtpMailer::new(email_config)?),
            };
            let email_level = email_config.level.as_tracing();
            layers.push(
                EmailLayer::new(mailer, email_config.subject.clone())
                    .with_filter(LevelFilter::from_level(email_level))
                    .boxed(),
            );
            handlers.push(HandlerInfo {
                kind: HandlerKind::Email {
                    mail_host: email_config.mail_host.clone(),
                    recipients: email_config.to.clone(),
                },
                level: email_level,
            });
        }

        if self.console_enabled {
            let console_level = self.config.console_level.as_tracing();
            let writer = self
                .console
                .unwrap_or_else(|| BoxMakeWriter::new(std::io::stderr));
            layers.push(
                fmt::layer()
                    .event_format(VerboseFormatter)
                    .with_writer(writer)
                    .with_filter(LevelFilter::from_level(console_level))
                    .boxed(),
            );
            handlers.push(HandlerInfo {
                kind: HandlerKind::Console,
                level: console_level,
            });
        }

        let subscriber = Registry::default()
            .with(layers)
            .with(LevelFilter::DEBUG);

        Ok(Logger {
            dispatch: Dispatch::new(subscriber),
            handlers: handlers.into(),
            log_file,
        })
    }
}

/// Handle to a configured script logger.
///
/// Events emitted through it reach only its own handlers; nothing is
/// forwarded to the process-wide subscriber.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
    handlers: Arc<[HandlerInfo]>,
    log_file: PathBuf,
}

impl Logger {
    pub fn name(&self) -> &'static str {
        LOGGER_NAME
    }

    pub fn level(&self) -> Level {
        Level::DEBUG
    }

    pub fn propagates(&self) -> bool {
        false
    }

    pub fn handlers(&self) -> &[HandlerInfo] {
        &self.handlers
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.emit(Level::INFO, message, Location::caller());
    }

    #[track_caller]
    pub fn warning(&self, message: &str) {
        self.emit(Level::WARN, message, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.emit(Level::ERROR, message, Location::caller());
    }

    /// Run `f` with this logger as the default subscriber so plain `tracing`
    /// macros inside it reach the configured handlers.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this logger the process-wide default. Fails if one is already set.
    pub fn install_global(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|e| UtilitiesError::Subscriber(e.to_string()))
    }

    fn emit(&self, level: Level, message: &str, location: &Location<'_>) {
        let file = location.file();
        let line = location.line();
        self.in_scope(|| match level {
            Level::ERROR => {
                tracing::error!(target: LOGGER_NAME, caller_file = file, caller_line = line, "{}", message)
            }
            Level::WARN => {
                tracing::warn!(target: LOGGER_NAME, caller_file = file, caller_line = line, "{}", message)
            }
            Level::INFO => {
                tracing::info!(target: LOGGER_NAME, caller_file = file, caller_line = line, "{}", message)
            }
            Level::DEBUG => {
                tracing::debug!(target: LOGGER_NAME, caller_file = file, caller_line = line, "{}", message)
            }
            Level::TRACE => {
                tracing::trace!(target: LOGGER_NAME, caller_file = file, caller_line = line, "{}", message)
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::email::tests::RecordingMailer;
    use super::*;
    use crate::utils::timer::timer;
    use tempfile::TempDir;
    use tracing_subscriber::fmt::TestWriter;

    fn test_setup(root: &Path, mailer: &RecordingMailer) -> LoggingSetup {
        LoggingSetup::new(root)
            .mailer(Box::new(mailer.clone()))
            .console_writer(BoxMakeWriter::new(TestWriter::new()))
    }

    #[test]
    fn test_creates_logs_directory() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        assert!(!root.path().join("logs").exists());

        let logger = test_setup(root.path(), &mailer).build().unwrap();

        assert!(root.path().join("logs").is_dir());
        assert_eq!(logger.log_file(), root.path().join("logs").join("log.log"));
        assert!(logger.log_file().is_file());
    }

    #[test]
    fn test_existing_logs_directory_is_reused() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("logs")).unwrap();
        fs::write(root.path().join("logs").join("log.log"), "kept\n").unwrap();

        let mailer = RecordingMailer::default();
        let logger = test_setup(root.path(), &mailer).build().unwrap();
        logger.info("appended");

        let contents = fs::read_to_string(logger.log_file()).unwrap();
        assert!(contents.starts_with("kept\n"));
        assert!(contents.contains("appended"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("no").join("such").join("project");
        let err = setup_logging(&missing).unwrap_err();
        assert!(matches!(err, UtilitiesError::LogDirectory { .. }));
    }

    #[test]
    fn test_three_handlers_at_documented_levels() {
        let root = TempDir::new().unwrap();
        let logger = setup_logging(root.path()).unwrap();

        assert_eq!(logger.name(), "logger");
        assert_eq!(logger.level(), Level::DEBUG);
        assert!(!logger.propagates());

        let levels: Vec<Level> = logger.handlers().iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![Level::INFO, Level::WARN, Level::DEBUG]);
        assert!(matches!(
            logger.handlers()[0].kind,
            HandlerKind::RotatingFile {
                max_bytes: 10_485_760,
                backup_count: 3,
                ..
            }
        ));
        assert_eq!(
            logger.handlers()[1].kind,
            HandlerKind::Email {
                mail_host: "mail.dnr.wa.gov".to_string(),
                recipients: vec!["jason.hildreth@dnr.wa.gov".to_string()],
            }
        );
        assert_eq!(logger.handlers()[2].kind, HandlerKind::Console);
    }

    #[test]
    fn test_file_handler_skips_debug() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let logger = test_setup(root.path(), &mailer).build().unwrap();

        logger.debug("console only");
        logger.info("goes to file");

        let contents = fs::read_to_string(logger.log_file()).unwrap();
        assert!(!contents.contains("console only"));
        assert!(contents.contains(" - INFO - script name:mod atlineno:"));
        assert!(contents.contains("- goes to file"));
    }

    #[test]
    fn test_email_only_for_warning_and_above() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let logger = test_setup(root.path(), &mailer).build().unwrap();

        logger.info("routine");
        logger.warning("layer missing");
        logger.error("geodatabase locked");

        let messages = mailer.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|(subject, _)| subject == "Script Update"));
        assert!(messages[0].1.contains("- WARNING -"));
        assert!(messages[0].1.ends_with("- layer missing"));
        assert!(messages[1].1.contains("- ERROR -"));
    }

    #[test]
    fn test_caller_line_is_recorded() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let logger = test_setup(root.path(), &mailer).build().unwrap();

        let line = line!() + 1;
        logger.warning("where am I");

        let (_, body) = &mailer.messages()[0];
        assert!(body.contains(&format!("script name:mod atlineno:{} -", line)));
    }

    #[test]
    fn test_email_disabled_leaves_two_handlers() {
        let root = TempDir::new().unwrap();
        let mut config = LoggingConfig::default();
        config.email.enabled = false;

        let logger = LoggingSetup::new(root.path())
            .config(config)
            .console_writer(BoxMakeWriter::new(TestWriter::new()))
            .build()
            .unwrap();

        assert_eq!(logger.handlers().len(), 2);
        assert!(
            logger
                .handlers()
                .iter()
                .all(|h| !matches!(h.kind, HandlerKind::Email { .. }))
        );
    }

    #[test]
    fn test_in_scope_routes_tracing_macros() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let logger = test_setup(root.path(), &mailer).build().unwrap();

        logger.in_scope(|| tracing::info!(layer = "roads", "reprojected"));

        let contents = fs::read_to_string(logger.log_file()).unwrap();
        assert!(contents.contains("- reprojected layer=roads"));
    }

    #[test]
    fn test_loggers_do_not_share_handlers() {
        let first_root = TempDir::new().unwrap();
        let second_root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let first = test_setup(first_root.path(), &mailer).build().unwrap();
        let second = test_setup(second_root.path(), &mailer).build().unwrap();

        first.info("first only");

        assert!(fs::read_to_string(first.log_file()).unwrap().contains("first only"));
        assert!(!fs::read_to_string(second.log_file()).unwrap().contains("first only"));
    }

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    #[test]
    fn test_timed_function_end_to_end() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let logger = test_setup(root.path(), &mailer).build().unwrap();

        let timed_add = timer(&logger).wrap(add);
        assert_eq!(timed_add.call((2, 3)), 5);

        let contents = fs::read_to_string(logger.log_file()).unwrap();
        let lines: Vec<&str> = contents.lines().filter(|l| l.contains(" took ")).collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("add took 0.0 hours, 0.0 minutes,"));
        assert!(lines[0].ends_with("seconds to complete."));
        assert!(mailer.messages().is_empty());
    }

    /// Console destination that keeps everything written to it.
    #[derive(Clone, Default)]
    struct CapturedConsole {
        buffer: Arc<std::sync::Mutex<Vec<u8>>>,
    }

    impl CapturedConsole {
        fn contents(&self) -> String {
            String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
        }

        fn make_writer(&self) -> BoxMakeWriter {
            let console = self.clone();
            BoxMakeWriter::new(move || console.clone())
        }
    }

    impl std::io::Write for CapturedConsole {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_receives_debug_records() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let console = CapturedConsole::default();
        let logger = LoggingSetup::new(root.path())
            .mailer(Box::new(mailer.clone()))
            .console_writer(console.make_writer())
            .build()
            .unwrap();

        logger.debug("checking inputs");
        logger.info("inputs ok");

        let output = console.contents();
        assert!(output.contains(" - DEBUG - script name:mod atlineno:"));
        assert!(output.contains("- checking inputs\n"));
        assert!(output.contains(" - INFO - "));

        let file = fs::read_to_string(logger.log_file()).unwrap();
        assert!(!file.contains("checking inputs"));
        assert!(file.contains("inputs ok"));
    }

    #[test]
    fn test_trace_below_logger_threshold() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();
        let console = CapturedConsole::default();
        let logger = LoggingSetup::new(root.path())
            .mailer(Box::new(mailer.clone()))
            .console_writer(console.make_writer())
            .build()
            .unwrap();

        logger.in_scope(|| tracing::trace!("too fine"));

        assert!(!console.contents().contains("too fine"));
    }

    #[test]
    fn test_repeated_setup_appends_to_same_file() {
        let root = TempDir::new().unwrap();
        let mailer = RecordingMailer::default();

        let first = test_setup(root.path(), &mailer).build().unwrap();
        first.info("first run");
        let second = test_setup(root.path(), &mailer).build().unwrap();
        second.info("second run");

        let contents = fs::read_to_string(second.log_file()).unwrap();
        assert!(contents.contains("first run"));
        assert!(contents.contains("second run"));
    }
}
