// file: src/logging/record.rs
// description: flattens a tracing event into a record and renders the verbose line
// reference: https://docs.rs/tracing/latest/tracing/field/trait.Visit.html

use chrono::{DateTime, Local};
use std::fmt;
use std::path::Path;
use tracing::field::{Field, Visit};
use tracing::{Event, Level};

/// Field carrying the caller's source file, set by [`super::Logger`]'s methods.
pub const CALLER_FILE_FIELD: &str = "caller_file";
/// Field carrying the caller's line number.
pub const CALLER_LINE_FIELD: &str = "caller_line";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub module: String,
    pub line: u32,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    pub fn from_event(event: &Event<'_>) -> Self {
        let metadata = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let module = visitor
            .caller_file
            .as_deref()
            .or(metadata.file())
            .map(module_name)
            .or_else(|| {
                metadata
                    .module_path()
                    .and_then(|path| path.rsplit("::").next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| metadata.target().to_string());

        Self {
            level: *metadata.level(),
            module,
            line: visitor.caller_line.or(metadata.line()).unwrap_or(0),
            message: visitor.message,
            fields: visitor.fields,
        }
    }

    /// ` <asctime> - <LEVEL> - script name:<module> atlineno:<line> - <message>`
    pub fn render(&self, timestamp: DateTime<Local>) -> String {
        let mut line = format!(
            " {} - {} - script name:{} atlineno:{} - {}",
            timestamp.format(TIMESTAMP_FORMAT),
            level_name(self.level),
            self.module,
            self.line,
            self.message
        );
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }
}

pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

/// Script name as shown in the log line: the file stem of the caller.
fn module_name(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    caller_file: Option<String>,
    caller_line: Option<u32>,
    fields: Vec<(String, String)>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            CALLER_FILE_FIELD => self.caller_file = Some(value.to_string()),
            _ => self.fields.push((field.name().to_string(), value.to_string())),
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == CALLER_LINE_FIELD {
            self.caller_line = u32::try_from(value).ok();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            CALLER_FILE_FIELD => self.caller_file = Some(format!("{:?}", value)),
            _ => self
                .fields
                .push((field.name().to_string(), format!("{:?}", value))),
        }
    }
}
