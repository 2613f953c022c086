// file: src/logging/formatter.rs
// description: verbose event formatter shared by the console and file handlers
// reference: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/trait.FormatEvent.html

use super::record::LogRecord;
use chrono::Local;
use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone, Copy, Default)]
pub struct VerboseFormatter;

impl<S, N> FormatEvent<S, N> for VerboseFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = LogRecord::from_event(event);
        writeln!(writer, "{}", record.render(Local::now()))
    }
}
