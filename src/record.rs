use crate::value::StructuredValue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Level {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl Level {
    /// Canonical name emitted in the `level` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Verbose => "Verbose",
            Level::Debug => "Debug",
            Level::Information => "Information",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Verbose,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Information,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Trace identifiers propagated alongside a record. The formatter emits
/// them under their bare names so the backend can correlate records with
/// distributed traces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceContext {
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub sampled: Option<bool>,
}

/// One structured log event, as handed to the record formatter.
///
/// `template` is the raw message text with `{name}` placeholders;
/// `properties` are the values bound to those placeholders, in binding
/// order. Records are transient: built per event, serialized, discarded.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub template: String,
    pub properties: Vec<(String, StructuredValue)>,
    pub exception: Option<String>,
    pub trace: Option<TraceContext>,
}

impl LogRecord {
    /// Start a record with the mandatory fields; everything else defaults
    /// to empty.
    pub fn new(timestamp: DateTime<Utc>, level: Level, template: impl Into<String>) -> Self {
        LogRecord {
            timestamp,
            level,
            template: template.into(),
            properties: Vec::new(),
            exception: None,
            trace: None,
        }
    }

    /// Bind a property, preserving binding order.
    pub fn with_property(mut self, name: impl Into<String>, value: StructuredValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    /// Attach an exception's string form.
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Attach propagated trace identifiers.
    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = Some(trace);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Verbose < Level::Debug);
        assert!(Level::Debug < Level::Information);
        assert!(Level::Information < Level::Warning);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn tracing_levels_map_onto_the_severity_scale() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Verbose);
        assert_eq!(Level::from(tracing::Level::INFO), Level::Information);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn canonical_names_match_display() {
        assert_eq!(Level::Warning.to_string(), "Warning");
        assert_eq!(Level::Fatal.as_str(), "Fatal");
    }
}
