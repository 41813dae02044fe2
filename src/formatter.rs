use crate::record::LogRecord;
use crate::template;
use crate::value::{flatten_into, is_root_property};
use chrono::SecondsFormat;

/// How record timestamps appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// RFC 3339 with microsecond precision, the round-trippable text form.
    #[default]
    Iso8601,
    /// Unix epoch milliseconds as a bare JSON number.
    EpochMillis,
}

/// Immutable formatter configuration, fixed at construction.
///
/// Replaces a telescoping list of optional parameters with one value whose
/// fields have documented defaults.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Emitted as `application.id` on every record. Default `"unknown"`.
    pub application_id: String,
    /// Emitted as `host.name` on every record. Default: the local host
    /// name, lower-cased.
    pub host_name: String,
    /// Emitted as `env` when present; the field is omitted entirely when
    /// `None`.
    pub environment: Option<String>,
    /// Prefix applied to flattened property keys. Default `"attr."`.
    /// Root properties (see [`crate::value::ROOT_PROPERTIES`]) bypass it.
    pub properties_prefix: String,
    /// Attributes appended unprefixed to every record, in order.
    pub static_attributes: Vec<(String, String)>,
    pub timestamp_format: TimestampFormat,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        FormatterConfig {
            application_id: "unknown".to_string(),
            host_name: default_host_name(),
            environment: None,
            properties_prefix: "attr.".to_string(),
            static_attributes: Vec::new(),
            timestamp_format: TimestampFormat::default(),
        }
    }
}

/// The local machine's host name, lower-cased.
pub fn default_host_name() -> String {
    gethostname::gethostname().to_string_lossy().to_lowercase()
}

/// Why a single record could not be rendered. The record is dropped and
/// reported; later records are unaffected.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to serialize record text: {0}")]
    Json(#[from] serde_json::Error),
}

/// Renders one [`LogRecord`] as a canonical single-line JSON object.
///
/// Holds only immutable configuration, so one instance may be shared
/// across threads and calls freely.
#[derive(Debug, Clone, Default)]
pub struct RecordFormatter {
    config: FormatterConfig,
}

impl RecordFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        RecordFormatter { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Format `record` as one line of JSON.
    ///
    /// Field order is fixed: timestamp, level, application.id, host.name,
    /// optional env, content, trace identifiers, flattened properties,
    /// static attributes. All values are JSON strings except an
    /// epoch-millis timestamp.
    pub fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let mut buf = String::with_capacity(256);

        buf.push_str("{\"timestamp\":");
        match self.config.timestamp_format {
            TimestampFormat::Iso8601 => {
                let ts = record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
                push_json_str(&mut buf, &ts)?;
            }
            TimestampFormat::EpochMillis => {
                buf.push_str(&record.timestamp.timestamp_millis().to_string());
            }
        }

        buf.push_str(",\"level\":");
        push_json_str(&mut buf, record.level.as_str())?;

        buf.push_str(",\"application.id\":");
        push_json_str(&mut buf, &self.config.application_id)?;

        buf.push_str(",\"host.name\":");
        push_json_str(&mut buf, &self.config.host_name)?;

        if let Some(env) = &self.config.environment {
            buf.push_str(",\"env\":");
            push_json_str(&mut buf, env)?;
        }

        buf.push_str(",\"content\":");
        let mut content = template::render(&record.template, &record.properties);
        if let Some(exception) = &record.exception {
            content.push('\n');
            content.push_str(exception);
        }
        push_json_str(&mut buf, &content)?;

        if let Some(trace) = &record.trace {
            if let Some(trace_id) = &trace.trace_id {
                buf.push_str(",\"trace_id\":");
                push_json_str(&mut buf, trace_id)?;
            }
            if let Some(span_id) = &trace.span_id {
                buf.push_str(",\"span_id\":");
                push_json_str(&mut buf, span_id)?;
            }
            if let Some(sampled) = trace.sampled {
                buf.push_str(",\"trace_sampled\":");
                push_json_str(&mut buf, if sampled { "true" } else { "false" })?;
            }
        }

        for (name, value) in &record.properties {
            let root = if is_root_property(name) {
                name.clone()
            } else {
                format!("{}{}", self.config.properties_prefix, name)
            };
            let mut pairs = Vec::new();
            flatten_into(value, &root, &mut |k, v| pairs.push((k.to_string(), v)));
            for (key, text) in pairs {
                buf.push(',');
                push_json_str(&mut buf, &key)?;
                buf.push(':');
                push_json_str(&mut buf, &text)?;
            }
        }

        for (key, text) in &self.config.static_attributes {
            buf.push(',');
            push_json_str(&mut buf, key)?;
            buf.push(':');
            push_json_str(&mut buf, text)?;
        }

        buf.push('}');
        Ok(buf)
    }
}

fn push_json_str(buf: &mut String, s: &str) -> Result<(), FormatError> {
    buf.push_str(&serde_json::to_string(s)?);
    Ok(())
}
