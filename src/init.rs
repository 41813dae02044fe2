use crate::batch::{BatchFormatter, DEFAULT_EVENT_BODY_LIMIT_BYTES};
use crate::env::resolve_environment;
use crate::formatter::{default_host_name, FormatterConfig, RecordFormatter, TimestampFormat};
use crate::layer::DynatraceLayer;
use crate::record::Level;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// One immutable configuration value for the whole sink.
///
/// **Fields**
/// - `ingest_url`: log ingest endpoint, usually
///   `https://{instance}.live.dynatrace.com/api/v2/logs/ingest`.
/// - `access_token`: API token for the `Api-Token` authorization header.
/// - `application_id`: emitted as `application.id`; `None` means
///   `"unknown"`.
/// - `host_name`: emitted as `host.name`; `None` means the local host
///   name, lower-cased.
/// - `environment`: emitted as `env`; `None` means "resolve from the
///   environment variables" (see [`crate::env::resolve_environment`]),
///   and the field is omitted when that finds nothing.
/// - `properties_prefix`: prefix for flattened properties, default
///   `"attr."`.
/// - `static_attributes`: attributes appended unprefixed to every record.
/// - `timestamp_format`: ISO-8601 text (default) or epoch milliseconds.
/// - `minimum_level`: events below this are not shipped.
/// - `channel_buffer`: maximum queued records before new ones are dropped.
/// - `batch_size`: records per outgoing payload.
/// - `flush_interval`: maximum time between flushes of a partial batch.
/// - `event_body_limit_bytes`: per-record size ceiling in the batch.
/// - `enable_stdout`: also print events to the console via a `fmt` layer.
#[derive(Clone, Debug)]
pub struct DynatraceConfig {
    pub ingest_url: String,
    pub access_token: String,
    pub application_id: Option<String>,
    pub host_name: Option<String>,
    pub environment: Option<String>,
    pub properties_prefix: String,
    pub static_attributes: Vec<(String, String)>,
    pub timestamp_format: TimestampFormat,
    pub minimum_level: Level,
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub event_body_limit_bytes: Option<usize>,
    pub enable_stdout: bool,
}

impl DynatraceConfig {
    /// Config with documented defaults for everything except the endpoint
    /// and token.
    pub fn new(ingest_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        DynatraceConfig {
            ingest_url: ingest_url.into(),
            access_token: access_token.into(),
            application_id: None,
            host_name: None,
            environment: None,
            properties_prefix: "attr.".to_string(),
            static_attributes: Vec::new(),
            timestamp_format: TimestampFormat::default(),
            minimum_level: Level::Information,
            channel_buffer: 1024,
            batch_size: 50,
            flush_interval: Duration::from_secs(15),
            event_body_limit_bytes: Some(DEFAULT_EVENT_BODY_LIMIT_BYTES),
            enable_stdout: true,
        }
    }

    pub(crate) fn formatter(&self) -> RecordFormatter {
        RecordFormatter::new(FormatterConfig {
            application_id: self
                .application_id
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            host_name: self.host_name.clone().unwrap_or_else(default_host_name),
            environment: self.environment.clone().or_else(resolve_environment),
            properties_prefix: self.properties_prefix.clone(),
            static_attributes: self.static_attributes.clone(),
            timestamp_format: self.timestamp_format,
        })
    }
}

/// Initialize global `tracing` subscriber shipping to the provided
/// transport.
///
/// **Parameters**
/// - `transport`: implementation of [`Transport`] that will receive
///   batch payloads.
/// - `config`: [`DynatraceConfig`] controlling formatting, buffering and
///   batching behavior.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`DynatraceLayer`] as the
/// global default subscriber, so all `tracing` events in the process are
/// observed by the layer.
pub fn init_with_transport(transport: Arc<dyn Transport>, config: DynatraceConfig) {
    let formatter = config.formatter();
    let batch_formatter = BatchFormatter::new(config.event_body_limit_bytes);

    let (layer, _handle) = DynatraceLayer::new(
        transport,
        formatter,
        batch_formatter,
        config.minimum_level,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
    );

    // The shipping layer is always installed; with `enable_stdout` a
    // `fmt` layer is added so events remain visible on the console. The
    // subscriber is assembled in two variants for type compatibility.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }
}

/// Initialize the sink with the HTTP transport built from `config`.
///
/// **Returns**
/// - `Err(..)` if the HTTP transport could not be constructed (for
///   example, a token that is not a valid header value).
#[cfg(feature = "http")]
pub fn init_dynatrace(
    config: DynatraceConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use crate::http::{HttpTransport, HttpTransportConfig};

    let transport = HttpTransport::new(HttpTransportConfig {
        ingest_url: config.ingest_url.clone(),
        access_token: config.access_token.clone(),
    })?;

    init_with_transport(Arc::new(transport), config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_documented_values() {
        let cfg = DynatraceConfig::new("https://x.live.dynatrace.com/api/v2/logs/ingest", "tok");
        assert_eq!(cfg.properties_prefix, "attr.");
        assert_eq!(cfg.batch_size, 50);
        assert_eq!(cfg.flush_interval, Duration::from_secs(15));
        assert_eq!(cfg.minimum_level, Level::Information);
        assert_eq!(cfg.event_body_limit_bytes, Some(256 * 1024));
    }

    #[test]
    fn formatter_falls_back_to_unknown_application_id() {
        let cfg = DynatraceConfig::new("https://x/ingest", "tok");
        let formatter = cfg.formatter();
        assert_eq!(formatter.config().application_id, "unknown");
        assert_eq!(
            formatter.config().host_name,
            formatter.config().host_name.to_lowercase()
        );
    }
}
