use crate::batch::BatchFormatter;
use crate::formatter::RecordFormatter;
use crate::record::{Level, LogRecord};
use crate::transport::Transport;
use crate::value::{Scalar, StructuredValue};
use chrono::Utc;
use std::error::Error;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that observes events and forwards them to
/// an asynchronous [`Transport`] via a bounded channel and background task.
///
/// Events at or above the configured minimum level become [`LogRecord`]s.
/// The background task renders each record with the [`RecordFormatter`],
/// packs rendered lines into a JSON-array payload with the
/// [`BatchFormatter`], and hands the payload to the transport once per
/// batch. Network I/O is fully decoupled from application threads.
pub struct DynatraceLayer {
    sender: mpsc::Sender<LogRecord>,
    minimum_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl DynatraceLayer {
    /// Create a new layer and spawn a background task that pulls
    /// [`LogRecord`]s from a bounded channel, renders and batches them,
    /// and sends the payloads to the provided [`Transport`].
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval` to avoid degenerate configurations.
    pub fn new(
        transport: Arc<dyn Transport>,
        formatter: RecordFormatter,
        batch_formatter: BatchFormatter,
        minimum_level: Level,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));

        let enqueued_events_bg = Arc::clone(&enqueued_events);

        let handle = tokio::spawn(async move {
            let mut lines: Vec<String> = Vec::with_capacity(batch_size);

            loop {
                tokio::select! {
                    maybe_record = rx.recv() => match maybe_record {
                        Some(record) => {
                            enqueued_events_bg.fetch_add(1, Ordering::Relaxed);
                            render_into(&formatter, record, &mut lines);
                            if lines.len() >= batch_size {
                                if let Err(e) = ship_batch(&*transport, &batch_formatter, &mut lines).await {
                                    eprintln!("error sending log batch: {}", e);
                                }
                            }
                        }
                        // Channel closed: flush what we have and stop.
                        None => {
                            if !lines.is_empty() {
                                if let Err(e) = ship_batch(&*transport, &batch_formatter, &mut lines).await {
                                    eprintln!("error flushing log batch: {}", e);
                                }
                            }
                            break;
                        }
                    },
                    _ = sleep(flush_interval) => {
                        if !lines.is_empty() {
                            if let Err(e) = ship_batch(&*transport, &batch_formatter, &mut lines).await {
                                eprintln!("error flushing log batch: {}", e);
                            }
                        }
                    }
                }
            }
        });

        (
            Self {
                sender: tx,
                minimum_level,
                total_events,
                enqueued_events,
                dropped_events,
            },
            handle,
        )
    }
}

/// Render one record to a line, or report and drop it. A record that fails
/// to render never affects its neighbors in the batch.
fn render_into(formatter: &RecordFormatter, record: LogRecord, lines: &mut Vec<String>) {
    match formatter.format(&record) {
        Ok(line) => lines.push(line),
        Err(e) => eprintln!(
            "log record at {} with template {:?} could not be formatted and will be dropped: {}",
            record.timestamp.to_rfc3339(),
            record.template,
            e
        ),
    }
}

/// Pack the accumulated lines and send the payload, exactly once.
///
/// The batch formatter writes zero bytes when every line was filtered out;
/// in that case there is nothing to send and the transport is not called.
async fn ship_batch(
    transport: &dyn Transport,
    batch_formatter: &BatchFormatter,
    lines: &mut Vec<String>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let payload = batch_formatter.format_to_vec(lines.iter())?;
    lines.clear();

    if payload.is_empty() {
        return Ok(());
    }
    transport.send(payload).await
}

impl<S> Layer<S> for DynatraceLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let level = Level::from(*event.metadata().level());
        if level < self.minimum_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(
            Utc::now(),
            level,
            visitor.message.unwrap_or_default(),
        );
        record.properties = visitor.properties;
        record.exception = visitor.exception;

        if self.sender.try_send(record).is_err() {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("log channel full, dropping log record");
        }
    }
}

use tracing::field::{Field, Visit};

/// Collects event fields into the record shape: the `message` field
/// becomes the template, an error-typed field becomes the exception, and
/// everything else becomes a bound property in discovery order.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    exception: Option<String>,
    properties: Vec<(String, StructuredValue)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: StructuredValue) {
        self.properties.push((field.name().to_string(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, StructuredValue::scalar(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, StructuredValue::scalar(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, StructuredValue::scalar(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, StructuredValue::scalar(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, StructuredValue::scalar(value));
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn Error + 'static)) {
        let mut text = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            text.push_str("\ncaused by: ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        self.exception = Some(text);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(
                field,
                StructuredValue::Scalar(Scalar::String(format!("{:?}", value))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{FormatterConfig, RecordFormatter};
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct CaptureTransport {
        payloads: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl Transport for CaptureTransport {
        async fn send(&self, payload: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.payloads.lock().unwrap().push(payload);
            Ok(())
        }
    }

    fn formatter() -> RecordFormatter {
        RecordFormatter::new(FormatterConfig {
            application_id: "test-app".to_string(),
            host_name: "test-host".to_string(),
            ..FormatterConfig::default()
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn events_flow_through_to_the_transport_as_json_arrays() {
        let transport = Arc::new(CaptureTransport::default());
        let (layer, _handle) = DynatraceLayer::new(
            transport.clone(),
            formatter(),
            BatchFormatter::default(),
            Level::Information,
            64,
            1,
            Duration::from_millis(20),
        );

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(user_id = 7, "checkout failed");
        });

        tokio::time::sleep(Duration::from_millis(300)).await;

        let payloads = transport.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&payloads[0]).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["level"], "Error");
        assert_eq!(parsed[0]["content"], "checkout failed");
        assert_eq!(parsed[0]["attr.user_id"], "7");
        assert_eq!(parsed[0]["application.id"], "test-app");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn events_below_the_minimum_level_are_filtered() {
        let transport = Arc::new(CaptureTransport::default());
        let (layer, _handle) = DynatraceLayer::new(
            transport.clone(),
            formatter(),
            BatchFormatter::default(),
            Level::Warning,
            64,
            1,
            Duration::from_millis(20),
        );

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("too quiet to ship");
            tracing::warn!("loud enough");
        });

        tokio::time::sleep(Duration::from_millis(300)).await;

        let payloads = transport.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&payloads[0]).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["level"], "Warning");
    }
}
