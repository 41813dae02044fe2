//! Async `tracing` layer that ships structured log events to a Dynatrace
//! log ingest endpoint as flattened, size-gated JSON-array batches.
//!
//! Nested event properties are flattened to dotted keys under a
//! configurable prefix (`attr.` by default), trace-correlation fields are
//! passed through unprefixed, and rendered records are packed into one
//! JSON array per outgoing request.

pub mod batch;
pub mod env;
pub mod formatter;
pub mod layer;
pub mod record;
pub mod template;
pub mod transport;
pub mod value;

#[cfg(feature = "http")]
pub mod http;

pub mod init;
pub mod noop_transport;

pub use batch::BatchFormatter;
pub use formatter::{FormatterConfig, RecordFormatter, TimestampFormat};
pub use record::{Level, LogRecord, TraceContext};
pub use value::{Scalar, StructuredValue};
