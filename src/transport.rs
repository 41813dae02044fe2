use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for batch payloads produced by the layer.
///
/// Implementations transmit the payload to a concrete ingestion endpoint.
/// The layer calls `send` from a background task, once per outgoing batch,
/// and never awaits it on the application thread.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transmit one batch payload, unmodified.
    ///
    /// **Parameters**
    /// - `payload`: a complete JSON-array payload as produced by
    ///   [`crate::batch::BatchFormatter`]. Never empty; the layer skips
    ///   the call when the batch formatter wrote zero bytes.
    ///
    /// **Returns**
    /// - `Ok(())` if the endpoint accepted the payload.
    /// - `Err(..)` if transmission failed. The layer reports the failure
    ///   and drops the batch; it does not retry.
    async fn send(&self, payload: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>>;
}
