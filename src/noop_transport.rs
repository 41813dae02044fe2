use crate::transport::Transport;
use async_trait::async_trait;
use std::error::Error;

/// A transport that simply drops every payload.
///
/// Useful for measuring the overhead of the layer and formatters without
/// any external I/O, and for unit tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn send(&self, _payload: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
