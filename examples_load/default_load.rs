use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use tracing_dynatrace_sink::init::{init_with_transport, DynatraceConfig};
use tracing_dynatrace_sink::noop_transport::NoopTransport;

#[tokio::main]
async fn main() {
    let transport = Arc::new(NoopTransport::default());
    let mut config = DynatraceConfig::new("https://example.invalid/api/v2/logs/ingest", "token");
    config.enable_stdout = false;
    init_with_transport(transport, config);

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "default config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background task a little time to drain the channel
    sleep(Duration::from_secs(2)).await;
}
