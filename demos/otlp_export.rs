//! OTLP export example
//!
//! Sends every record to a collector as well as stdout. Point it at a local
//! collector (for example an OpenTelemetry Collector or VictoriaLogs):
//!
//! Run with: LOG_OTLP_ENDPOINT=localhost:4317 cargo run --example otlp_export
//! Or over HTTP: LOG_OTLP_ENDPOINT=localhost:4318 LOG_OTLP_PROTOCOL=http cargo run --example otlp_export
//!
//! With no collector running the records are still written locally and the
//! export failures are reported on stderr.

use std::time::Duration;
use unified_logger::prelude::*;
use unified_logger::global;

fn main() -> Result<()> {
    println!("=== Unified Logger - OTLP Export Example ===\n");

    let mut option = LogOption::default()
        .with_otlp(
            OtlpOption::default()
                .with_endpoint("localhost:4317")
                .with_timeout(Duration::from_secs(2))
                .with_header("x-tenant", "demo")
                .with_service("otlp-demo", env!("CARGO_PKG_VERSION")),
        );
    option.apply_env();

    let logger = LoggerFactory::new(option).create_logger()?;
    println!("Export enabled: {}\n", logger.is_export_enabled());

    global::init(logger.clone());

    global::infow("order placed", fields!["orderId", 1001, "amount", 49.99]);
    global::with(fields!["traceId", "4bf92f3577b34da6a3ce929d0e0e4736"])
        .warnw("payment retry", fields!["attempt", 2]);
    global::errorf(format_args!("inventory service returned {}", 503));

    let metrics = logger.metrics();
    println!(
        "\nlogged={} exported={} export_failures={}",
        metrics.total_logged(),
        metrics.exported(),
        metrics.export_failures()
    );

    global::shutdown()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
