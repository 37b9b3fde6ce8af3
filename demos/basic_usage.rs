//! Basic logger usage example
//!
//! Demonstrates the three calling conventions, child loggers and level
//! changes on both engines.
//!
//! Run with: cargo run --example basic_usage

use unified_logger::prelude::*;
use unified_logger::{infow, warnf};

fn main() -> Result<()> {
    println!("=== Unified Logger - Basic Usage Example ===\n");

    for kind in EngineKind::ALL {
        println!("--- {} engine (console format) ---", kind);

        let option = LogOption::default()
            .with_engine(kind.as_str())
            .with_format("console")
            .with_level("debug")
            .with_development(true);
        let logger = LoggerFactory::new(option).create_logger()?;

        println!("1. Calling conventions:");
        logger.info(&[&"listening on port", &8080]);
        logger.infof(format_args!("listening on port {}", 8080));
        logger.infow("listening", fields!["port", 8080]);

        println!("\n2. Macros:");
        infow!(logger, "cache warmed", "entries" => 1024, "elapsed_ms" => 12.5);
        warnf!(logger, "disk at {}%", 91);

        println!("\n3. Child logger with standardized fields:");
        let request = logger.with(fields!["requestId", "r-42", "traceId", "0af76519"]);
        request.debugw("request received", fields!["path", "/orders"]);
        request.errorw("request failed", fields!["err", "upstream timeout"]);

        println!("\n4. Raising the level to WARN:");
        logger.set_level(Level::Warn);
        logger.info(&[&"hidden"]);
        logger.warn(&[&"visible"]);

        logger.sync()?;
        println!();
    }

    println!("=== Example completed successfully! ===");

    Ok(())
}
