//! File logging example
//!
//! Demonstrates logging to stdout and a file at once, with configuration
//! loaded from JSON and overridden by `LOG_*` environment variables.
//!
//! Run with: cargo run --example file_logging

use unified_logger::prelude::*;

const CONFIG: &str = r#"{
    "engine": "performance",
    "level": "debug",
    "format": "json",
    "output_paths": ["stdout", "application.log"]
}"#;

fn main() -> Result<()> {
    println!("=== Unified Logger - File Logging Example ===\n");

    let mut option: LogOption = serde_json::from_str(CONFIG)?;
    option.apply_env();

    let mut factory = LoggerFactory::new(option);
    let logger = factory.create_logger()?;
    println!("Engine in use: {:?}\n", logger.engine_kind());

    println!("1. Logging to both console and file:");
    logger.info(&[&"Application started"]);
    logger.debug(&[&"Loading configuration..."]);
    logger.warnw("Using default settings", fields!["missing", "timeout"]);
    logger.error(&[&"Failed to load optional plugin"]);

    println!("\n2. Performing some operations:");
    let worker = logger.with(fields!["component", "worker"]);
    for i in 1..=5 {
        worker.infof(format_args!("Processing item {}/5", i));
        if i == 3 {
            worker.warnw("Item took longer than expected", fields!["item", i, "elapsed_ms", 840]);
        }
    }

    logger.info(&[&"All operations completed"]);
    logger.sync()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' for the full log output");

    Ok(())
}
