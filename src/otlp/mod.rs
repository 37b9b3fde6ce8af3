//! OTLP log export
//!
//! [`encode`] maps a record onto the OTLP logs schema; [`client`] sends the
//! request over gRPC or HTTP. Each export is synchronous: the calling thread
//! waits for the collector, up to the configured timeout.

pub mod client;
pub mod encode;

pub use client::{http_url, LoggerProvider, OtlpClient, HTTP_LOGS_PATH};
pub use encode::{build_resource, encode_record, encode_request, severity_number};
