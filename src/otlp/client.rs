//! OTLP transports and the provider that owns one
//!
//! - gRPC: one lazily connected channel, opened when the client is built and
//!   reused for every export, driven by a private single-worker runtime
//! - HTTP: one blocking POST of the protobuf payload per export

use super::encode::{build_resource, encode_request};
use crate::config::{ExportSettings, Protocol};
use crate::core::{ExportError, FieldValue, Level, LogRecord};
use chrono::Utc;
use opentelemetry_proto::tonic::collector::logs::v1::{
    logs_service_client::LogsServiceClient, ExportLogsServiceRequest,
};
use opentelemetry_proto::tonic::resource::v1::Resource;
use prost::Message;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};
use tonic::transport::{Channel, Endpoint};

pub const HTTP_LOGS_PATH: &str = "/v1/logs";
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
pub const CLIENT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

type ExportResult<T> = std::result::Result<T, ExportError>;

/// Target URL for HTTP export
///
/// A bare `host:port` gets `http://` and the standard logs path; an
/// endpoint that already carries an `http://` or `https://` scheme is used
/// as given.
pub fn http_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if has_scheme(endpoint) {
        endpoint.to_string()
    } else {
        format!("http://{}{}", endpoint.trim_end_matches('/'), HTTP_LOGS_PATH)
    }
}

/// Target URI for the gRPC channel
pub fn grpc_uri(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if has_scheme(endpoint) {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

fn has_scheme(endpoint: &str) -> bool {
    let lower = endpoint.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub struct GrpcTransport {
    runtime: Option<tokio::runtime::Runtime>,
    client: LogsServiceClient<Channel>,
    metadata: MetadataMap,
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
    headers: HeaderMap,
}

/// Export client bound to one transport
pub enum OtlpClient {
    Grpc(GrpcTransport),
    Http(HttpTransport),
}

pub struct ClientInfo {
    pub endpoint: String,
    pub protocol: Protocol,
    pub timeout: Duration,
}

impl OtlpClient {
    pub fn new(settings: &ExportSettings) -> ExportResult<Self> {
        match settings.protocol {
            Protocol::Grpc => GrpcTransport::new(settings).map(OtlpClient::Grpc),
            Protocol::Http => off_runtime(|| HttpTransport::new(settings))?.map(OtlpClient::Http),
        }
    }

    /// Send one request and wait for the collector, up to `timeout`
    pub fn export(
        &self,
        request: ExportLogsServiceRequest,
        endpoint: &str,
        timeout: Duration,
    ) -> ExportResult<()> {
        match self {
            OtlpClient::Grpc(transport) => transport.export(request, timeout),
            OtlpClient::Http(transport) => {
                off_runtime(|| transport.export(&request, endpoint, timeout))?
            }
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            OtlpClient::Grpc(_) => Protocol::Grpc,
            OtlpClient::Http(_) => Protocol::Http,
        }
    }
}

impl GrpcTransport {
    fn new(settings: &ExportSettings) -> ExportResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("otlp-export")
            .enable_all()
            .build()
            .map_err(|e| ExportError::Runtime(e.to_string()))?;

        let endpoint = Endpoint::from_shared(grpc_uri(&settings.endpoint))
            .map_err(|e| ExportError::connect(settings.endpoint.clone(), e))?
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout);

        // The lazy channel spawns its worker on the runtime entered here
        let channel = {
            let _guard = runtime.enter();
            endpoint.connect_lazy()
        };

        Ok(Self {
            runtime: Some(runtime),
            client: LogsServiceClient::new(channel),
            metadata: grpc_metadata(&settings.endpoint, &settings.headers)?,
        })
    }

    fn export(&self, request: ExportLogsServiceRequest, timeout: Duration) -> ExportResult<()> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| ExportError::Runtime("export runtime already shut down".to_string()))?;

        let mut client = self.client.clone();
        let mut request = tonic::Request::new(request);
        *request.metadata_mut() = self.metadata.clone();

        let call = async move { tokio::time::timeout(timeout, client.export(request)).await };
        off_runtime(|| runtime.block_on(call))?
            .map_err(|_| ExportError::Timeout(timeout))?
            .map_err(|status| ExportError::Rpc(format!("{}: {}", status.code(), status.message())))?;
        Ok(())
    }
}

impl Drop for GrpcTransport {
    fn drop(&mut self) {
        // Never block in drop; the caller may be inside another runtime
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl HttpTransport {
    fn new(settings: &ExportSettings) -> ExportResult<Self> {
        let url = http_url(&settings.endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(PROTOBUF_CONTENT_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        for (key, value) in &settings.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ExportError::connect(url.clone(), format!("header '{}': {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ExportError::connect(url.clone(), format!("header '{}': {}", key, e)))?;
            headers.insert(name, value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ExportError::connect(url.clone(), e))?;

        Ok(Self {
            client,
            url,
            headers,
        })
    }

    fn export(
        &self,
        request: &ExportLogsServiceRequest,
        endpoint: &str,
        timeout: Duration,
    ) -> ExportResult<()> {
        let body = request.encode_to_vec();

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .timeout(timeout)
            .body(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExportError::Timeout(timeout)
                } else {
                    ExportError::transport(endpoint, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn grpc_metadata(endpoint: &str, headers: &BTreeMap<String, String>) -> ExportResult<MetadataMap> {
    let mut metadata = MetadataMap::new();
    for (key, value) in headers {
        let name = AsciiMetadataKey::from_bytes(key.to_ascii_lowercase().as_bytes())
            .map_err(|e| ExportError::connect(endpoint, format!("header '{}': {}", key, e)))?;
        let value = AsciiMetadataValue::try_from(value.as_str())
            .map_err(|e| ExportError::connect(endpoint, format!("header '{}': {}", key, e)))?;
        metadata.insert(name, value);
    }
    Ok(metadata)
}

/// Run blocking transport work, moving it to a scoped thread when the caller
/// is itself on a tokio runtime (blocking there would panic)
fn off_runtime<F, T>(work: F) -> ExportResult<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    if tokio::runtime::Handle::try_current().is_err() {
        return Ok(work());
    }
    std::thread::scope(|scope| {
        scope
            .spawn(work)
            .join()
            .map_err(|_| ExportError::Runtime("export thread panicked".to_string()))
    })
}

/// Export client plus the resource identity it reports
///
/// Built once per logger tree and shared by reference between a logger and
/// its children.
pub struct LoggerProvider {
    client: OtlpClient,
    resource: Resource,
    info: ClientInfo,
    shut_down: AtomicBool,
}

impl LoggerProvider {
    /// Connect to the collector named in `settings`
    ///
    /// Fails when export is not enabled or the transport cannot be set up.
    pub fn new(settings: &ExportSettings) -> ExportResult<Self> {
        if !settings.is_enabled() {
            return Err(ExportError::connect(
                settings.endpoint.clone(),
                "export is not enabled",
            ));
        }

        Ok(Self {
            client: OtlpClient::new(settings)?,
            resource: build_resource(settings),
            info: ClientInfo {
                endpoint: settings.endpoint.clone(),
                protocol: settings.protocol,
                timeout: settings.timeout,
            },
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn endpoint(&self) -> &str {
        &self.info.endpoint
    }

    pub fn protocol(&self) -> Protocol {
        self.client.protocol()
    }

    pub fn timeout(&self) -> Duration {
        self.info.timeout
    }

    /// Encode and send one record, blocking until the collector answers
    pub fn emit(&self, record: &LogRecord) -> ExportResult<()> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(ExportError::Runtime("provider is shut down".to_string()));
        }
        let request = encode_request(&self.resource, record);
        self.client.export(request, &self.info.endpoint, self.info.timeout)
    }

    /// Send a record built from its parts, stamped now
    pub fn send_log_record(
        &self,
        level: Level,
        message: impl Into<String>,
        attributes: &[(String, FieldValue)],
    ) -> ExportResult<()> {
        let record = LogRecord::new(level, message, Utc::now()).with_fields(attributes.to_vec());
        self.emit(&record)
    }

    /// Refuse further exports; pending calls finish normally
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for LoggerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerProvider")
            .field("endpoint", &self.info.endpoint)
            .field("protocol", &self.info.protocol)
            .field("timeout", &self.info.timeout)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogOption;

    fn settings(endpoint: &str, protocol: Protocol) -> ExportSettings {
        let mut settings = LogOption::default()
            .with_otlp_endpoint(endpoint)
            .resolve()
            .unwrap()
            .export;
        settings.protocol = protocol;
        settings.timeout = Duration::from_millis(300);
        settings
    }

    #[test]
    fn test_http_url() {
        assert_eq!(http_url("localhost:4318"), "http://localhost:4318/v1/logs");
        assert_eq!(
            http_url("http://collector:4318/custom"),
            "http://collector:4318/custom"
        );
        assert_eq!(http_url("https://logs.example.com"), "https://logs.example.com");
        assert_eq!(
            http_url("http-collector:4318"),
            "http://http-collector:4318/v1/logs"
        );
        assert_eq!(http_url("httpbin:4318"), "http://httpbin:4318/v1/logs");
        assert_eq!(grpc_uri("https-gateway:4317"), "http://https-gateway:4317");
    }

    #[test]
    fn test_grpc_uri() {
        assert_eq!(grpc_uri("localhost:4317"), "http://localhost:4317");
        assert_eq!(grpc_uri("http://localhost:4317"), "http://localhost:4317");
    }

    #[test]
    fn test_provider_requires_enabled_export() {
        let disabled = LogOption::default().resolve().unwrap().export;
        assert!(matches!(
            LoggerProvider::new(&disabled),
            Err(ExportError::Connect { .. })
        ));
    }

    #[test]
    fn test_grpc_failure_is_reported() {
        // Port 9 on loopback: nothing listens there
        let provider = LoggerProvider::new(&settings("127.0.0.1:9", Protocol::Grpc)).unwrap();
        assert_eq!(provider.protocol(), Protocol::Grpc);

        let result = provider.send_log_record(Level::Info, "unreachable", &[]);
        assert!(matches!(
            result,
            Err(ExportError::Rpc(_)) | Err(ExportError::Timeout(_))
        ));
    }

    #[test]
    fn test_http_failure_is_reported() {
        let provider = LoggerProvider::new(&settings("127.0.0.1:9", Protocol::Http)).unwrap();
        let result = provider.send_log_record(Level::Error, "unreachable", &[]);
        assert!(matches!(
            result,
            Err(ExportError::Transport { .. }) | Err(ExportError::Timeout(_))
        ));
    }

    #[test]
    fn test_shutdown_refuses_exports() {
        let provider = LoggerProvider::new(&settings("127.0.0.1:9", Protocol::Http)).unwrap();
        provider.shutdown();
        assert!(provider.is_shut_down());
        assert!(matches!(
            provider.send_log_record(Level::Info, "late", &[]),
            Err(ExportError::Runtime(_))
        ));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut settings = settings("127.0.0.1:9", Protocol::Http);
        settings
            .headers
            .insert("bad header".to_string(), "value".to_string());
        assert!(matches!(
            LoggerProvider::new(&settings),
            Err(ExportError::Connect { .. })
        ));
    }
}
