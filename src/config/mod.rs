//! Logger configuration
//!
//! [`LogOption`] is the raw, serde-friendly form. [`LogOption::resolve`]
//! turns it into a [`LogConfig`] with every conflict settled.

pub mod duration;
pub mod env;
pub mod option;
pub mod resolve;

pub use option::{
    LogOption, OtlpOption, DEFAULT_ENGINE, DEFAULT_FORMAT, DEFAULT_LEVEL, DEFAULT_OUTPUT,
    DEFAULT_PROTOCOL, DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_VERSION, DEFAULT_TIMEOUT,
};
pub use resolve::{ExportSettings, LogConfig, Protocol};
