//! Logging macros
//!
//! Thin wrappers over the three calling conventions of
//! [`Logger`](crate::Logger). The call site of the macro is the reported
//! caller.
//!
//! # Examples
//!
//! ```no_run
//! use unified_logger::{fields, info, infof, infow, LogOption, LoggerFactory};
//!
//! let logger = LoggerFactory::new(LogOption::default()).create_logger().unwrap();
//!
//! // Operands joined with spaces
//! info!(logger, "server started on", 8080);
//!
//! // Format string
//! infof!(logger, "server started on {}", 8080);
//!
//! // Message plus key/value pairs
//! infow!(logger, "server started", "port" => 8080, "tls" => false);
//!
//! // Same pairs as a slice
//! logger.infow("server started", fields!["port", 8080]);
//! ```

/// Flat key/value slice for the `*w` methods and `with`
///
/// ```
/// use unified_logger::{fields, FieldValue};
///
/// let kvs: &[FieldValue] = fields!["user", "ana", "attempt", 3];
/// assert_eq!(kvs.len(), 4);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        &[] as &[$crate::FieldValue]
    };
    ($($value:expr),+ $(,)?) => {
        &[$($crate::FieldValue::from($value)),+] as &[$crate::FieldValue]
    };
}

/// Log at a runtime level with a format string
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.logf($level, ::std::format_args!($($arg)+))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sugared {
    ($logger:expr, $method:ident, $($arg:expr),+ $(,)?) => {
        $logger.$method(&[$(&$arg as &dyn ::std::fmt::Display),+])
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __structured {
    ($logger:expr, $method:ident, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.$method($msg, &[$($crate::FieldValue::from($key), $crate::FieldValue::from($value)),*])
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::__sugared!($logger, debug, $($arg),+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::__sugared!($logger, info, $($arg),+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::__sugared!($logger, warn, $($arg),+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::__sugared!($logger, error, $($arg),+)
    };
}

/// Terminates the process after writing
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::__sugared!($logger, fatal, $($arg),+)
    };
}

#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! warnf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! errorf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! debugw {
    ($logger:expr, $($rest:tt)+) => {
        $crate::__structured!($logger, debugw, $($rest)+)
    };
}

#[macro_export]
macro_rules! infow {
    ($logger:expr, $($rest:tt)+) => {
        $crate::__structured!($logger, infow, $($rest)+)
    };
}

#[macro_export]
macro_rules! warnw {
    ($logger:expr, $($rest:tt)+) => {
        $crate::__structured!($logger, warnw, $($rest)+)
    };
}

#[macro_export]
macro_rules! errorw {
    ($logger:expr, $($rest:tt)+) => {
        $crate::__structured!($logger, errorw, $($rest)+)
    };
}

#[macro_export]
macro_rules! fatalw {
    ($logger:expr, $($rest:tt)+) => {
        $crate::__structured!($logger, fatalw, $($rest)+)
    };
}
