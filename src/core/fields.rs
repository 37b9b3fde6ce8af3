//! Canonical field names and the alias table that maps onto them
//!
//! Every engine routes user-supplied keys through [`FieldMapper`] so the same
//! logical field always lands under one name, whichever engine wrote it.

use super::field_value::{FieldValue, Fields};
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const LEVEL_FIELD: &str = "level";
pub const MESSAGE_FIELD: &str = "message";
pub const CALLER_FIELD: &str = "caller";
pub const STACKTRACE_FIELD: &str = "stacktrace";
pub const ERROR_FIELD: &str = "error";
pub const ENGINE_FIELD: &str = "engine";

pub const TRACE_ID_FIELD: &str = "trace_id";
pub const SPAN_ID_FIELD: &str = "span_id";
pub const PARENT_SPAN_ID_FIELD: &str = "parent_span_id";
pub const REQUEST_ID_FIELD: &str = "request_id";

/// Keys every record writes itself; user keys never take them
pub const RESERVED_FIELDS: &[&str] = &[
    TIMESTAMP_FIELD,
    LEVEL_FIELD,
    MESSAGE_FIELD,
    CALLER_FIELD,
    STACKTRACE_FIELD,
    ENGINE_FIELD,
];

/// Prefix for user keys that land on a reserved name
pub const RESERVED_PREFIX: &str = "fields.";

const CORE_ALIASES: &[(&str, &str)] = &[
    ("ts", TIMESTAMP_FIELD),
    ("time", TIMESTAMP_FIELD),
    ("@timestamp", TIMESTAMP_FIELD),
    ("Timestamp", TIMESTAMP_FIELD),
    ("lvl", LEVEL_FIELD),
    ("severity", LEVEL_FIELD),
    ("loglevel", LEVEL_FIELD),
    ("log_level", LEVEL_FIELD),
    ("msg", MESSAGE_FIELD),
    ("_msg", MESSAGE_FIELD),
    ("Message", MESSAGE_FIELD),
    ("source", CALLER_FIELD),
    ("src", CALLER_FIELD),
    ("stack", STACKTRACE_FIELD),
    ("stack_trace", STACKTRACE_FIELD),
    ("stackTrace", STACKTRACE_FIELD),
    ("err", ERROR_FIELD),
    ("Error", ERROR_FIELD),
];

const TRACING_ALIASES: &[(&str, &str)] = &[
    ("traceId", TRACE_ID_FIELD),
    ("traceID", TRACE_ID_FIELD),
    ("trace-id", TRACE_ID_FIELD),
    ("TraceID", TRACE_ID_FIELD),
    ("otel.trace_id", TRACE_ID_FIELD),
    ("spanId", SPAN_ID_FIELD),
    ("spanID", SPAN_ID_FIELD),
    ("span-id", SPAN_ID_FIELD),
    ("SpanID", SPAN_ID_FIELD),
    ("otel.span_id", SPAN_ID_FIELD),
    ("parentSpanId", PARENT_SPAN_ID_FIELD),
    ("parent-span-id", PARENT_SPAN_ID_FIELD),
    ("requestId", REQUEST_ID_FIELD),
    ("requestID", REQUEST_ID_FIELD),
    ("request-id", REQUEST_ID_FIELD),
    ("req_id", REQUEST_ID_FIELD),
];

static GLOBAL_MAPPER: Lazy<FieldMapper> = Lazy::new(FieldMapper::new);

/// Alias to canonical-name lookup
///
/// Read-only after construction. Loggers share the process-wide instance
/// returned by [`FieldMapper::global`].
#[derive(Debug, Clone)]
pub struct FieldMapper {
    table: HashMap<&'static str, &'static str>,
}

impl FieldMapper {
    pub fn new() -> Self {
        let table = CORE_ALIASES
            .iter()
            .chain(TRACING_ALIASES.iter())
            .copied()
            .collect();
        Self { table }
    }

    /// Shared instance used by every engine
    pub fn global() -> &'static FieldMapper {
        &GLOBAL_MAPPER
    }

    /// Canonical name for `name`, or `name` itself when it has no alias entry
    #[inline]
    pub fn standard_name<'a>(&self, name: &'a str) -> &'a str {
        self.table.get(name).copied().unwrap_or(name)
    }

    /// Key a user field is written under
    ///
    /// The canonical name, moved under [`RESERVED_PREFIX`] when it would
    /// collide with a key the record writes itself, so `msg` becomes
    /// `fields.message`.
    pub fn record_key(&self, name: &str) -> String {
        let name = self.standard_name(name);
        if RESERVED_FIELDS.contains(&name) {
            format!("{}{}", RESERVED_PREFIX, name)
        } else {
            name.to_string()
        }
    }

    /// Alias entries for timestamp, level, message, caller, stacktrace and error
    pub fn core_fields(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        CORE_ALIASES.iter().copied()
    }

    /// Alias entries for trace, span and request identifiers
    pub fn tracing_fields(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        TRACING_ALIASES.iter().copied()
    }

    /// Pair a flat key/value sequence and standardize its keys
    ///
    /// A trailing key without a value is kept and paired with `Null`. Keys
    /// go through [`record_key`](FieldMapper::record_key) and repeated keys
    /// are merged as in [`merge_fields`].
    pub fn standardize(&self, keys_and_values: &[FieldValue]) -> Fields {
        let mut fields = Vec::with_capacity((keys_and_values.len() + 1) / 2);
        merge_fields(
            &mut fields,
            keys_and_values.chunks(2).map(|pair| {
                let key = pair[0].as_key();
                let value = pair.get(1).cloned().unwrap_or(FieldValue::Null);
                (self.record_key(&key), value)
            }),
        );
        fields
    }

    /// Standardize keys of already-paired fields
    pub fn standardize_pairs<K, I>(&self, pairs: I) -> Fields
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        let mut fields = Vec::new();
        merge_fields(
            &mut fields,
            pairs
                .into_iter()
                .map(|(key, value)| (self.record_key(key.as_ref()), value)),
        );
        fields
    }
}

/// Add `additions` to `base`
///
/// A key already in `base` keeps its position and takes the new value, so
/// the last value for a key wins and every key appears once.
pub fn merge_fields<I>(base: &mut Fields, additions: I)
where
    I: IntoIterator<Item = (String, FieldValue)>,
{
    for (key, value) in additions {
        match base.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => base.push((key, value)),
        }
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_map_to_canonical_names() {
        let mapper = FieldMapper::new();
        assert_eq!(mapper.standard_name("ts"), "timestamp");
        assert_eq!(mapper.standard_name("@timestamp"), "timestamp");
        assert_eq!(mapper.standard_name("msg"), "message");
        assert_eq!(mapper.standard_name("traceId"), "trace_id");
        assert_eq!(mapper.standard_name("spanID"), "span_id");
        assert_eq!(mapper.standard_name("err"), "error");
    }

    #[test]
    fn test_unknown_names_pass_through() {
        let mapper = FieldMapper::new();
        assert_eq!(mapper.standard_name("user_id"), "user_id");
        assert_eq!(mapper.standard_name("timestamp"), "timestamp");
        assert_eq!(mapper.standard_name(""), "");
    }

    #[test]
    fn test_every_alias_target_is_canonical() {
        let mapper = FieldMapper::global();
        for (alias, target) in mapper.core_fields().chain(mapper.tracing_fields()) {
            assert_eq!(mapper.standard_name(alias), target);
            assert_eq!(mapper.standard_name(target), target);
        }
    }

    #[test]
    fn test_standardize_pairs_even_sequence() {
        let mapper = FieldMapper::new();
        let fields = mapper.standardize(&["traceId".into(), "abc".into(), "count".into(), 3.into()]);
        assert_eq!(
            fields,
            vec![
                ("trace_id".to_string(), FieldValue::from("abc")),
                ("count".to_string(), FieldValue::Int(3)),
            ]
        );
    }

    #[test]
    fn test_standardize_keeps_trailing_key() {
        let mapper = FieldMapper::new();
        let fields = mapper.standardize(&["user".into(), "alice".into(), "msg".into()]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1], ("fields.message".to_string(), FieldValue::Null));
    }

    #[test]
    fn test_reserved_names_move_under_prefix() {
        let mapper = FieldMapper::new();
        assert_eq!(mapper.record_key("msg"), "fields.message");
        assert_eq!(mapper.record_key("lvl"), "fields.level");
        assert_eq!(mapper.record_key("engine"), "fields.engine");
        assert_eq!(mapper.record_key("caller"), "fields.caller");
        assert_eq!(mapper.record_key("err"), "error");
        assert_eq!(mapper.record_key("traceId"), "trace_id");

        let once = mapper.record_key("msg");
        assert_eq!(mapper.record_key(&once), once);
    }

    #[test]
    fn test_repeated_keys_keep_first_position_last_value() {
        let mapper = FieldMapper::new();
        let fields = mapper.standardize(&[
            "a".into(),
            1.into(),
            "b".into(),
            2.into(),
            "a".into(),
            3.into(),
            "traceId".into(),
            "x".into(),
            "trace_id".into(),
            "y".into(),
        ]);
        assert_eq!(
            fields,
            vec![
                ("a".to_string(), FieldValue::Int(3)),
                ("b".to_string(), FieldValue::Int(2)),
                ("trace_id".to_string(), FieldValue::from("y")),
            ]
        );
    }

    #[test]
    fn test_merge_fields_overrides_in_place() {
        let mut base = vec![
            ("service".to_string(), FieldValue::from("api")),
            ("region".to_string(), FieldValue::from("eu")),
        ];
        merge_fields(
            &mut base,
            vec![
                ("region".to_string(), FieldValue::from("us")),
                ("attempt".to_string(), FieldValue::Int(2)),
            ],
        );
        assert_eq!(
            base,
            vec![
                ("service".to_string(), FieldValue::from("api")),
                ("region".to_string(), FieldValue::from("us")),
                ("attempt".to_string(), FieldValue::Int(2)),
            ]
        );
    }

    #[test]
    fn test_non_string_keys_are_rendered() {
        let mapper = FieldMapper::new();
        let fields = mapper.standardize(&[FieldValue::Int(7), "seven".into()]);
        assert_eq!(fields[0].0, "7");
    }
}
