//! Caller location and stack trace capture
//!
//! Public log methods are `#[track_caller]`, so the call site is known without
//! walking the stack. A backtrace is only resolved when extra frames must be
//! skipped or a stack trace is requested; the call site then anchors the walk.

use backtrace::Backtrace;
use std::panic::Location;

const MAX_STACK_FRAMES: usize = 32;
const CRATE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

#[derive(Debug)]
struct Frame {
    function: String,
    file: String,
    line: u32,
}

/// Caller and stack trace for one record
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CallSiteInfo {
    pub caller: Option<String>,
    pub stacktrace: Option<String>,
}

/// Resolve caller and/or stack trace for a call made at `location`
///
/// `skip` moves the reported caller that many frames further out. The skip
/// is counted from the frame matching `location`; when no resolved frame
/// carries file and line information (release builds without debuginfo) that
/// frame cannot be found, `skip` has no effect and the caller is `location`
/// itself, while the stack trace falls back to [`stacktrace`].
pub fn capture(
    location: &'static Location<'static>,
    skip: usize,
    want_caller: bool,
    want_stacktrace: bool,
) -> CallSiteInfo {
    if !want_stacktrace && (skip == 0 || !want_caller) {
        return CallSiteInfo {
            caller: want_caller.then(|| format_location(location)),
            stacktrace: None,
        };
    }

    let frames = resolved_frames();
    let start = anchor_index(&frames, location).map(|i| i + skip);

    let caller = want_caller.then(|| {
        start
            .and_then(|i| frames.get(i))
            .map(|f| format!("{}:{}", short_path(&f.file), f.line))
            .unwrap_or_else(|| format_location(location))
    });

    let stacktrace = want_stacktrace.then(|| {
        let outer: Vec<&Frame> = match start {
            Some(i) => frames.iter().skip(i).collect(),
            None => outside_frames(&frames),
        };
        format_frames(&outer)
    });

    CallSiteInfo { caller, stacktrace }
}

/// Stack trace of the current thread without this crate's own frames
///
/// For records whose call site is not a `#[track_caller]` location, such as
/// those forwarded from the `log` facade.
pub fn stacktrace() -> String {
    let frames = resolved_frames();
    format_frames(&outside_frames(&frames))
}

/// `dir/file.rs:42`
pub fn format_location(location: &Location<'_>) -> String {
    format!("{}:{}", short_path(location.file()), location.line())
}

/// Keep the last two path segments
pub fn short_path(file: &str) -> &str {
    let trimmed = file.trim_end_matches(['/', '\\']);
    let mut separators = trimmed.rmatch_indices(['/', '\\']);
    match (separators.next(), separators.next()) {
        (Some(_), Some((idx, _))) => &trimmed[idx + 1..],
        _ => trimmed,
    }
}

fn resolved_frames() -> Vec<Frame> {
    let backtrace = Backtrace::new();
    backtrace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .filter_map(|symbol| {
            let file = symbol.filename()?.to_string_lossy().replace('\\', "/");
            let line = symbol.lineno()?;
            let function = symbol
                .name()
                .map(|name| format!("{:#}", name))
                .unwrap_or_else(|| "<unknown>".to_string());
            Some(Frame { function, file, line })
        })
        .collect()
}

fn anchor_index(frames: &[Frame], location: &Location<'_>) -> Option<usize> {
    let wanted = location.file().replace('\\', "/");
    frames
        .iter()
        .position(|f| f.line == location.line() && (f.file.ends_with(&wanted) || wanted.ends_with(&f.file)))
}

fn outside_frames(frames: &[Frame]) -> Vec<&Frame> {
    frames
        .iter()
        .filter(|f| {
            !f.function.starts_with("backtrace::")
                && !f.function.starts_with("log::")
                && !f.function.starts_with(CRATE_PREFIX)
        })
        .collect()
}

fn format_frames(frames: &[&Frame]) -> String {
    frames
        .iter()
        .take(MAX_STACK_FRAMES)
        .map(|f| format!("{}\n\t{}:{}", f.function, short_path(&f.file), f.line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_path() {
        assert_eq!(short_path("src/main.rs"), "src/main.rs");
        assert_eq!(short_path("/root/crate/tests/integration_tests.rs"), "tests/integration_tests.rs");
        assert_eq!(short_path("C:\\work\\app\\src\\lib.rs"), "src\\lib.rs");
        assert_eq!(short_path("lib.rs"), "lib.rs");
    }

    #[test]
    fn test_caller_without_skip_uses_location() {
        let location = Location::caller();
        let info = capture(location, 0, true, false);
        assert_eq!(info.caller, Some(format_location(location)));
        assert_eq!(info.stacktrace, None);
    }

    #[test]
    fn test_nothing_requested() {
        let info = capture(Location::caller(), 3, false, false);
        assert_eq!(info, CallSiteInfo::default());
    }

    #[test]
    fn test_stacktrace_is_captured() {
        let info = capture(Location::caller(), 0, true, true);
        let trace = info.stacktrace.expect("stack trace requested");
        assert!(!trace.is_empty());
        assert!(info.caller.unwrap().contains(':'));
    }

    #[test]
    fn test_frames_without_location_leave_no_anchor() {
        let location = Location::caller();
        let frames = vec![Frame {
            function: "main".to_string(),
            file: "src/other.rs".to_string(),
            line: location.line(),
        }];
        assert_eq!(anchor_index(&frames, location), None);
        assert_eq!(anchor_index(&[], location), None);
    }

    #[test]
    fn test_unanchored_stacktrace_skips_own_frames() {
        let trace = stacktrace();
        for function in trace.lines().filter(|l| !l.starts_with('\t')) {
            assert!(!function.starts_with("backtrace::"));
        }
    }
}
