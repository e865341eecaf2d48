//! Locates the user-code call site of a failed assertion.
//!
//! The locator walks the call stack outwards from the point of failure,
//! drops frames that belong to assertion machinery, and stops at the test
//! function itself or at the test runner's dispatch routine. Stack access is
//! behind the [`StackWalker`] trait; [`BacktraceWalker`] is the production
//! implementation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

/// One resolved stack frame. Missing fields mark an unreadable frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub function: Option<String>,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
}

impl Frame {
    pub fn new(function: impl Into<String>, file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            function: Some(function.into()),
            file: Some(file.into()),
            line: Some(line),
        }
    }
}

/// Source of stack frames, innermost first.
pub trait StackWalker: Send + Sync {
    fn frames(&self) -> Vec<Frame>;
}

/// Walks the live call stack with the `backtrace` crate.
///
/// Frames belonging to the walker itself are dropped, so the first frame
/// returned is the walker's caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceWalker;

impl StackWalker for BacktraceWalker {
    fn frames(&self) -> Vec<Frame> {
        let mut frames = Vec::new();
        backtrace::trace(|raw| {
            let mut resolved = false;
            backtrace::resolve_frame(raw, |symbol| {
                resolved = true;
                frames.push(Frame {
                    function: symbol.name().map(|name| format!("{name:#}")),
                    file: symbol.filename().map(Path::to_path_buf),
                    line: symbol.lineno(),
                });
            });
            if !resolved {
                frames.push(Frame::default());
            }
            true
        });

        let start = frames
            .iter()
            .rposition(|frame| frame.function.as_deref().is_some_and(is_walker_frame))
            .map_or(0, |index| index + 1);
        frames.split_off(start)
    }
}

fn is_walker_frame(function: &str) -> bool {
    function.starts_with("backtrace::") || function.contains("BacktraceWalker")
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tables that decide which frames belong in an error trace.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Directories holding assertion machinery; their frames are hidden.
    pub internal_dirs: Vec<String>,
    /// File names shown even when they sit in an internal directory.
    pub fixture_files: Vec<String>,
    /// Test runner routines that end the walk.
    pub runner_entry_points: Vec<String>,
    /// Function name prefixes marking a top-level test function.
    pub test_prefixes: Vec<String>,
    /// Path fragments of toolchain and dependency sources; skipped, not fatal.
    pub skipped_path_markers: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        };
        Self {
            internal_dirs: owned(&["assert", "mock", "require"]),
            fixture_files: owned(&["mock_test.rs"]),
            runner_entry_points: owned(&[
                "test::__rust_begin_short_backtrace",
                "test::run_test_in_process",
                "test::run_test",
            ]),
            test_prefixes: owned(&["test", "bench", "example"]),
            skipped_path_markers: owned(&["/rustc/", "/.cargo/registry/"]),
        }
    }
}

impl LocatorConfig {
    fn is_autogenerated(&self, file: &Path, function: &str) -> bool {
        file == Path::new("<autogenerated>") || function.contains("{{vtable.shim}}")
    }

    fn is_runner_entry(&self, function: &str) -> bool {
        self.runner_entry_points.iter().any(|entry| {
            function == entry.as_str()
                || function
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with("::<") || rest.starts_with('<'))
        })
    }

    fn is_test_function(&self, short_name: &str) -> bool {
        self.test_prefixes
            .iter()
            .any(|prefix| is_test(short_name, prefix))
    }

    fn is_skipped_path(&self, file: &Path) -> bool {
        let path = file.to_string_lossy().replace('\\', "/");
        self.skipped_path_markers
            .iter()
            .any(|marker| path.contains(marker.as_str()))
    }

    /// `basename:line` for a frame that belongs in the trace.
    fn call_site(&self, file: &Path, line: u32) -> Option<String> {
        let base = file.file_name()?.to_string_lossy();
        let dir = file.parent().and_then(Path::file_name)?.to_string_lossy();
        if self.is_skipped_path(file) {
            return None;
        }
        let internal = self.internal_dirs.iter().any(|d| *d == dir);
        if internal && !self.fixture_files.iter().any(|f| *f == base) {
            return None;
        }
        Some(format!("{base}:{line}"))
    }
}

// ============================================================================
// LOCATOR
// ============================================================================

/// Produces the `file:line` chain for the "Error Trace" report entry.
#[derive(Clone)]
pub struct CallerLocator {
    walker: Arc<dyn StackWalker>,
    config: LocatorConfig,
}

impl CallerLocator {
    pub fn new(walker: impl StackWalker + 'static, config: LocatorConfig) -> Self {
        Self {
            walker: Arc::new(walker),
            config,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Call sites from the assertion outwards, up to and including the test
    /// function, never past the runner's dispatch routine.
    pub fn caller_info(&self) -> Vec<String> {
        let mut callers = Vec::new();
        for frame in self.walker.frames() {
            let (Some(file), Some(line), Some(function)) =
                (frame.file.as_deref(), frame.line, frame.function.as_deref())
            else {
                trace!("stopping at unreadable frame");
                break;
            };
            if self.config.is_autogenerated(file, function) {
                trace!(function, "stopping at autogenerated frame");
                break;
            }
            if self.config.is_runner_entry(function) {
                trace!(function, "stopping at test runner");
                break;
            }

            match self.config.call_site(file, line) {
                Some(site) => {
                    trace!(function, %site, "frame included");
                    callers.push(site);
                }
                None => trace!(function, file = %file.display(), "frame hidden"),
            }

            if self.config.is_test_function(&short_name(function)) {
                break;
            }
        }
        callers
    }
}

impl Default for CallerLocator {
    fn default() -> Self {
        Self::new(BacktraceWalker, LocatorConfig::default())
    }
}

impl fmt::Debug for CallerLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerLocator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// NAME HELPERS
// ============================================================================

/// Final path segment of a function name, without generic arguments or
/// closure markers: `<a::B<T> as c::D>::run::{{closure}}` becomes `run`.
pub fn short_name(function: &str) -> String {
    // Generic arguments can hold `::` themselves, so drop them first.
    strip_generics(function)
        .rsplit("::")
        .find(|segment| !segment.is_empty() && !segment.starts_with("{{"))
        .unwrap_or_default()
        .to_owned()
}

fn strip_generics(function: &str) -> String {
    let mut plain = String::with_capacity(function.len());
    let mut depth = 0usize;
    let mut previous = '\0';
    for c in function.chars() {
        match c {
            '<' => depth += 1,
            // `->` inside `fn() -> T` does not close anything.
            '>' if previous != '-' => depth = depth.saturating_sub(1),
            _ if depth == 0 => plain.push(c),
            _ => {}
        }
        previous = c;
    }
    plain
}

/// Whether `name` follows the test naming convention for `prefix`: the
/// prefix alone, or the prefix followed by anything but a lowercase letter.
pub fn is_test(name: &str, prefix: &str) -> bool {
    let Some(rest) = name.strip_prefix(prefix) else {
        return false;
    };
    rest.chars().next().map_or(true, |c| !c.is_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStack(Vec<Frame>);

    impl StackWalker for FixedStack {
        fn frames(&self) -> Vec<Frame> {
            self.0.clone()
        }
    }

    fn locate_in(frames: Vec<Frame>) -> Vec<String> {
        CallerLocator::new(FixedStack(frames), LocatorConfig::default()).caller_info()
    }

    #[test]
    fn stops_at_test_function() {
        let callers = locate_in(vec![
            Frame::new("spectest::assert::verifier::DefaultVerifier::fail", "/src/spectest/src/assert/verifier.rs", 80),
            Frame::new("api::helpers::check_body", "/work/api/tests/helpers.rs", 12),
            Frame::new("api::helpers::check_response", "/work/api/tests/helpers.rs", 30),
            Frame::new("api::helpers::run_checks", "/work/api/tests/helpers.rs", 44),
            Frame::new("api::tests::test_get_user", "/work/api/tests/user.rs", 9),
            Frame::new("api::tests::after_test", "/work/api/tests/user.rs", 99),
        ]);
        assert_eq!(
            callers,
            vec!["helpers.rs:12", "helpers.rs:30", "helpers.rs:44", "user.rs:9"]
        );
    }

    #[test]
    fn stops_before_runner_dispatch() {
        let callers = locate_in(vec![
            Frame::new("api::checks::status_matches", "/work/api/tests/checks.rs", 5),
            Frame::new("test::__rust_begin_short_backtrace", "/work/std/test/lib.rs", 600),
            Frame::new("api::never_reached", "/work/api/tests/checks.rs", 1),
        ]);
        assert_eq!(callers, vec!["checks.rs:5"]);
    }

    #[test]
    fn runner_dispatch_with_generic_arguments() {
        let config = LocatorConfig::default();
        assert!(config.is_runner_entry("test::__rust_begin_short_backtrace::<fn()>"));
        assert!(config.is_runner_entry("test::run_test"));
        assert!(!config.is_runner_entry("test::run_test_suite"));
    }

    #[test]
    fn stops_at_autogenerated_or_unreadable_frames() {
        let callers = locate_in(vec![
            Frame::new("api::a", "/work/api/src/a.rs", 1),
            Frame::new("api::b", "<autogenerated>", 2),
            Frame::new("api::c", "/work/api/src/c.rs", 3),
        ]);
        assert_eq!(callers, vec!["a.rs:1"]);

        let callers = locate_in(vec![
            Frame::new("api::a", "/work/api/src/a.rs", 1),
            Frame::default(),
            Frame::new("api::c", "/work/api/src/c.rs", 3),
        ]);
        assert_eq!(callers, vec!["a.rs:1"]);
    }

    #[test]
    fn hides_internal_directories_except_fixtures() {
        let callers = locate_in(vec![
            Frame::new("spectest::assert::x", "/src/spectest/src/assert/verifier.rs", 1),
            Frame::new("spectest::mock::y", "/src/spectest/src/mock/mod.rs", 2),
            Frame::new("spectest::mock::mock_test::z", "/src/spectest/src/mock/mock_test.rs", 3),
            Frame::new("helpers::require_ok", "/work/require/lib.rs", 4),
            Frame::new("api::test_x", "/work/api/tests/api.rs", 5),
        ]);
        assert_eq!(callers, vec!["mock_test.rs:3", "api.rs:5"]);
    }

    #[test]
    fn bare_file_names_are_never_included() {
        let callers = locate_in(vec![
            Frame::new("api::a", "a.rs", 1),
            Frame::new("api::test_b", "/work/api/b.rs", 2),
        ]);
        assert_eq!(callers, vec!["b.rs:2"]);
    }

    #[test]
    fn toolchain_frames_are_skipped_without_stopping() {
        let callers = locate_in(vec![
            Frame::new("api::check", "/work/api/tests/api.rs", 7),
            Frame::new(
                "core::ops::function::FnOnce::call_once",
                "/rustc/abc123/library/core/src/ops/function.rs",
                250,
            ),
            Frame::new("api::outer", "/work/api/tests/api.rs", 20),
            Frame::new("test::run_test", "/rustc/abc123/library/test/src/lib.rs", 1),
        ]);
        assert_eq!(callers, vec!["api.rs:7", "api.rs:20"]);
    }

    #[test]
    fn vtable_shims_stop_the_walk() {
        let callers = locate_in(vec![
            Frame::new("api::a", "/work/api/src/a.rs", 1),
            Frame::new(
                "core::ops::function::FnOnce::call_once{{vtable.shim}}",
                "/work/api/src/shim.rs",
                2,
            ),
            Frame::new("api::c", "/work/api/src/c.rs", 3),
        ]);
        assert_eq!(callers, vec!["a.rs:1"]);
    }

    #[test]
    fn registry_frames_are_skipped_without_stopping() {
        let callers = locate_in(vec![
            Frame::new("api::check", "/work/api/tests/api.rs", 7),
            Frame::new(
                "serde_json::de::from_str",
                "/home/ci/.cargo/registry/src/index.crates.io-6f17d22bba15001f/serde_json-1.0.120/src/de.rs",
                2_680,
            ),
            Frame::new(
                "serde_json::de::from_trait",
                r"C:\Users\ci\.cargo\registry\src\index.crates.io-6f17d22bba15001f\serde_json-1.0.120\src\de.rs",
                2_650,
            ),
            Frame::new("api::test_parse", "/work/api/tests/api.rs", 20),
        ]);
        assert_eq!(callers, vec!["api.rs:7", "api.rs:20"]);

        let config = LocatorConfig::default();
        assert!(config.is_skipped_path(Path::new(
            r"C:\Users\ci\.cargo\registry\src\serde_json-1.0.120\src\de.rs"
        )));
        assert!(!config.is_skipped_path(Path::new(r"C:\work\api\tests\api.rs")));
    }

    #[test]
    fn injected_config_is_used_for_the_walk() {
        let config = LocatorConfig {
            internal_dirs: vec!["helpers".to_string()],
            ..LocatorConfig::default()
        };
        let locator = CallerLocator::new(
            FixedStack(vec![
                Frame::new("api::helpers::check", "/work/api/helpers/check.rs", 3),
                Frame::new("api::test_login", "/work/api/tests/login.rs", 9),
            ]),
            config,
        );
        assert_eq!(locator.config().internal_dirs, vec!["helpers"]);
        assert_eq!(locator.caller_info(), vec!["login.rs:9"]);
    }

    #[test]
    fn closures_count_as_their_enclosing_function() {
        let callers = locate_in(vec![
            Frame::new("api::tests::test_login::{{closure}}", "/work/api/tests/login.rs", 14),
            Frame::new("api::tests::outer", "/work/api/tests/login.rs", 40),
        ]);
        assert_eq!(callers, vec!["login.rs:14"]);
    }

    #[test]
    fn short_names() {
        assert_eq!(short_name("api::tests::test_login"), "test_login");
        assert_eq!(short_name("api::tests::test_login::{{closure}}"), "test_login");
        assert_eq!(
            short_name("<api::Client<alloc::string::String> as api::Check>::run"),
            "run"
        );
        assert_eq!(short_name("api::make<fn() -> u8>::build"), "build");
        assert_eq!(short_name("main"), "main");
    }

    #[test]
    fn test_naming_convention() {
        assert!(is_test("test", "test"));
        assert!(is_test("test_login", "test"));
        assert!(is_test("testLogin", "test"));
        assert!(is_test("test2", "test"));
        assert!(!is_test("testing_helper", "test"));
        assert!(!is_test("latest", "test"));
        assert!(is_test("bench_parse", "bench"));
        assert!(!is_test("benchmarks", "bench"));
        assert!(is_test("example", "example"));
    }
}
