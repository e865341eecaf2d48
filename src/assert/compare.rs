//! Value comparison for the verifier.
//!
//! Operands arrive type-erased as [`Operand`]s. Equality is the operand
//! type's own `PartialEq`, reached through an `Any` downcast, with two
//! special cases layered on top: the absence-of-value sentinel and byte
//! sequences. Mismatches are rendered with bounded length so a large payload
//! never produces an unbounded report.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use difference::{Changeset, Difference};
use serde_json::{Number, Value};
use thiserror::Error;

/// Upper bound, in bytes, on a single rendered operand.
pub const MAX_RENDER_LEN: usize = 64 * 1024 - 100;

const TRUNCATED_SUFFIX: &str = "<... truncated>";
const NIL: &str = "<nil>";

// ============================================================================
// OPERANDS
// ============================================================================

/// A value the verifier can compare and render without knowing its type.
///
/// Blanket-implemented for every `PartialEq + Debug + 'static` type.
pub trait Comparable: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
    /// Equality with another comparable; values of different types are never equal.
    fn dyn_eq(&self, other: &dyn Comparable) -> bool;
}

impl<T> Comparable for T
where
    T: PartialEq + fmt::Debug + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn dyn_eq(&self, other: &dyn Comparable) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// One side of an equality check.
#[derive(Clone, Copy)]
pub enum Operand<'a> {
    /// The absence of any value.
    Nil,
    Value(&'a dyn Comparable),
}

impl<'a> Operand<'a> {
    pub fn of<T: Comparable>(value: &'a T) -> Self {
        Operand::Value(value)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Operand::Nil)
    }

    fn type_name(&self) -> &'static str {
        match *self {
            Operand::Nil => NIL,
            Operand::Value(value) => value.type_name(),
        }
    }
}

impl<'a, T: Comparable> From<&'a T> for Operand<'a> {
    fn from(value: &'a T) -> Self {
        Operand::Value(value)
    }
}

impl fmt::Debug for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Nil => f.write_str(NIL),
            Operand::Value(value) => fmt::Debug::fmt(*value, f),
        }
    }
}

// ============================================================================
// EQUALITY
// ============================================================================

/// Raised when an operand cannot take part in an equality check at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot take func type as argument")]
pub struct InvalidOperation;

/// Rejects function operands; two absent operands are always valid.
pub fn validate_equal_args(expected: Operand<'_>, actual: Operand<'_>) -> Result<(), InvalidOperation> {
    if expected.is_nil() && actual.is_nil() {
        return Ok(());
    }
    if is_function(expected) || is_function(actual) {
        return Err(InvalidOperation);
    }
    Ok(())
}

fn is_function(operand: Operand<'_>) -> bool {
    match operand {
        Operand::Nil => false,
        Operand::Value(value) => is_function_type(value.type_name()),
    }
}

fn is_function_type(name: &str) -> bool {
    // Higher-ranked pointers render as `for<'a> fn(&'a T)`.
    let name = match name.strip_prefix("for<") {
        Some(rest) => rest.split_once("> ").map_or(rest, |(_, pointer)| pointer),
        None => name,
    };
    name.starts_with("fn(") || name.starts_with("unsafe ") || name.starts_with("extern ")
}

/// Structural equality with the absent-value and byte-sequence special cases.
///
/// Absent and present-but-empty byte sequences are deliberately not equal;
/// only two absent sequences are.
pub fn objects_are_equal(expected: Operand<'_>, actual: Operand<'_>) -> bool {
    let (expected, actual) = match (expected, actual) {
        (Operand::Nil, Operand::Nil) => return true,
        (Operand::Nil, _) | (_, Operand::Nil) => return false,
        (Operand::Value(expected), Operand::Value(actual)) => (expected, actual),
    };

    let Some(exp) = byte_view(expected) else {
        return expected.dyn_eq(actual);
    };
    let Some(act) = byte_view(actual) else {
        return false;
    };
    match (exp, act) {
        (Some(exp), Some(act)) => exp == act,
        (exp, act) => exp.is_none() && act.is_none(),
    }
}

/// `Some(None)` is an absent byte sequence, `None` is not a byte sequence.
fn byte_view(value: &dyn Comparable) -> Option<Option<&[u8]>> {
    let any = value.as_any();
    if let Some(bytes) = any.downcast_ref::<Vec<u8>>() {
        return Some(Some(bytes.as_slice()));
    }
    if let Some(bytes) = any.downcast_ref::<&'static [u8]>() {
        return Some(Some(*bytes));
    }
    if let Some(bytes) = any.downcast_ref::<Box<[u8]>>() {
        return Some(Some(&bytes[..]));
    }
    if let Some(bytes) = any.downcast_ref::<Option<Vec<u8>>>() {
        return Some(bytes.as_deref());
    }
    if let Some(bytes) = any.downcast_ref::<Option<&'static [u8]>>() {
        return Some(*bytes);
    }
    None
}

// ============================================================================
// MISMATCH RENDERING
// ============================================================================

/// Renders both sides of a failed comparison.
///
/// Values of different types are annotated as `Type(value)`, durations use
/// their human-readable form, everything else its bounded `Debug` form.
pub fn format_unequal_values(expected: Operand<'_>, actual: Operand<'_>) -> (String, String) {
    let (expected_type, actual_type) = (expected.type_name(), actual.type_name());
    if expected_type != actual_type {
        return (
            format!("{}({})", short_type_name(expected_type), truncating_format(expected)),
            format!("{}({})", short_type_name(actual_type), truncating_format(actual)),
        );
    }
    if let (Some(expected), Some(actual)) = (as_duration(expected), as_duration(actual)) {
        return (format!("{expected:?}"), format!("{actual:?}"));
    }
    (truncating_format(expected), truncating_format(actual))
}

fn as_duration(operand: Operand<'_>) -> Option<Duration> {
    match operand {
        Operand::Nil => None,
        Operand::Value(value) => value.as_any().downcast_ref::<Duration>().copied(),
    }
}

/// Single-line `Debug` rendering, cut to [`MAX_RENDER_LEN`].
pub fn truncating_format(operand: Operand<'_>) -> String {
    truncate(format!("{operand:?}"), MAX_RENDER_LEN)
}

fn truncate(mut value: String, max: usize) -> String {
    if value.len() <= max {
        return value;
    }
    let mut cut = max;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    value.truncate(cut);
    value.push_str(TRUNCATED_SUFFIX);
    value
}

/// Strips module qualification from every path in a type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name(name: &str) -> String {
    let mut short = String::with_capacity(name.len());
    let mut segment_start = 0;
    let mut rest = name;
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("::") {
            short.truncate(segment_start);
            rest = after;
            continue;
        }
        short.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = short.len();
        }
        rest = &rest[c.len_utf8()..];
    }
    short
}

/// Line diff appended to a `Not equal` message.
///
/// Empty unless both operands share a type and are text or render to more
/// than one line; also empty when either side is too large to render fully.
pub fn diff(expected: Operand<'_>, actual: Operand<'_>) -> String {
    let (Operand::Value(expected), Operand::Value(actual)) = (expected, actual) else {
        return String::new();
    };
    if expected.type_name() != actual.type_name() {
        return String::new();
    }

    let (expected, actual) = match (text_view(expected), text_view(actual)) {
        (Some(expected), Some(actual)) => (expected.to_owned(), actual.to_owned()),
        _ => {
            let (expected, actual) = (format!("{expected:#?}"), format!("{actual:#?}"));
            if !expected.contains('\n') && !actual.contains('\n') {
                return String::new();
            }
            (expected, actual)
        }
    };
    if expected.len() > MAX_RENDER_LEN || actual.len() > MAX_RENDER_LEN {
        return String::new();
    }

    let changeset = Changeset::new(&expected, &actual, "\n");
    let mut out = String::from("\n\nDiff:\n--- Expected\n+++ Actual\n");
    for change in &changeset.diffs {
        let (marker, text) = match change {
            Difference::Same(text) => (' ', text),
            Difference::Add(text) => ('+', text),
            Difference::Rem(text) => ('-', text),
        };
        for line in text.split('\n') {
            out.push(marker);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn text_view(value: &dyn Comparable) -> Option<&str> {
    let any = value.as_any();
    any.downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| any.downcast_ref::<&'static str>().copied())
}

// ============================================================================
// JSON
// ============================================================================

/// Parses text into an untyped JSON tree with every number widened to `f64`,
/// so `1` and `1.0` compare equal.
pub fn parse_json(text: &str) -> Result<Value, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(normalize_numbers(value))
}

fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(number) => match number.as_f64().and_then(Number::from_f64) {
            Some(widened) => Value::Number(widened),
            None => Value::Number(number),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_numbers(value)))
                .collect(),
        ),
        other => other,
    }
}
