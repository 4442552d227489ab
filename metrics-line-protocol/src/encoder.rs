use thiserror::Error;
use tracing::{trace, warn};

use crate::{measurement::write_line_parts, LineUnit, Measurement, Tags, Value};

/// Errors that could occur while encoding a measurement in strict mode.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EncodeError {
    /// The measurement name is empty.
    #[error("measurement name is empty")]
    EmptyName,

    /// The measurement has no fields, which the line protocol requires at least one of.
    #[error("measurement '{measurement}' has no fields")]
    NoFields {
        /// Name of the measurement.
        measurement: String,
    },

    /// A tag or field has an empty key.
    #[error("measurement '{measurement}' has a tag or field with an empty key")]
    EmptyKey {
        /// Name of the measurement.
        measurement: String,
    },

    /// A tag has an empty value.
    #[error("tag '{key}' has an empty value")]
    EmptyTagValue {
        /// Key of the tag.
        key: String,
    },

    /// A float field is `NaN` or infinite.
    #[error("field '{key}' is not a finite number")]
    NonFiniteField {
        /// Key of the field.
        key: String,
    },

    /// A text field contains a double quote, which would terminate the quoted value early.
    #[error("text field '{key}' contains a double quote")]
    QuoteInTextField {
        /// Key of the field.
        key: String,
    },

    /// The name, a key, or a value contains a line break, which would split the line in two.
    #[error("{part} contains a line break")]
    LineBreak {
        /// Description of where the line break was found.
        part: String,
    },

    /// The name, a key, or a value ends with a backslash, which would escape the separator written after it.
    #[error("{part} ends with a backslash")]
    TrailingBackslash {
        /// Description of where the backslash was found.
        part: String,
    },
}

/// Timestamp precision.
///
/// Measurements always hold nanosecond timestamps; the precision controls how they are scaled when written. The
/// ingestion endpoint must be told the same precision.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Precision {
    /// Nanoseconds.
    #[default]
    Nanoseconds,

    /// Microseconds.
    Microseconds,

    /// Milliseconds.
    Milliseconds,

    /// Seconds.
    Seconds,
}

impl Precision {
    /// Returns the short name of this precision, as used by the ingestion endpoint's `precision` parameter.
    pub const fn as_str(self) -> &'static str {
        match self {
            Precision::Nanoseconds => "ns",
            Precision::Microseconds => "us",
            Precision::Milliseconds => "ms",
            Precision::Seconds => "s",
        }
    }

    /// Scales a nanosecond timestamp to this precision, truncating towards zero.
    pub const fn scale(self, nanos: i64) -> i64 {
        match self {
            Precision::Nanoseconds => nanos,
            Precision::Microseconds => nanos / 1_000,
            Precision::Milliseconds => nanos / 1_000_000,
            Precision::Seconds => nanos / 1_000_000_000,
        }
    }
}

/// How invalid measurements are handled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationMode {
    /// Problems are logged, and the line is written anyway.
    #[default]
    Lenient,

    /// Problems are returned as errors, and nothing is written.
    Strict,
}

/// Encodes measurements with a fixed configuration.
///
/// Created with [`LineEncoderBuilder`][crate::LineEncoderBuilder]. The default encoder writes exactly what
/// [`Measurement::line`] does.
#[derive(Clone, Debug, Default)]
pub struct LineEncoder {
    pub(crate) precision: Precision,
    pub(crate) global_tags: Tags,
    pub(crate) validation: ValidationMode,
}

impl LineEncoder {
    /// Timestamp precision used by this encoder.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Tags added to every measurement by this encoder.
    pub fn global_tags(&self) -> &Tags {
        &self.global_tags
    }

    /// Validation mode used by this encoder.
    pub fn validation_mode(&self) -> ValidationMode {
        self.validation
    }

    /// Encodes the given measurement as a line.
    ///
    /// # Errors
    ///
    /// In strict mode, if the measurement would produce a line the ingestion endpoint rejects, an error describing the
    /// first problem found is returned.
    pub fn encode(&self, measurement: &Measurement) -> Result<String, EncodeError> {
        let mut buffer = String::new();
        self.encode_into(measurement, &mut buffer)?;
        Ok(buffer)
    }

    /// Encodes the given measurement as a line, writing it to the end of `buffer`.
    ///
    /// No trailing newline is written. Global tags are merged into the measurement's tags, with the measurement's own
    /// tags taking priority when keys collide.
    ///
    /// # Errors
    ///
    /// In strict mode, if the measurement would produce a line the ingestion endpoint rejects, an error describing the
    /// first problem found is returned, and `buffer` is left unchanged.
    pub fn encode_into(&self, measurement: &Measurement, buffer: &mut String) -> Result<(), EncodeError> {
        let problems = find_problems(measurement);
        match self.validation {
            ValidationMode::Strict => {
                if let Some(e) = problems.into_iter().next() {
                    return Err(e);
                }
            }
            ValidationMode::Lenient => {
                for e in &problems {
                    warn!(measurement = measurement.name(), error = %e, "Encoding invalid measurement.");
                }
            }
        }

        let own_tags = measurement.tags();
        let global_tags = self
            .global_tags
            .iter()
            .filter(|tag| !own_tags.is_some_and(|tags| tags.contains_key(tag.key())));

        let start = buffer.len();
        // Writing to a `String` never fails.
        let _ = write_line_parts(
            buffer,
            measurement.name(),
            own_tags.into_iter().flatten().chain(global_tags),
            measurement.fields().into_iter().flatten(),
            measurement.timestamp().map(|ts| self.precision.scale(ts)),
        );
        trace!(measurement = measurement.name(), line_len = buffer.len() - start, "Encoded measurement.");

        Ok(())
    }
}

fn find_problems(measurement: &Measurement) -> Vec<EncodeError> {
    let mut problems = Vec::new();
    let name = measurement.name();

    if name.is_empty() {
        problems.push(EncodeError::EmptyName);
    }
    check_text(&mut problems, || format!("measurement name '{}'", name.escape_debug()), name);

    if !measurement.fields().is_some_and(|fields| !fields.is_empty()) {
        problems.push(EncodeError::NoFields { measurement: name.to_string() });
    }

    let tags = measurement.tags().into_iter().flatten();
    let fields = measurement.fields().into_iter().flatten();
    let mut empty_key = false;

    for tag in tags {
        let key = tag.key();
        empty_key |= key.is_empty();
        check_text(&mut problems, || format!("tag key '{}'", key.escape_debug()), key);
        if let Value::Text(s) | Value::Raw(s) = tag.value() {
            if s.is_empty() {
                problems.push(EncodeError::EmptyTagValue { key: key.to_string() });
            }
            check_text(&mut problems, || format!("value of tag '{}'", key.escape_debug()), s);
        }
    }

    for field in fields {
        let key = field.key();
        empty_key |= key.is_empty();
        check_text(&mut problems, || format!("field key '{}'", key.escape_debug()), key);
        match field.value() {
            Value::Float(f) if !f.is_finite() => {
                problems.push(EncodeError::NonFiniteField { key: key.to_string() });
            }
            Value::Text(s) => {
                if s.contains('"') {
                    problems.push(EncodeError::QuoteInTextField { key: key.to_string() });
                }
                check_text(&mut problems, || format!("value of field '{}'", key.escape_debug()), s);
            }
            Value::Raw(s) => {
                check_text(&mut problems, || format!("value of field '{}'", key.escape_debug()), s);
            }
            _ => {}
        }
    }

    if empty_key {
        problems.push(EncodeError::EmptyKey { measurement: name.to_string() });
    }

    problems
}

// Backslashes are never escaped, so a trailing one swallows whatever separator or quote is written next.
fn check_text<F>(problems: &mut Vec<EncodeError>, part: F, s: &str)
where
    F: Fn() -> String,
{
    if has_line_break(s) {
        problems.push(EncodeError::LineBreak { part: part() });
    }
    if s.ends_with('\\') {
        problems.push(EncodeError::TrailingBackslash { part: part() });
    }
}

pub(crate) fn has_line_break(s: &str) -> bool {
    s.contains(&['\n', '\r'][..])
}
