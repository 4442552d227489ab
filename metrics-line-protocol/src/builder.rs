use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::{
    encoder::{has_line_break, LineEncoder, Precision, ValidationMode},
    LineUnit, Tag, Tags, Value,
};

/// Errors that could occur while building a [`LineEncoder`].
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// A global tag can never be written correctly.
    #[error("invalid global tag '{key}': {reason}")]
    InvalidGlobalTag {
        /// Key of the tag.
        key: String,

        /// Details about why the tag is invalid.
        reason: &'static str,
    },

    /// Two global tags were configured with the same key.
    #[error("global tag '{key}' was specified more than once")]
    DuplicateGlobalTag {
        /// Key of the tag.
        key: String,
    },
}

/// Builder for a [`LineEncoder`].
#[derive(Default)]
pub struct LineEncoderBuilder {
    precision: Precision,
    global_tags: Vec<Tag>,
    validation: ValidationMode,
}

impl LineEncoderBuilder {
    /// Set the timestamp precision.
    ///
    /// Timestamps are scaled down from nanoseconds to this precision when written, truncating any remainder. The
    /// ingestion endpoint must be configured with the same precision.
    ///
    /// Defaults to [`Precision::Nanoseconds`].
    #[must_use]
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Add a tag to every encoded measurement.
    ///
    /// If a measurement already carries a tag with the same key, the measurement's own tag is written instead.
    #[must_use]
    pub fn with_global_tag<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.global_tags.push(Tag::new(key, value));
        self
    }

    /// Add tags to every encoded measurement.
    ///
    /// See [`with_global_tag`][Self::with_global_tag] for details.
    #[must_use]
    pub fn with_global_tags<T: Into<Tags>>(mut self, tags: T) -> Self {
        let tags: Tags = tags.into();
        self.global_tags.extend(tags);
        self
    }

    /// Set the validation mode.
    ///
    /// See [`ValidationMode`] for details.
    ///
    /// Defaults to [`ValidationMode::Lenient`].
    #[must_use]
    pub fn with_validation_mode(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    /// Builds the encoder.
    ///
    /// # Errors
    ///
    /// If a global tag has an empty key or value, contains a line break, ends with a backslash, or shares its key with
    /// another global tag, an error will be returned.
    pub fn build(self) -> Result<LineEncoder, BuildError> {
        let mut seen = HashSet::with_capacity(self.global_tags.len());
        for tag in &self.global_tags {
            let key = tag.key();
            let invalid = |reason| BuildError::InvalidGlobalTag { key: key.to_string(), reason };

            if key.is_empty() {
                return Err(invalid("key is empty"));
            }
            if has_line_break(key) {
                return Err(invalid("key contains a line break"));
            }
            if key.ends_with('\\') {
                return Err(invalid("key ends with a backslash"));
            }
            match tag.value() {
                Value::Text(s) | Value::Raw(s) if s.is_empty() => return Err(invalid("value is empty")),
                Value::Text(s) | Value::Raw(s) if has_line_break(s) => {
                    return Err(invalid("value contains a line break"))
                }
                Value::Text(s) | Value::Raw(s) if s.ends_with('\\') => {
                    return Err(invalid("value ends with a backslash"))
                }
                _ => {}
            }
            if !seen.insert(key) {
                return Err(BuildError::DuplicateGlobalTag { key: key.to_string() });
            }
        }

        debug!(
            precision = self.precision.as_str(),
            global_tags = self.global_tags.len(),
            validation = ?self.validation,
            "Built line encoder."
        );

        Ok(LineEncoder {
            precision: self.precision,
            global_tags: Tags::from(self.global_tags),
            validation: self.validation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildError, LineEncoderBuilder};
    use crate::{Precision, Tags, ValidationMode, Value};

    #[test]
    fn test_defaults() {
        let encoder = LineEncoderBuilder::default().build().expect("failed to build encoder");
        assert_eq!(encoder.precision(), Precision::Nanoseconds);
        assert_eq!(encoder.validation_mode(), ValidationMode::Lenient);
        assert!(encoder.global_tags().is_empty());
    }

    #[test]
    fn test_global_tags_accumulate() {
        let encoder = LineEncoderBuilder::default()
            .with_global_tag("host", "a")
            .with_global_tags(Tags::from_iter([("region", "us-west"), ("az", "1")]))
            .build()
            .expect("failed to build encoder");
        assert_eq!(encoder.global_tags().line(), "az=1,host=a,region=us-west");
    }

    #[test]
    fn test_invalid_global_tags() {
        // Cases are defined as: builder, expected error.
        let cases = [
            (
                LineEncoderBuilder::default().with_global_tag("", "a"),
                BuildError::InvalidGlobalTag { key: String::new(), reason: "key is empty" },
            ),
            (
                LineEncoderBuilder::default().with_global_tag("host", ""),
                BuildError::InvalidGlobalTag { key: "host".into(), reason: "value is empty" },
            ),
            (
                LineEncoderBuilder::default().with_global_tag("host", Value::raw("")),
                BuildError::InvalidGlobalTag { key: "host".into(), reason: "value is empty" },
            ),
            (
                LineEncoderBuilder::default().with_global_tag("ho\nst", "a"),
                BuildError::InvalidGlobalTag { key: "ho\nst".into(), reason: "key contains a line break" },
            ),
            (
                LineEncoderBuilder::default().with_global_tag("host", "a\nb"),
                BuildError::InvalidGlobalTag { key: "host".into(), reason: "value contains a line break" },
            ),
            (
                LineEncoderBuilder::default().with_global_tag("host\\", "a"),
                BuildError::InvalidGlobalTag { key: "host\\".into(), reason: "key ends with a backslash" },
            ),
            (
                LineEncoderBuilder::default().with_global_tag("host", "a\\"),
                BuildError::InvalidGlobalTag { key: "host".into(), reason: "value ends with a backslash" },
            ),
            (
                LineEncoderBuilder::default().with_global_tag("host", "a").with_global_tag("host", "b"),
                BuildError::DuplicateGlobalTag { key: "host".into() },
            ),
        ];

        for (builder, expected) in cases {
            assert_eq!(builder.build().err(), Some(expected));
        }
    }
}
