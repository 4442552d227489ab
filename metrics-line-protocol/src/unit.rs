//! Encoding of individual tags and fields.

use std::fmt;

use crate::{escape::write_escaped_to, Value};

/// A key/value pair that can be written as a `key=value` fragment of a line.
pub trait LineUnit {
    /// Key of this unit.
    fn key(&self) -> &str;

    /// Writes the `key=value` fragment of this unit to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error only if `writer` does.
    fn write_to<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result;

    /// Writes the `key=value` fragment of this unit to the end of `buffer`.
    fn write_line(&self, buffer: &mut String) {
        // Writing to a `String` never fails.
        let _ = self.write_to(buffer);
    }

    /// Returns the `key=value` fragment of this unit.
    fn line(&self) -> String {
        let mut buffer = String::new();
        self.write_line(&mut buffer);
        buffer
    }
}

/// A tag: indexed, text metadata attached to a measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    key: String,
    value: Value,
}

impl Tag {
    /// Creates a [`Tag`] from a key and value.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Tag { key: key.into(), value: value.into() }
    }

    /// Value of this tag.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes this [`Tag`], returning the key and value.
    pub fn into_parts(self) -> (String, Value) {
        (self.key, self.value)
    }
}

impl LineUnit for Tag {
    fn key(&self) -> &str {
        &self.key
    }

    fn write_to<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write_escaped_to(writer, &self.key)?;
        writer.write_char('=')?;

        // Only text is escaped. Anything else goes out in its default textual form, with no type suffix.
        match &self.value {
            Value::Text(s) => write_escaped_to(writer, s),
            value => write!(writer, "{value}"),
        }
    }
}

impl<K, V> From<(K, V)> for Tag
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Tag::new(key, value)
    }
}

impl From<&metrics::Label> for Tag {
    fn from(label: &metrics::Label) -> Self {
        Tag::new(label.key(), label.value())
    }
}

/// A field: a typed value measured at a point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    key: String,
    value: Value,
}

impl Field {
    /// Creates a [`Field`] from a key and value.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Field { key: key.into(), value: value.into() }
    }

    /// Value of this field.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes this [`Field`], returning the key and value.
    pub fn into_parts(self) -> (String, Value) {
        (self.key, self.value)
    }
}

impl LineUnit for Field {
    fn key(&self) -> &str {
        &self.key
    }

    fn write_to<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write_escaped_to(writer, &self.key)?;
        writer.write_char('=')?;

        match &self.value {
            Value::Integer(i) => {
                writer.write_str(itoa::Buffer::new().format(*i))?;
                writer.write_char('i')
            }
            // The quoted contents are not escaped: a double quote inside the text ends up in the line as-is.
            Value::Text(s) => {
                writer.write_char('"')?;
                writer.write_str(s)?;
                writer.write_char('"')
            }
            value => write!(writer, "{value}"),
        }
    }
}

impl<K, V> From<(K, V)> for Field
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Field::new(key, value)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Field, LineUnit, Tag};
    use crate::Value;

    #[test]
    fn test_tag_known_cases() {
        // Cases are defined as: tag key, tag value, expected output.
        let cases = [
            ("host", Value::from("serverA"), "host=serverA"),
            ("host", Value::from("server A"), "host=server\\ A"),
            ("region", Value::from("us,west"), "region=us\\,west"),
            ("a=b", Value::from("c\"d"), "a\\=b=c\\\"d"),
            ("value", Value::from("logged out"), "value=logged\\ out"),
            ("value", Value::from(1), "value=1"),
            ("value", Value::from(1.0), "value=1"),
            ("value", Value::from(1.2), "value=1.2"),
            ("value", Value::from(true), "value=true"),
            ("value", Value::raw("a b"), "value=a b"),
            ("empty", Value::from(""), "empty="),
        ];

        for (key, value, expected) in cases {
            let tag = Tag::new(key, value);
            assert_eq!(tag.line(), expected);
        }
    }

    #[test]
    fn test_field_known_cases() {
        // Cases are defined as: field key, field value, expected output.
        let cases = [
            ("value", Value::from(1), "value=1i"),
            ("value", Value::from(-17i64), "value=-17i"),
            ("value", Value::from(i64::MIN), "value=-9223372036854775808i"),
            ("value", Value::from(1.0), "value=1"),
            ("value", Value::from(1.2), "value=1.2"),
            ("value", Value::from(true), "value=true"),
            ("value", Value::from(false), "value=false"),
            ("value", Value::from("logged out"), "value=\"logged out\""),
            ("value", Value::from("a,b=c"), "value=\"a,b=c\""),
            ("value", Value::from("say \"hi\""), "value=\"say \"hi\"\""),
            ("value", Value::raw(18446744073709551615u64), "value=18446744073709551615"),
            ("load avg", Value::from(0.25), "load\\ avg=0.25"),
        ];

        for (key, value, expected) in cases {
            let field = Field::new(key, value);
            assert_eq!(field.line(), expected);
        }
    }

    #[test]
    fn test_write_line_appends() {
        let mut buffer = String::from("cpu ");
        Field::new("value", 3).write_line(&mut buffer);
        assert_eq!(buffer, "cpu value=3i");
    }

    #[test]
    fn test_tag_from_label() {
        let label = metrics::Label::new("service name", "api");
        let tag = Tag::from(&label);
        assert_eq!(tag.key(), "service name");
        assert_eq!(tag.value(), &Value::from("api"));
        assert_eq!(tag.line(), "service\\ name=api");
    }

    proptest! {
        #[test]
        fn test_integer_fields_suffixed(value in any::<i64>()) {
            let line = Field::new("value", value).line();
            prop_assert_eq!(line, format!("value={value}i"));
        }

        #[test]
        fn test_float_fields_unsuffixed(value in any::<f64>()) {
            let line = Field::new("value", value).line();
            prop_assert!(!line.ends_with('i'), "float rendered with integer suffix: {}", line);

            if value.is_finite() {
                let rendered = line.strip_prefix("value=").unwrap();
                prop_assert_eq!(rendered.parse::<f64>().unwrap(), value);
            }
        }
    }
}
