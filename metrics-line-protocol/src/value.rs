use std::{borrow::Cow, fmt};

/// A typed tag or field value.
///
/// The variant decides how the value is rendered in a line: integers carry an `i` suffix when used as a field, text
/// is quoted when used as a field and escaped when used as a tag, and so on. `Raw` holds an already-formatted value
/// which is always written verbatim.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A signed integer.
    Integer(i64),

    /// A floating-point number.
    Float(f64),

    /// A boolean.
    Boolean(bool),

    /// A string.
    Text(String),

    /// A pre-formatted value, written without any type-specific handling.
    Raw(String),
}

impl Value {
    /// Creates a [`Value::Raw`] from the default textual representation of `value`.
    ///
    /// This is the escape hatch for types that have no dedicated variant, such as `u64` values that may not fit in
    /// an `i64`.
    pub fn raw<T: fmt::Display>(value: T) -> Self {
        Value::Raw(value.to_string())
    }

    /// Returns the string contents if this is a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns `true` if this is a [`Value::Float`] holding `NaN` or an infinity.
    pub fn is_non_finite(&self) -> bool {
        matches!(self, Value::Float(f) if !f.is_finite())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => f.write_str(itoa::Buffer::new().format(*i)),
            // `Display` for floats gives the shortest representation that round-trips, and drops the fractional part
            // of whole numbers, so `1.0` is written as `1`.
            Value::Float(v) => fmt::Display::fmt(v, f),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Text(s) | Value::Raw(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )+
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    fn from(v: Cow<'a, str>) -> Self {
        Value::Text(v.into_owned())
    }
}
