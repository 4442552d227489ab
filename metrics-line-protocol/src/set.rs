//! Ordered encoding of tag and field collections.

use std::{fmt, slice::Iter};

use crate::{Field, LineUnit, Tag, Value};

/// Writes `units` to `writer`, sorted by key and separated by commas.
///
/// When `leading` is given, it is written first, but only if there is at least one unit. The sort is stable, so units
/// sharing a key keep their relative order. `units` itself is left untouched.
pub(crate) fn write_sorted<'a, W, U, I>(writer: &mut W, leading: Option<char>, units: I) -> fmt::Result
where
    W: fmt::Write,
    U: LineUnit + 'a,
    I: IntoIterator<Item = &'a U>,
{
    let mut sorted = units.into_iter().collect::<Vec<_>>();
    if sorted.is_empty() {
        return Ok(());
    }
    sorted.sort_by(|a, b| a.key().cmp(b.key()));

    if let Some(c) = leading {
        writer.write_char(c)?;
    }

    let mut first = true;
    for unit in sorted {
        if first {
            first = false;
        } else {
            writer.write_char(',')?;
        }
        unit.write_to(writer)?;
    }

    Ok(())
}

macro_rules! unit_set {
    ($(#[$meta:meta])* $name:ident, $unit:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct $name(Vec<$unit>);

        impl $name {
            #[doc = concat!("Creates an empty [`", stringify!($name), "`].")]
            pub const fn new() -> Self {
                Self(Vec::new())
            }

            #[doc = concat!("Creates an empty [`", stringify!($name), "`] with room for `capacity` entries.")]
            pub fn with_capacity(capacity: usize) -> Self {
                Self(Vec::with_capacity(capacity))
            }

            #[doc = concat!("Adds a [`", stringify!($unit), "`].")]
            pub fn push(&mut self, unit: $unit) {
                self.0.push(unit);
            }

            /// Adds a key/value pair.
            ///
            /// Keys are not deduplicated: inserting an existing key adds a second entry.
            pub fn insert<K, V>(&mut self, key: K, value: V)
            where
                K: Into<String>,
                V: Into<Value>,
            {
                self.0.push($unit::new(key, value));
            }

            /// Number of entries.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Returns `true` if there are no entries.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Iterates over the entries in insertion order.
            pub fn iter(&self) -> Iter<'_, $unit> {
                self.0.iter()
            }

            /// Returns `true` if any entry has the given key.
            pub fn contains_key(&self, key: &str) -> bool {
                self.0.iter().any(|unit| unit.key() == key)
            }

            /// Writes the entries to the end of `buffer`, sorted by key and separated by commas.
            ///
            /// Nothing is written when there are no entries.
            pub fn write_line(&self, buffer: &mut String) {
                // Writing to a `String` never fails.
                let _ = write_sorted(buffer, None, &self.0);
            }

            /// Returns the entries sorted by key and separated by commas.
            pub fn line(&self) -> String {
                let mut buffer = String::new();
                self.write_line(&mut buffer);
                buffer
            }
        }

        impl From<Vec<$unit>> for $name {
            fn from(units: Vec<$unit>) -> Self {
                Self(units)
            }
        }

        impl<U: Into<$unit>> FromIterator<U> for $name {
            fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
                Self(iter.into_iter().map(Into::into).collect())
            }
        }

        impl<U: Into<$unit>> Extend<U> for $name {
            fn extend<I: IntoIterator<Item = U>>(&mut self, iter: I) {
                self.0.extend(iter.into_iter().map(Into::into));
            }
        }

        impl IntoIterator for $name {
            type Item = $unit;
            type IntoIter = std::vec::IntoIter<$unit>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $unit;
            type IntoIter = Iter<'a, $unit>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }
    };
}

unit_set!(
    /// A collection of tags.
    ///
    /// Tags may be added in any order; they are always written sorted by key.
    Tags,
    Tag
);

unit_set!(
    /// A collection of fields.
    ///
    /// Fields may be added in any order; they are always written sorted by key.
    Fields,
    Field
);

#[cfg(test)]
mod tests {
    use proptest::{collection::vec as arb_vec, prelude::*};

    use super::{Fields, Tags};
    use crate::{Field, LineUnit, Tag, Value};

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            any::<f64>().prop_map(Value::Float),
            any::<bool>().prop_map(Value::Boolean),
            "[a-z ,=]{0,12}".prop_map(Value::Text),
        ]
    }

    // Distinct keys, paired with values, plus a shuffled copy of the same pairs.
    fn arb_shuffled_pairs() -> impl Strategy<Value = (Vec<(String, Value)>, Vec<(String, Value)>)> {
        proptest::collection::btree_set("[a-z]{1,8}", 0..12)
            .prop_flat_map(|keys| {
                let len = keys.len();
                (Just(keys.into_iter().collect::<Vec<_>>()), arb_vec(arb_value(), len))
            })
            .prop_map(|(keys, values)| keys.into_iter().zip(values).collect::<Vec<_>>())
            .prop_flat_map(|pairs| (Just(pairs.clone()), Just(pairs).prop_shuffle()))
    }

    #[test]
    fn test_tags_sorted() {
        let tags = Tags::from_iter([("region", "us-west"), ("host", "serverA"), ("az", "b")]);
        assert_eq!(tags.line(), "az=b,host=serverA,region=us-west");

        // The caller's order is untouched.
        let keys = tags.iter().map(|t| t.key()).collect::<Vec<_>>();
        assert_eq!(keys, ["region", "host", "az"]);
    }

    #[test]
    fn test_fields_sorted() {
        let mut fields = Fields::new();
        fields.insert("load", 10);
        fields.insert("alert", true);
        fields.insert("reason", "value above maximum threshold");
        assert_eq!(fields.line(), "alert=true,load=10i,reason=\"value above maximum threshold\"");
    }

    #[test]
    fn test_empty() {
        assert_eq!(Tags::new().line(), "");
        assert_eq!(Fields::new().line(), "");
        assert!(Fields::default().is_empty());
    }

    #[test]
    fn test_duplicate_keys_keep_input_order() {
        let fields = Fields::from(vec![
            Field::new("b", 2),
            Field::new("a", 1),
            Field::new("b", 1),
        ]);
        assert_eq!(fields.line(), "a=1i,b=2i,b=1i");
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_sorting_is_bytewise() {
        let tags = Tags::from_iter([Tag::new("b", "1"), Tag::new("B", "2"), Tag::new("_", "3"), Tag::new("a", "4")]);
        assert_eq!(tags.line(), "B=2,_=3,a=4,b=1");
    }

    #[test]
    fn test_extend_and_contains() {
        let mut tags = Tags::new();
        tags.extend([("host", "a")]);
        assert!(tags.contains_key("host"));
        assert!(!tags.contains_key("region"));
    }

    proptest! {
        #[test]
        fn test_order_independent((pairs, shuffled) in arb_shuffled_pairs()) {
            let tags = pairs.iter().cloned().collect::<Tags>();
            let shuffled_tags = shuffled.iter().cloned().collect::<Tags>();
            prop_assert_eq!(tags.line(), shuffled_tags.line());

            let fields = pairs.into_iter().collect::<Fields>();
            let shuffled_fields = shuffled.into_iter().collect::<Fields>();
            prop_assert_eq!(fields.line(), shuffled_fields.line());
        }

        #[test]
        fn test_keys_strictly_ascending((pairs, _) in arb_shuffled_pairs()) {
            let tags = pairs.into_iter().collect::<Tags>();
            let line = tags.line();

            // Keys are lowercase letters only, so everything before each `=` up to the previous comma is the key.
            // Values may contain escaped commas, which are skipped by only splitting on unescaped ones.
            let mut keys = Vec::new();
            let mut rest = line.as_str();
            while !rest.is_empty() {
                let eq = rest.find('=').unwrap();
                keys.push(rest[..eq].to_string());
                rest = &rest[eq + 1..];

                let bytes = rest.as_bytes();
                let separator = (0..bytes.len()).find(|&i| bytes[i] == b',' && (i == 0 || bytes[i - 1] != b'\\'));
                rest = match separator {
                    Some(i) => &rest[i + 1..],
                    None => "",
                };
            }

            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys out of order: {:?}", keys);
        }
    }
}
