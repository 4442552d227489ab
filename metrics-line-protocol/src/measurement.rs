use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use metrics::Key;

use crate::{escape::write_escaped_to, set::write_sorted, Field, Fields, Tag, Tags, Value};

/// A single data point: a name, optional tags and fields, and an optional timestamp.
///
/// A measurement renders as one line of the form `name[,tag=value,...][ field=value,...][ timestamp]`. Sections that
/// are absent, or present but empty, are left out entirely along with their separator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Measurement {
    name: String,
    tags: Option<Tags>,
    fields: Option<Fields>,
    timestamp: Option<i64>,
}

impl Measurement {
    /// Creates a [`Measurement`] with the given name and nothing else.
    pub fn new<N: Into<String>>(name: N) -> Self {
        Measurement { name: name.into(), ..Default::default() }
    }

    /// Creates a [`Measurement`] from all of its parts.
    pub fn from_parts<N: Into<String>>(
        name: N,
        tags: Option<Tags>,
        fields: Option<Fields>,
        timestamp: Option<i64>,
    ) -> Self {
        Measurement { name: name.into(), tags, fields, timestamp }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.tags.get_or_insert_with(Tags::new).push(Tag::new(key, value));
        self
    }

    /// Sets the tags, replacing any previously added.
    #[must_use]
    pub fn with_tags<T: Into<Tags>>(mut self, tags: T) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.get_or_insert_with(Fields::new).push(Field::new(key, value));
        self
    }

    /// Sets the fields, replacing any previously added.
    #[must_use]
    pub fn with_fields<F: Into<Fields>>(mut self, fields: F) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Sets the timestamp.
    ///
    /// Times before the Unix epoch become negative timestamps. Times too far from the epoch to be represented as a
    /// signed 64-bit count of nanoseconds saturate.
    #[must_use]
    pub fn with_timestamp(self, time: SystemTime) -> Self {
        self.with_timestamp_nanos(system_time_to_nanos(time))
    }

    /// Sets the timestamp, in nanoseconds since the Unix epoch.
    #[must_use]
    pub fn with_timestamp_nanos(mut self, nanos: i64) -> Self {
        self.timestamp = Some(nanos);
        self
    }

    /// Name of this measurement.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tags of this measurement, if any were set.
    pub fn tags(&self) -> Option<&Tags> {
        self.tags.as_ref()
    }

    /// Fields of this measurement, if any were set.
    pub fn fields(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }

    /// Timestamp of this measurement, in nanoseconds since the Unix epoch.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Writes this measurement as a line to the end of `buffer`.
    ///
    /// No trailing newline is written.
    pub fn write_line(&self, buffer: &mut String) {
        // Writing to a `String` never fails.
        let _ = write_line_parts(
            buffer,
            &self.name,
            self.tags.iter().flatten(),
            self.fields.iter().flatten(),
            self.timestamp,
        );
    }

    /// Returns this measurement as a line.
    pub fn line(&self) -> String {
        let mut buffer = String::new();
        self.write_line(&mut buffer);
        buffer
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line_parts(f, &self.name, self.tags.iter().flatten(), self.fields.iter().flatten(), self.timestamp)
    }
}

impl From<&Key> for Measurement {
    fn from(key: &Key) -> Self {
        let tags = key.labels().collect::<Tags>();
        Measurement::new(key.name()).with_tags(tags)
    }
}

/// Writes a line from its individual parts.
///
/// `timestamp` has already been scaled to whatever precision the line is meant to carry.
pub(crate) fn write_line_parts<'a, W, T, F>(
    writer: &mut W,
    name: &str,
    tags: T,
    fields: F,
    timestamp: Option<i64>,
) -> fmt::Result
where
    W: fmt::Write,
    T: IntoIterator<Item = &'a Tag>,
    F: IntoIterator<Item = &'a Field>,
{
    write_escaped_to(writer, name)?;
    write_sorted(writer, Some(','), tags)?;
    write_sorted(writer, Some(' '), fields)?;

    if let Some(timestamp) = timestamp {
        writer.write_char(' ')?;
        writer.write_str(itoa::Buffer::new().format(timestamp))?;
    }

    Ok(())
}

fn system_time_to_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => i64::try_from(since.as_nanos()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_nanos()).map_or(i64::MIN, |n| -n),
    }
}
