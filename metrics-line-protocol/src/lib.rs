//! Encodes measurements in the [InfluxDB line protocol][lp].
//!
//! [lp]: https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/
//!
//! # Usage
//!
//! A [`Measurement`] is a name, a set of tags, a set of fields, and an optional timestamp. Each measurement encodes to
//! exactly one line:
//!
//! ```
//! # use metrics_line_protocol::Measurement;
//! let measurement = Measurement::new("cpu")
//!     .with_tag("region", "us west")
//!     .with_tag("host", "server01")
//!     .with_field("value", 1.0)
//!     .with_field("cores", 8)
//!     .with_timestamp_nanos(1434055562000000000);
//!
//! assert_eq!(
//!     measurement.line(),
//!     "cpu,host=server01,region=us\\ west cores=8i,value=1 1434055562000000000",
//! );
//! ```
//!
//! For control over timestamp precision, tags shared by every measurement, or rejecting measurements that the
//! ingestion endpoint would not accept, build a [`LineEncoder`]:
//!
//! ```
//! # use metrics_line_protocol::{LineEncoderBuilder, Measurement, Precision, ValidationMode};
//! let encoder = LineEncoderBuilder::default()
//!     .with_precision(Precision::Seconds)
//!     .with_global_tag("service", "api")
//!     .with_validation_mode(ValidationMode::Strict)
//!     .build()
//!     .expect("failed to build encoder");
//!
//! let measurement = Measurement::new("requests").with_field("count", 3).with_timestamp_nanos(1434055562000000000);
//! assert_eq!(encoder.encode(&measurement).unwrap(), "requests,service=api count=3i 1434055562");
//! ```
//!
//! # Encoding rules
//!
//! - The measurement name, tag keys, tag values, and field keys have spaces, commas, equals signs, and double quotes
//!   escaped with a backslash. Backslashes themselves are not escaped.
//! - Tags and fields are always written sorted by key, regardless of the order they were added in.
//! - Integer fields are written with an `i` suffix. Floats and booleans are written as-is.
//! - Text fields are wrapped in double quotes, but their contents are not escaped.
//! - Tag values that are not text are written in their plain form, with no suffix and no escaping.
//! - Absent or empty tag and field sets, and absent timestamps, are left out along with their separator.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod builder;
pub use self::builder::{BuildError, LineEncoderBuilder};

mod encoder;
pub use self::encoder::{EncodeError, LineEncoder, Precision, ValidationMode};

mod escape;
pub use self::escape::{escape, write_escaped};

mod measurement;
pub use self::measurement::Measurement;

mod set;
pub use self::set::{Fields, Tags};

mod unit;
pub use self::unit::{Field, LineUnit, Tag};

mod value;
pub use self::value::Value;
