use std::time::SystemTime;

use metrics::Key;
use metrics_line_protocol::{LineEncoderBuilder, Measurement, Precision, ValidationMode};

fn main() {
    tracing_subscriber::fmt::init();

    let encoder = LineEncoderBuilder::default()
        .with_precision(Precision::Milliseconds)
        .with_global_tag("service", "line-protocol-demo")
        .with_validation_mode(ValidationMode::Strict)
        .build()
        .expect("failed to build encoder");

    let now = SystemTime::now();
    let key = Key::from_parts("http_requests", &[("method", "GET"), ("path", "/index.html")]);
    let measurements = [
        Measurement::new("cpu")
            .with_tag("host", "server A")
            .with_field("usage", 42.5)
            .with_field("cores", 8)
            .with_timestamp(now),
        Measurement::from(&key).with_field("count", 17).with_timestamp(now),
        Measurement::new("events").with_field("message", "logged out").with_timestamp(now),
        // Rejected in strict mode, since the quote would end the text value early.
        Measurement::new("events").with_field("message", "said \"hi\"").with_timestamp(now),
    ];

    let mut payload = String::new();
    for measurement in &measurements {
        match encoder.encode_into(measurement, &mut payload) {
            Ok(()) => payload.push('\n'),
            Err(e) => eprintln!("skipping measurement '{}': {e}", measurement.name()),
        }
    }

    print!("{payload}");
}
