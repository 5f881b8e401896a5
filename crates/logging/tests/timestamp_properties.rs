mod common;

use basic_logging::{
    LogConfigurator, LogRecord, LoggerRegistry, LoggingConfig, Severity, TimeFormat, TimeZoneSpec,
};
use chrono::{DateTime, FixedOffset, Utc};
use common::SharedBuffer;
use proptest::prelude::*;

/// Patterns that carry the full instant down to the microsecond.
const LOSSLESS_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S.%f%z",
    "%Y-%m-%dT%H:%M:%S.%f",
    "%d/%m/%Y %H.%M.%S %f %z",
];

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 1970-01-01 .. 2100-01-01, microsecond resolution.
    (0i64..4_102_444_800_000_000).prop_map(|micros| {
        DateTime::from_timestamp_micros(micros).expect("in range")
    })
}

fn arb_zone() -> impl Strategy<Value = TimeZoneSpec> {
    prop_oneof![
        Just(TimeZoneSpec::Utc),
        (-12i32..=14, prop::sample::select(vec![0, 30, 45])).prop_map(|(hours, minutes)| {
            let seconds = hours * 3600 + hours.signum() * minutes * 60;
            TimeZoneSpec::Fixed(FixedOffset::east_opt(seconds).expect("valid offset"))
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Property: rendered timestamps parse back to the same instant.
    #[test]
    fn timestamps_parse_back_to_the_same_instant(
        instant in arb_instant(),
        zone in arb_zone(),
        pattern in prop::sample::select(LOSSLESS_FORMATS.to_vec()),
    ) {
        let format = TimeFormat::new(pattern).unwrap();
        let rendered = format.format(&instant, &zone).unwrap();
        let parsed = format.parse(&rendered).unwrap();

        // Offset-less patterns hold wall-clock time in the rendering zone.
        let expected = if pattern.contains("%z") {
            instant
        } else {
            let offset = match zone {
                TimeZoneSpec::Fixed(offset) => offset.local_minus_utc(),
                _ => 0,
            };
            instant + chrono::Duration::seconds(i64::from(offset))
        };
        prop_assert_eq!(parsed.with_timezone(&Utc), expected);
    }

    /// Property: every emitted line is a JSON object with the core keys.
    #[test]
    fn emitted_lines_are_json_with_core_keys(
        message in ".*",
        level in prop::sample::select(vec![
            Severity::Debug,
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
        ]),
        instant in arb_instant(),
    ) {
        let registry = LoggerRegistry::new();
        let buffer = SharedBuffer::default();
        let logger = LogConfigurator::new(&registry)
            .configure_with_writer(&LoggingConfig::new("prop").with_level("DEBUG"), buffer.clone())
            .unwrap();

        logger
            .handle(&LogRecord::new("prop", level, message.clone()).with_created(instant))
            .unwrap();

        let lines = buffer.json_lines();
        prop_assert_eq!(lines.len(), 1);
        let line = &lines[0];
        prop_assert_eq!(&line["message"], &serde_json::Value::from(message));
        prop_assert_eq!(&line["level"], &serde_json::Value::from(level.name()));
        prop_assert_eq!(&line["name"], &serde_json::Value::from("prop"));
        let timestamp = line["timestamp"].as_str().unwrap();
        let parsed = TimeFormat::default().parse(timestamp).unwrap();
        prop_assert_eq!(parsed.with_timezone(&Utc), instant);
    }
}
