//! Field validator
//!
//! Generic sanity rules applied to every enumerated value. The checks run
//! in a fixed precedence ladder so only the most specific applicable
//! reasons are returned, and every reason cites the checked path plus the
//! offending value or a derived metric as evidence.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{json, Value};

use crate::contracts::{Evidence, Reason, ReasonCode, Severity};

/// Parseable timestamps more than this far ahead of the validator clock
/// are out of range
const FUTURE_SKEW_MINUTES: i64 = 5;

/// Age past which a timestamp is stale at WARN
const STALE_WARN_HOURS: i64 = 24;

/// Age past which a stale timestamp escalates to ERROR
const STALE_ERROR_HOURS: i64 = 48;

/// Stateless per-block validator
///
/// Holds the validation-time clock so a whole block is judged against one
/// instant, and the compiled timestamp-label pattern.
pub struct FieldValidator {
    now: DateTime<Utc>,
    timestamp_label: Regex,
}

impl FieldValidator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            timestamp_label: Regex::new(r"(?i)time|date|updated|timestamp")
                .expect("timestamp label pattern is valid"),
        }
    }

    /// Apply the precedence ladder to one value
    ///
    /// `None` models an absent value (a required path that resolved to
    /// nothing). Returned reasons are sorted severity-descending, then
    /// reason-code-ascending, for deterministic output.
    pub fn validate(&self, path: &str, value: Option<&Value>) -> Vec<Reason> {
        let mut reasons = self.collect(path, value);
        reasons.sort_by(|a, b| {
            b.severity()
                .cmp(&a.severity())
                .then_with(|| a.code().as_str().cmp(b.code().as_str()))
        });
        reasons
    }

    fn collect(&self, path: &str, value: Option<&Value>) -> Vec<Reason> {
        let value = match value {
            None => {
                return vec![Reason::evidenced(
                    ReasonCode::FieldMissing,
                    format!("no value exists at {}", path),
                    vec![Evidence::new(
                        "lookup",
                        path,
                        Value::Null,
                        "path did not resolve inside the artifact",
                    )],
                )];
            }
            Some(v) => v,
        };

        if value.is_null() {
            return vec![Reason::evidenced(
                ReasonCode::FieldNullish,
                format!("value at {} is null", path),
                vec![Evidence::new(
                    "value",
                    path,
                    Value::Null,
                    "explicit null at path",
                )],
            )];
        }

        let mut reasons = Vec::new();

        match value {
            Value::Array(items) if items.is_empty() => {
                // an empty array is not a type error; later checks still run
                reasons.push(Reason::evidenced(
                    ReasonCode::DataEmpty,
                    format!("array at {} is empty", path),
                    vec![Evidence::new(
                        "value",
                        path,
                        json!([]),
                        "collection present but empty",
                    )],
                ));
            }
            Value::Number(number) => {
                let finite = number.as_f64().map(f64::is_finite).unwrap_or(false)
                    || number.as_i64().is_some()
                    || number.as_u64().is_some();
                if !finite {
                    reasons.push(Reason::evidenced(
                        ReasonCode::TypeMismatch,
                        format!("number at {} is not finite", path),
                        vec![Evidence::new(
                            "value",
                            path,
                            Value::String(number.to_string()),
                            "non-finite numeric value",
                        )],
                    ));
                }
            }
            Value::String(text) => {
                let label = path.rsplit('/').next().unwrap_or_default();
                if self.timestamp_label.is_match(label) {
                    reasons.extend(self.check_timestamp(path, text));
                }
            }
            // Bool, Object, non-empty Array: the tagged union is exhaustive,
            // so the generic "unrecognized value" arm of the taxonomy can
            // never fire here.
            _ => {}
        }

        reasons
    }

    /// Freshness ladder for timestamp-labelled strings
    fn check_timestamp(&self, path: &str, text: &str) -> Vec<Reason> {
        let parsed = match parse_timestamp(text) {
            Some(ts) => ts,
            None => {
                return vec![Reason::evidenced(
                    ReasonCode::FormatInvalid,
                    format!("value at {} is not a parseable date", path),
                    vec![Evidence::new(
                        "value",
                        path,
                        Value::String(text.to_string()),
                        "timestamp-labelled string failed date parsing",
                    )],
                )];
            }
        };

        if parsed > self.now + Duration::minutes(FUTURE_SKEW_MINUTES) {
            let ahead_ms = (parsed - self.now).num_milliseconds();
            return vec![Reason::evidenced(
                ReasonCode::RangeInvalid,
                format!("timestamp at {} lies in the future", path),
                vec![Evidence::new(
                    "metric",
                    path,
                    json!({ "aheadMs": ahead_ms }),
                    "timestamp ahead of validation time beyond allowed skew",
                )],
            )];
        }

        let age_ms = (self.now - parsed).num_milliseconds();
        if age_ms > STALE_WARN_HOURS * 3_600_000 {
            let reason = Reason::evidenced(
                ReasonCode::StaleData,
                format!("timestamp at {} is {}h old", path, age_ms / 3_600_000),
                vec![Evidence::new(
                    "metric",
                    path,
                    json!({ "ageMs": age_ms }),
                    "timestamp older than the freshness window",
                )],
            );
            if age_ms > STALE_ERROR_HOURS * 3_600_000 {
                return vec![reason.escalate_to(Severity::Error)];
            }
            return vec![reason];
        }

        Vec::new()
    }
}

/// Parse the timestamp formats artifacts actually publish
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}
