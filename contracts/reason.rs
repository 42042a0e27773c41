//! Reason and evidence model
//!
//! The closed reason taxonomy, the fixed severity table, and the
//! evidence-gated Reason factory. Every other component funnels through
//! `Reason::evidenced`: a Reason may only carry a specific taxonomy member
//! when it carries at least one piece of Evidence, otherwise the code is
//! forced to `UNKNOWN`. The engine never asserts a cause it cannot show
//! proof for.

use serde::Serialize;
use serde_json::Value;

/// Severity levels for audit reasons, in ascending triage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Should be addressed, does not fail the artifact
    Warn,
    /// Structural defect in the artifact
    Error,
    /// The artifact is unusable or the audit could not observe it
    Critical,
}

impl Severity {
    /// Canonical uppercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed taxonomy of audit reason codes
///
/// The taxonomy is closed: downstream consumers switch on these values, so
/// new members are a breaking change of the report contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Artifact file absent or unreadable on disk
    FileMissing,
    /// Artifact bytes are not valid JSON
    JsonParseError,
    /// The live base URL cannot be parsed into a usable URL
    BaseUrlMisconfig,
    /// A UI source reference points at a path the contract does not declare
    UiMappingMismatch,
    /// Remote endpoint answered with a non-success status
    UpstreamError,
    /// Required value absent at the declared path
    FieldMissing,
    /// Value is an explicit null
    FieldNullish,
    /// Value has a shape the contract cannot accept
    TypeMismatch,
    /// Value failed format parsing (e.g. not a date)
    FormatInvalid,
    /// Value parsed but lies outside its plausible range
    RangeInvalid,
    /// Timestamp is older than the freshness window
    StaleData,
    /// Collection is present but empty
    DataEmpty,
    /// A size, depth or time cap truncated the audit
    LimitExceeded,
    /// No evidence was available to justify a specific code
    Unknown,
    /// A declared collaborator (registry entry, manifest) is absent
    DependencyMissing,
    /// Remote endpoint rate-limited the audit past its retry budget
    RateLimitExceeded,
    /// Fetch timed out or failed at the transport layer
    NetworkTimeout,
    /// Circuit breaker suppressed the fetch
    CircuitOpen,
    /// Explicit all-clear marker
    Ok,
}

impl ReasonCode {
    /// Fixed reason-code to severity table
    ///
    /// `STALE_DATA` starts at WARN here; the validator escalates it to
    /// ERROR past the 48h window.
    pub fn severity(&self) -> Severity {
        match self {
            ReasonCode::FileMissing
            | ReasonCode::JsonParseError
            | ReasonCode::BaseUrlMisconfig
            | ReasonCode::UiMappingMismatch => Severity::Critical,
            ReasonCode::UpstreamError
            | ReasonCode::FieldMissing
            | ReasonCode::TypeMismatch
            | ReasonCode::FormatInvalid
            | ReasonCode::RangeInvalid
            | ReasonCode::FieldNullish => Severity::Error,
            ReasonCode::StaleData
            | ReasonCode::DataEmpty
            | ReasonCode::LimitExceeded
            | ReasonCode::Unknown
            | ReasonCode::DependencyMissing
            | ReasonCode::RateLimitExceeded
            | ReasonCode::NetworkTimeout
            | ReasonCode::CircuitOpen => Severity::Warn,
            ReasonCode::Ok => Severity::Info,
        }
    }

    /// Canonical SCREAMING_SNAKE label
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::FileMissing => "FILE_MISSING",
            ReasonCode::JsonParseError => "JSON_PARSE_ERROR",
            ReasonCode::BaseUrlMisconfig => "BASE_URL_MISCONFIG",
            ReasonCode::UiMappingMismatch => "UI_MAPPING_MISMATCH",
            ReasonCode::UpstreamError => "UPSTREAM_ERROR",
            ReasonCode::FieldMissing => "FIELD_MISSING",
            ReasonCode::FieldNullish => "FIELD_NULLISH",
            ReasonCode::TypeMismatch => "TYPE_MISMATCH",
            ReasonCode::FormatInvalid => "FORMAT_INVALID",
            ReasonCode::RangeInvalid => "RANGE_INVALID",
            ReasonCode::StaleData => "STALE_DATA",
            ReasonCode::DataEmpty => "DATA_EMPTY",
            ReasonCode::LimitExceeded => "LIMIT_EXCEEDED",
            ReasonCode::Unknown => "UNKNOWN",
            ReasonCode::DependencyMissing => "DEPENDENCY_MISSING",
            ReasonCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ReasonCode::NetworkTimeout => "NETWORK_TIMEOUT",
            ReasonCode::CircuitOpen => "CIRCUIT_OPEN",
            ReasonCode::Ok => "OK",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single fact backing a claim
///
/// Immutable once created: an HTTP status, a file-read error, a derived
/// metric such as an age in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    /// Kind of fact (e.g. "http-status", "io", "metric", "value")
    #[serde(rename = "type")]
    kind: String,
    /// Where the fact was observed (path, URL, file)
    source: String,
    /// The observed value or derived metric
    value: Value,
    /// Human-readable framing of the fact
    context: String,
}

impl Evidence {
    /// Record a fact
    pub fn new(
        kind: impl Into<String>,
        source: impl Into<String>,
        value: Value,
        context: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            source: source.into(),
            value,
            context: context.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// A classified problem with its proof
///
/// Only constructible through [`Reason::evidenced`]; the fields stay
/// private so no component can bypass the evidence gate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reason {
    reason_code: ReasonCode,
    severity: Severity,
    reason: String,
    evidence: Vec<Evidence>,
}

impl Reason {
    /// The single factory for Reasons
    ///
    /// An empty evidence list forces the code to `UNKNOWN` regardless of
    /// what the caller claimed. Severity derives from the fixed table.
    pub fn evidenced(
        code: ReasonCode,
        reason: impl Into<String>,
        evidence: Vec<Evidence>,
    ) -> Self {
        let code = if evidence.is_empty() {
            ReasonCode::Unknown
        } else {
            code
        };
        Self {
            severity: code.severity(),
            reason_code: code,
            reason: reason.into(),
            evidence,
        }
    }

    pub fn code(&self) -> ReasonCode {
        self.reason_code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.reason
    }

    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    /// Raise severity (used for the stale-data age ladder)
    pub(crate) fn escalate_to(mut self, severity: Severity) -> Self {
        if severity > self.severity {
            self.severity = severity;
        }
        self
    }

    /// Lower severity in place (used by schema overrides)
    ///
    /// The reason code is preserved: this is a severity override, not a
    /// reclassification.
    pub(crate) fn downgrade_to(&mut self, severity: Severity) {
        if severity < self.severity {
            self.severity = severity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Warn > Severity::Info);
    }

    #[test]
    fn test_severity_table() {
        assert_eq!(ReasonCode::FileMissing.severity(), Severity::Critical);
        assert_eq!(ReasonCode::JsonParseError.severity(), Severity::Critical);
        assert_eq!(ReasonCode::FieldMissing.severity(), Severity::Error);
        assert_eq!(ReasonCode::TypeMismatch.severity(), Severity::Error);
        assert_eq!(ReasonCode::StaleData.severity(), Severity::Warn);
        assert_eq!(ReasonCode::CircuitOpen.severity(), Severity::Warn);
        assert_eq!(ReasonCode::Ok.severity(), Severity::Info);
    }

    #[test]
    fn test_empty_evidence_forces_unknown() {
        let reason = Reason::evidenced(ReasonCode::FieldMissing, "no proof", vec![]);
        assert_eq!(reason.code(), ReasonCode::Unknown);
        assert_eq!(reason.severity(), Severity::Warn);
    }

    #[test]
    fn test_evidence_preserves_code() {
        let evidence = Evidence::new("lookup", "/a/b", json!(null), "value absent");
        let reason = Reason::evidenced(ReasonCode::FieldMissing, "absent", vec![evidence]);
        assert_eq!(reason.code(), ReasonCode::FieldMissing);
        assert_eq!(reason.severity(), Severity::Error);
        assert_eq!(reason.evidence().len(), 1);
    }

    #[test]
    fn test_escalate_only_raises() {
        let evidence = Evidence::new("metric", "/t", json!(1), "age");
        let reason = Reason::evidenced(ReasonCode::StaleData, "stale", vec![evidence])
            .escalate_to(Severity::Error);
        assert_eq!(reason.severity(), Severity::Error);

        let evidence = Evidence::new("io", "f", json!("gone"), "read failed");
        let reason = Reason::evidenced(ReasonCode::FileMissing, "missing", vec![evidence])
            .escalate_to(Severity::Warn);
        assert_eq!(reason.severity(), Severity::Critical);
    }

    #[test]
    fn test_downgrade_preserves_code() {
        let evidence = Evidence::new("lookup", "/a/7/status", json!(null), "absent");
        let mut reason = Reason::evidenced(ReasonCode::FieldMissing, "absent", vec![evidence]);
        reason.downgrade_to(Severity::Warn);
        assert_eq!(reason.code(), ReasonCode::FieldMissing);
        assert_eq!(reason.severity(), Severity::Warn);
    }

    #[test]
    fn test_serialization_labels() {
        let evidence = Evidence::new("http-status", "http://x", json!(503), "server error");
        let reason = Reason::evidenced(ReasonCode::UpstreamError, "upstream failed", vec![evidence]);
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["reasonCode"], "UPSTREAM_ERROR");
        assert_eq!(json["severity"], "ERROR");
        assert_eq!(json["evidence"][0]["type"], "http-status");
    }
}
