//! Artifact audit engine
//!
//! Per-document pipeline shared by the local and live drivers: extract the
//! artifact root, enumerate its paths, validate every enumerated value,
//! resolve the contract's declared required fields, and apply the
//! contract's override rules.

pub mod enumerate;
pub mod live;
pub mod local;
pub mod overrides;
pub mod validate;

pub use enumerate::{enumerate, EnumLimits, Enumeration, PathEntry, ValueKind};
pub use live::LiveAuditor;
pub use local::LocalAuditor;
pub use overrides::apply_overrides;
pub use validate::FieldValidator;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::contracts::{
    value_preview, AuditLimits, BlockReport, BlockSpec, Evidence, FieldReport, Reason, ReasonCode,
};

/// Shared per-document audit pipeline
pub struct AuditEngine {
    limits: AuditLimits,
}

impl AuditEngine {
    pub fn new(limits: AuditLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &AuditLimits {
        &self.limits
    }

    /// Audit one parsed artifact against its contract
    pub fn audit_document(
        &self,
        spec: &BlockSpec,
        location: &str,
        doc: &Value,
        now: DateTime<Utc>,
    ) -> BlockReport {
        let root = extract_root(doc);
        let schema_version = extract_schema_version(doc);
        let validator = FieldValidator::new(now);

        let enumeration = enumerate(root, &EnumLimits::from(&self.limits));
        let mut fields: Vec<FieldReport> = enumeration
            .entries
            .iter()
            .map(|entry| {
                let reasons = validator.validate(&entry.path, Some(entry.value));
                FieldReport::new(
                    entry.path.clone(),
                    true,
                    Some(value_preview(entry.value)),
                    reasons,
                )
            })
            .collect();

        if enumeration.truncated {
            fields.push(truncation_marker(
                location,
                self.limits.max_fields_per_block,
            ));
        }

        // Required fields declared by dotted path resolve via direct
        // lookup; paths the enumerator never reached (depth/item caps)
        // are appended as new fields.
        for dotted in &spec.required_fields {
            let canonical = canonical_path(dotted);
            if fields.iter().any(|field| field.path == canonical) {
                continue;
            }
            let value = resolve_dotted(root, dotted);
            let reasons = validator.validate(&canonical, value);
            fields.push(FieldReport::new(
                canonical,
                value.is_some(),
                value.map(value_preview),
                reasons,
            ));
        }

        apply_overrides(&mut fields, &spec.overrides);

        BlockReport::audited(&spec.block_id, location, schema_version, spec.optional, fields)
    }
}

/// Synthetic field marking a truncated enumeration
fn truncation_marker(location: &str, cap: usize) -> FieldReport {
    FieldReport::new(
        "/",
        false,
        None,
        vec![Reason::evidenced(
            ReasonCode::LimitExceeded,
            format!("enumeration stopped at {} entries", cap),
            vec![Evidence::new(
                "cap",
                location,
                json!({ "maxFieldsPerBlock": cap }),
                "field cap reached before the tree was fully walked",
            )],
        )],
    )
}

/// Pick the tree to enumerate out of the artifact envelope
///
/// `doc.data ?? doc.payload.data ?? doc.payload ?? doc`, where null and
/// absent both fall through.
pub fn extract_root(doc: &Value) -> &Value {
    if let Some(data) = doc.get("data").filter(|v| !v.is_null()) {
        return data;
    }
    if let Some(payload) = doc.get("payload").filter(|v| !v.is_null()) {
        if let Some(data) = payload.get("data").filter(|v| !v.is_null()) {
            return data;
        }
        return payload;
    }
    doc
}

/// Schema version the artifact declares, or "unknown"
pub fn extract_schema_version(doc: &Value) -> String {
    for key in ["schemaVersion", "schema"] {
        match doc.get(key) {
            Some(Value::String(version)) => return version.clone(),
            Some(Value::Number(version)) => return version.to_string(),
            _ => {}
        }
    }
    "unknown".to_string()
}

/// Canonical slash-joined pointer for a dotted contract path
fn canonical_path(dotted: &str) -> String {
    let joined = dotted
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined)
}

/// Direct lookup of a dotted path; numeric segments index into arrays
fn resolve_dotted<'a>(root: &'a Value, dotted: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in dotted.split('.').filter(|segment| !segment.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}
