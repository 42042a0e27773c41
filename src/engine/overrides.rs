//! Schema override matcher
//!
//! Applies per-contract wildcard rules that relax specific paths. A `*`
//! segment matches exactly one path segment and segment counts must match
//! exactly; there are no recursive wildcards. For each field the first
//! matching rule in declaration order wins.

use crate::contracts::{FieldReport, OverrideRule, ReasonCode, Severity};

/// Relax fields according to the contract's override rules
///
/// A `required: false` match downgrades any `FIELD_MISSING` or
/// `FIELD_NULLISH` reason on the field to WARN; the reason code is
/// preserved. Fields with no matching rule are untouched.
pub fn apply_overrides(fields: &mut [FieldReport], rules: &[OverrideRule]) {
    if rules.is_empty() {
        return;
    }

    for field in fields.iter_mut() {
        let rule = rules.iter().find(|rule| matches(&rule.path, &field.path));
        let Some(rule) = rule else { continue };
        if rule.required {
            continue;
        }

        let mut changed = false;
        for reason in field.reasons_mut() {
            if matches!(
                reason.code(),
                ReasonCode::FieldMissing | ReasonCode::FieldNullish
            ) {
                reason.downgrade_to(Severity::Warn);
                changed = true;
            }
        }
        if changed {
            field.recompute();
        }
    }
}

/// Segment-wise pattern match; `*` consumes exactly one segment
fn matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_segments.len() != path_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(path_segments.iter())
        .all(|(pattern, segment)| *pattern == "*" || pattern == segment)
}
