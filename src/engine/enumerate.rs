//! Path enumerator
//!
//! Flattens a schema-less JSON tree into a capped, deterministic list of
//! `(path, value, kind)` entries. Depth-first, pre-order: a container is
//! emitted before its children. Object keys are visited in lexical order
//! so the output does not depend on the artifact's key-insertion order.

use serde_json::Value;

use crate::contracts::AuditLimits;

/// Caps applied while walking a single artifact
#[derive(Debug, Clone, Copy)]
pub struct EnumLimits {
    /// Containers deeper than this are emitted unexpanded
    pub max_depth: usize,
    /// Array elements visited per array; the rest are silently absent
    pub max_items: usize,
    /// Hard cap on emitted entries across the whole tree
    pub max_fields_per_block: usize,
}

impl From<&AuditLimits> for EnumLimits {
    fn from(limits: &AuditLimits) -> Self {
        Self {
            max_depth: limits.max_depth,
            max_items: limits.max_items,
            max_fields_per_block: limits.max_fields_per_block,
        }
    }
}

/// Shape tag of an enumerated value
///
/// A tagged union instead of reflection, so downstream matches are
/// exhaustive and type-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One flattened tree location
#[derive(Debug, Clone)]
pub struct PathEntry<'a> {
    /// Canonical slash-joined pointer
    pub path: String,
    /// Final path segment
    pub label: String,
    /// Shape of the value at the path
    pub kind: ValueKind,
    /// Borrowed view of the value
    pub value: &'a Value,
}

/// Result of flattening one artifact root
#[derive(Debug)]
pub struct Enumeration<'a> {
    pub entries: Vec<PathEntry<'a>>,
    /// Set the instant the global cap stopped the walk; the caller appends
    /// the synthetic LIMIT_EXCEEDED field so consumers can distinguish a
    /// complete report from a truncated one
    pub truncated: bool,
}

/// Flatten a JSON value under the given caps
///
/// The root container itself is not an entry; a scalar root is emitted as
/// the single entry at `/`. Repeated calls on the same input return the
/// same entries in the same order.
pub fn enumerate<'a>(root: &'a Value, limits: &EnumLimits) -> Enumeration<'a> {
    let mut result = Enumeration {
        entries: Vec::new(),
        truncated: false,
    };

    match root {
        Value::Object(_) | Value::Array(_) => {
            visit_children(root, "", 0, limits, &mut result);
        }
        scalar => {
            result.entries.push(PathEntry {
                path: "/".to_string(),
                label: String::new(),
                kind: ValueKind::of(scalar),
                value: scalar,
            });
        }
    }

    result
}

/// Emit one node, then recurse into its children; returns false once the
/// global cap has been hit so the walk unwinds immediately
fn visit<'a>(
    value: &'a Value,
    path: String,
    label: &str,
    depth: usize,
    limits: &EnumLimits,
    out: &mut Enumeration<'a>,
) -> bool {
    if out.entries.len() >= limits.max_fields_per_block {
        out.truncated = true;
        return false;
    }

    out.entries.push(PathEntry {
        path: path.clone(),
        label: label.to_string(),
        kind: ValueKind::of(value),
        value,
    });

    // A container past the depth cap stays a leaf entry.
    if depth >= limits.max_depth {
        return true;
    }

    visit_children(value, &path, depth, limits, out)
}

fn visit_children<'a>(
    value: &'a Value,
    path: &str,
    depth: usize,
    limits: &EnumLimits,
    out: &mut Enumeration<'a>,
) -> bool {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                let child_path = format!("{}/{}", path, key);
                if !visit(&map[key.as_str()], child_path, key, depth + 1, limits, out) {
                    return false;
                }
            }
            true
        }
        Value::Array(items) => {
            for (index, item) in items.iter().take(limits.max_items).enumerate() {
                let label = index.to_string();
                let child_path = format!("{}/{}", path, label);
                if !visit(item, child_path, &label, depth + 1, limits, out) {
                    return false;
                }
            }
            true
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn limits(depth: usize, items: usize, fields: usize) -> EnumLimits {
        EnumLimits {
            max_depth: depth,
            max_items: items,
            max_fields_per_block: fields,
        }
    }

    fn paths(result: &Enumeration<'_>) -> Vec<&str> {
        result.entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_preorder_with_sorted_keys() {
        let doc = json!({"b": {"z": 1, "a": 2}, "a": [true, false]});
        let result = enumerate(&doc, &limits(8, 50, 100));
        assert_eq!(
            paths(&result),
            vec!["/a", "/a/0", "/a/1", "/b", "/b/a", "/b/z"]
        );
        assert!(!result.truncated);
    }

    #[test]
    fn test_container_emitted_before_children() {
        let doc = json!({"outer": {"inner": 1}});
        let result = enumerate(&doc, &limits(8, 50, 100));
        assert_eq!(paths(&result), vec!["/outer", "/outer/inner"]);
        assert_eq!(result.entries[0].kind, ValueKind::Object);
        assert_eq!(result.entries[1].kind, ValueKind::Number);
    }

    #[test]
    fn test_array_items_capped_silently() {
        let doc = json!({"items": [1, 2, 3, 4, 5]});
        let result = enumerate(&doc, &limits(8, 2, 100));
        assert_eq!(paths(&result), vec!["/items", "/items/0", "/items/1"]);
        assert!(!result.truncated);
    }

    #[test]
    fn test_depth_cap_emits_node_unexpanded() {
        let doc = json!({"a": {"b": {"c": {"d": 1}}}});
        let result = enumerate(&doc, &limits(2, 50, 100));
        assert_eq!(paths(&result), vec!["/a", "/a/b"]);
        // the node at the cap is still an entry, its children are not
        assert_eq!(result.entries[1].kind, ValueKind::Object);
    }

    #[test]
    fn test_global_cap_truncates() {
        let doc = json!({"a": 1, "b": 2, "c": 3, "d": 4});
        let result = enumerate(&doc, &limits(8, 50, 2));
        assert_eq!(result.entries.len(), 2);
        assert!(result.truncated);
    }

    #[test]
    fn test_exact_fit_is_not_truncated() {
        let doc = json!({"a": 1, "b": 2});
        let result = enumerate(&doc, &limits(8, 50, 2));
        assert_eq!(result.entries.len(), 2);
        assert!(!result.truncated);
    }

    #[test]
    fn test_scalar_root_is_single_slash_entry() {
        let doc = json!(42);
        let result = enumerate(&doc, &limits(8, 50, 100));
        assert_eq!(paths(&result), vec!["/"]);
        assert_eq!(result.entries[0].kind, ValueKind::Number);
    }

    #[test]
    fn test_labels_are_final_segments() {
        let doc = json!({"data": {"price": 9.5}});
        let result = enumerate(&doc, &limits(8, 50, 100));
        assert_eq!(result.entries[1].label, "price");
        assert_eq!(result.entries[1].path, "/data/price");
    }

    fn arb_json() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-z]{0,8}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::from),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..6)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_field_cap(doc in arb_json(), cap in 1usize..40) {
            let result = enumerate(&doc, &limits(6, 8, cap));
            prop_assert!(result.entries.len() <= cap);
        }

        #[test]
        fn prop_repeated_calls_are_identical(doc in arb_json()) {
            let l = limits(6, 8, 64);
            let first = enumerate(&doc, &l);
            let second = enumerate(&doc, &l);
            let a: Vec<_> = first.entries.iter().map(|e| &e.path).collect();
            let b: Vec<_> = second.entries.iter().map(|e| &e.path).collect();
            prop_assert_eq!(a, b);
            prop_assert_eq!(first.truncated, second.truncated);
        }
    }
}
