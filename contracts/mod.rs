//! Artifact Audit Agent Contracts
//!
//! Defines the audit input contract (block specs, registry document,
//! limits) and the report model every component shares.

mod reason;
mod report;

pub use reason::*;
pub use report::*;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Per-path override rule attached to a block's contract
///
/// `path` segments may be `*` wildcards matching exactly one segment;
/// segment counts must match exactly (no recursive wildcards).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRule {
    /// Canonical path pattern (e.g. `/a/*/status`)
    pub path: String,
    /// When false, missing/nullish findings at matching paths downgrade to WARN
    pub required: bool,
}

/// Declared contract for one published artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSpec {
    /// Stable identifier of the artifact
    pub block_id: String,

    /// Location relative to the base directory or base URL
    pub mirror_path: String,

    /// Absence of an optional artifact is still reported, never hidden
    #[serde(default)]
    pub optional: bool,

    /// Marked critical by the contract owner
    #[serde(default)]
    pub critical: bool,

    /// Dotted paths that must resolve inside the artifact
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Per-path relaxations, first declared match wins
    #[serde(default)]
    pub overrides: Vec<OverrideRule>,
}

impl BlockSpec {
    /// Minimal spec used by directory scans (no declared required fields)
    pub fn bare(block_id: impl Into<String>, mirror_path: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            mirror_path: mirror_path.into(),
            optional: false,
            critical: false,
            required_fields: Vec::new(),
            overrides: Vec::new(),
        }
    }
}

/// Registry document shape consumed from disk or HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryDoc {
    pub features: Vec<BlockSpec>,
}

/// Caps and budgets for a run
///
/// Serde defaults keep handler payloads terse; the CLI surfaces each knob
/// as a flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLimits {
    /// Per-request timeout in live mode
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum tree depth expanded by the enumerator
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Array elements visited per array
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Global cap on enumerated entries per block
    #[serde(default = "default_max_fields")]
    pub max_fields_per_block: usize,

    /// Blocks audited per local run
    #[serde(default = "default_max_blocks")]
    pub max_blocks: usize,

    /// Wall-clock budget for the whole run
    #[serde(default = "default_max_audit_time_ms")]
    pub max_audit_time_ms: u64,

    /// Blocks audited per live run
    #[serde(default = "default_max_blocks_live")]
    pub max_blocks_live: usize,
}

fn default_timeout_ms() -> u64 {
    4_000
}

fn default_max_depth() -> usize {
    8
}

fn default_max_items() -> usize {
    50
}

fn default_max_fields() -> usize {
    400
}

fn default_max_blocks() -> usize {
    200
}

fn default_max_audit_time_ms() -> u64 {
    60_000
}

fn default_max_blocks_live() -> usize {
    40
}

impl Default for AuditLimits {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_depth: default_max_depth(),
            max_items: default_max_items(),
            max_fields_per_block: default_max_fields(),
            max_blocks: default_max_blocks(),
            max_audit_time_ms: default_max_audit_time_ms(),
            max_blocks_live: default_max_blocks_live(),
        }
    }
}

/// Compute a deterministic hash of the audited contract
///
/// Same block list, same hash; used to correlate reports across runs.
pub fn contract_hash(specs: &[BlockSpec]) -> String {
    let mut hasher = Sha256::new();
    for spec in specs {
        hasher.update(spec.block_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(spec.mirror_path.as_bytes());
        hasher.update([0u8]);
        for field in &spec.required_fields {
            hasher.update(field.as_bytes());
            hasher.update([1u8]);
        }
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_spec_deserializes_with_defaults() {
        let spec: BlockSpec = serde_json::from_str(
            r#"{"blockId": "market-snapshot", "mirrorPath": "data/market.json"}"#,
        )
        .unwrap();
        assert_eq!(spec.block_id, "market-snapshot");
        assert!(!spec.optional);
        assert!(spec.required_fields.is_empty());
        assert!(spec.overrides.is_empty());
    }

    #[test]
    fn test_registry_doc_round_trip() {
        let doc = RegistryDoc {
            features: vec![BlockSpec::bare("health", "health.json")],
        };
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: RegistryDoc = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.features.len(), 1);
        assert_eq!(parsed.features[0].block_id, "health");
    }

    #[test]
    fn test_contract_hash_is_deterministic() {
        let specs = vec![
            BlockSpec::bare("a", "a.json"),
            BlockSpec::bare("b", "b.json"),
        ];
        assert_eq!(contract_hash(&specs), contract_hash(&specs.clone()));
    }

    #[test]
    fn test_contract_hash_differs_on_content() {
        let a = vec![BlockSpec::bare("a", "a.json")];
        let b = vec![BlockSpec::bare("a", "b.json")];
        assert_ne!(contract_hash(&a), contract_hash(&b));
    }

    #[test]
    fn test_limits_defaults() {
        let limits: AuditLimits = serde_json::from_str("{}").unwrap();
        assert_eq!(limits.timeout_ms, 4_000);
        assert_eq!(limits.max_fields_per_block, 400);
        assert_eq!(limits.max_blocks_live, 40);
    }
}
