//! Contract discovery
//!
//! Produces the ordered block list the auditors consume, either from a
//! declared registry document (JSON or YAML, parsed by extension) or from
//! a directory scan over `*.json` artifacts. Every discovery step is
//! recorded as an AuditTrace entry, independent of per-block results.

use serde_json::json;
use std::path::Path;

use crate::contracts::{BlockSpec, Evidence, RegistryDoc, TraceEntry};
use crate::error::{AuditError, Result};

/// Discovery output: the block list plus the operational trace
#[derive(Debug)]
pub struct Discovery {
    pub specs: Vec<BlockSpec>,
    pub trace: Vec<TraceEntry>,
}

/// Load a declared registry document from disk
///
/// Features with an empty mirrorPath cannot be located and are dropped
/// from the run; the trace records each drop with evidence.
pub fn load_registry(path: &Path) -> Result<Discovery> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AuditError::FileError(format!(
            "Failed to read registry '{}': {}",
            path.display(),
            e
        ))
    })?;

    let doc = parse_registry(path, &content)?;
    let mut trace = Vec::new();
    let mut specs = Vec::new();

    for feature in doc.features {
        if feature.mirror_path.is_empty() {
            trace.push(TraceEntry::new(
                "registry-load",
                "skipped",
                format!("feature '{}' declares no mirrorPath", feature.block_id),
                vec![Evidence::new(
                    "value",
                    path.display().to_string(),
                    json!({ "blockId": feature.block_id, "reasonCode": "DEPENDENCY_MISSING" }),
                    "registry entry cannot be located without a mirrorPath",
                )],
            ));
            continue;
        }
        specs.push(feature);
    }

    trace.push(TraceEntry::new(
        "registry-load",
        "loaded",
        format!("{} feature(s) from {}", specs.len(), path.display()),
        vec![Evidence::new(
            "io",
            path.display().to_string(),
            json!({ "features": specs.len() }),
            "registry document parsed",
        )],
    ));

    if specs.is_empty() {
        return Err(AuditError::registry_error(format!(
            "registry '{}' declares no locatable features",
            path.display()
        )));
    }

    Ok(Discovery { specs, trace })
}

/// Parse a registry document based on its extension
fn parse_registry(path: &Path, content: &str) -> Result<RegistryDoc> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(content)
            .map_err(|e| AuditError::ParseError(format!("Invalid registry JSON: {}", e))),
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| AuditError::ParseError(format!("Invalid registry YAML: {}", e))),
        _ => Err(AuditError::InvalidInput(format!(
            "Unsupported registry format: {}. Supported formats: json, yaml, yml",
            extension
        ))),
    }
}

/// Scan a directory tree for `*.json` artifacts
///
/// Produces the same shape as a registry with `requiredFields=[]`; block
/// ids derive from the relative path. Results are sorted for determinism.
pub fn scan_directory(base: &Path) -> Result<Discovery> {
    if !base.is_dir() {
        return Err(AuditError::FileError(format!(
            "Base directory '{}' does not exist",
            base.display()
        )));
    }

    let mut specs = Vec::new();
    collect_json_files(base, base, &mut specs)?;
    specs.sort_by(|a, b| a.block_id.cmp(&b.block_id));

    let trace = vec![TraceEntry::new(
        "directory-scan",
        if specs.is_empty() { "empty" } else { "scanned" },
        format!("{} artifact(s) under {}", specs.len(), base.display()),
        vec![Evidence::new(
            "io",
            base.display().to_string(),
            json!({ "artifacts": specs.len() }),
            "recursive *.json scan",
        )],
    )];

    Ok(Discovery { specs, trace })
}

fn collect_json_files(base: &Path, dir: &Path, specs: &mut Vec<BlockSpec>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(base, &path, specs)?;
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let relative = path
            .strip_prefix(base)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let block_id = relative.trim_end_matches(".json").replace('/', "-");
        specs.push(BlockSpec::bare(block_id, relative));
    }
    Ok(())
}
