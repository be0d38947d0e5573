//! ApiSnapshot comparison for entrypoint "library" diffing.
//!
//! Matching is by export identity first; unmatched entries get a name+kind
//! fallback (catches declarations that merely moved), then an equal-shape
//! pass for rename detection. Modification detail prose enumerates
//! per-overload parameter changes, per-member class changes, per-property
//! type changes, and per-enum-member value changes.

use serde::{Deserialize, Serialize};

use crate::report::{BreakingChange, FindingContext};
use crate::rules;
use crate::shape::{ApiShape, ApiSnapshot, FunctionSignature};
use crate::types::Severity;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiDiffEntry {
    pub identity: String,
    pub name: String,
    pub kind: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiModified {
    pub identity: String,
    pub name: String,
    pub kind: String,
    /// Human-readable change details, one per concrete difference.
    pub details: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiRenamed {
    pub before_name: String,
    pub after_name: String,
    pub kind: String,
}

/// Result of comparing two [`ApiSnapshot`]s.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApiDiff {
    pub removed: Vec<ApiDiffEntry>,
    pub added: Vec<ApiDiffEntry>,
    pub modified: Vec<ApiModified>,
    pub renamed: Vec<ApiRenamed>,
}

impl ApiDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.added.is_empty()
            && self.modified.is_empty()
            && self.renamed.is_empty()
    }
}

/// Compare two API snapshots.
pub fn compute_api_diff(before: &ApiSnapshot, after: &ApiSnapshot) -> ApiDiff {
    let mut diff = ApiDiff::default();
    let mut matched_after: std::collections::HashSet<&String> = std::collections::HashSet::new();
    let mut unmatched_before: Vec<(&String, &ApiShape)> = Vec::new();

    // Identity match first.
    for (identity, shape) in &before.exports {
        match after.exports.get(identity) {
            Some(after_shape) => {
                matched_after.insert(identity);
                let details = shape_changes(shape, after_shape);
                if !details.is_empty() {
                    diff.modified.push(ApiModified {
                        identity: identity.clone(),
                        name: shape.name().to_string(),
                        kind: shape.kind_str().to_string(),
                        details,
                    });
                }
            }
            None => unmatched_before.push((identity, shape)),
        }
    }

    let mut unmatched_after: Vec<(&String, &ApiShape)> = after
        .exports
        .iter()
        .filter(|(identity, _)| !matched_after.contains(identity))
        .collect();

    // Name+kind fallback: the declaration moved but kept its name.
    let mut still_unmatched_before = Vec::new();
    for (identity, shape) in unmatched_before {
        let found = unmatched_after.iter().position(|(_, a)| {
            a.name() == shape.name() && a.kind_str() == shape.kind_str()
        });
        match found {
            Some(pos) => {
                let (_, after_shape) = unmatched_after.remove(pos);
                let details = shape_changes(shape, after_shape);
                if !details.is_empty() {
                    diff.modified.push(ApiModified {
                        identity: identity.clone(),
                        name: shape.name().to_string(),
                        kind: shape.kind_str().to_string(),
                        details,
                    });
                }
            }
            None => still_unmatched_before.push((identity, shape)),
        }
    }

    // Rename detection: identical shape under a different name.
    let mut removed = Vec::new();
    for (identity, shape) in still_unmatched_before {
        let found = unmatched_after
            .iter()
            .position(|(_, a)| shapes_equal_modulo_name(shape, a));
        match found {
            Some(pos) => {
                let (_, after_shape) = unmatched_after.remove(pos);
                diff.renamed.push(ApiRenamed {
                    before_name: shape.name().to_string(),
                    after_name: after_shape.name().to_string(),
                    kind: shape.kind_str().to_string(),
                });
            }
            None => removed.push(ApiDiffEntry {
                identity: identity.clone(),
                name: shape.name().to_string(),
                kind: shape.kind_str().to_string(),
            }),
        }
    }
    diff.removed = removed;

    for (identity, shape) in unmatched_after {
        diff.added.push(ApiDiffEntry {
            identity: identity.clone(),
            name: shape.name().to_string(),
            kind: shape.kind_str().to_string(),
        });
    }

    // BTreeMap iteration already sorts by identity; keep findings stable.
    diff.removed.sort_by(|a, b| a.identity.cmp(&b.identity));
    diff.added.sort_by(|a, b| a.identity.cmp(&b.identity));
    diff.modified.sort_by(|a, b| a.identity.cmp(&b.identity));
    diff.renamed
        .sort_by(|a, b| a.before_name.cmp(&b.before_name));
    diff
}

fn shapes_equal_modulo_name(a: &ApiShape, b: &ApiShape) -> bool {
    if a.kind_str() != b.kind_str() {
        return false;
    }
    let mut a = a.clone();
    rename_shape(&mut a, b.name());
    &a == b
}

fn rename_shape(shape: &mut ApiShape, name: &str) {
    match shape {
        ApiShape::Function(s) => s.name = name.to_string(),
        ApiShape::Class(s) => s.name = name.to_string(),
        ApiShape::Interface(s) | ApiShape::Type(s) => s.name = name.to_string(),
        ApiShape::Enum(s) => s.name = name.to_string(),
        ApiShape::Variable(s) | ApiShape::Const(s) => s.name = name.to_string(),
    }
}

fn signature_text(sig: &FunctionSignature) -> String {
    let params = crate::analyzer::ast_ts::symbols::render_parameters(&sig.parameters);
    if sig.return_type.is_empty() {
        format!("({})", params)
    } else {
        format!("({}): {}", params, sig.return_type)
    }
}

/// Enumerate concrete differences between two shapes of the same export.
fn shape_changes(before: &ApiShape, after: &ApiShape) -> Vec<String> {
    let mut out = Vec::new();
    match (before, after) {
        (ApiShape::Function(b), ApiShape::Function(a)) => {
            if b.overloads.len() != a.overloads.len() {
                out.push(format!(
                    "overload count changed from {} to {}",
                    b.overloads.len(),
                    a.overloads.len()
                ));
            }
            for (i, (bo, ao)) in b.overloads.iter().zip(a.overloads.iter()).enumerate() {
                for param in &bo.parameters {
                    match ao.parameters.iter().find(|p| p.name == param.name) {
                        None => out.push(format!(
                            "overload {}: parameter '{}' removed",
                            i + 1,
                            param.name
                        )),
                        Some(after_param) => {
                            if param.type_text != after_param.type_text {
                                out.push(format!(
                                    "overload {}: parameter '{}' type changed from '{}' to '{}'",
                                    i + 1,
                                    param.name,
                                    param.type_text,
                                    after_param.type_text
                                ));
                            } else if param.optional != after_param.optional {
                                out.push(format!(
                                    "overload {}: parameter '{}' optionality changed",
                                    i + 1,
                                    param.name
                                ));
                            }
                        }
                    }
                }
                for param in &ao.parameters {
                    if !bo.parameters.iter().any(|p| p.name == param.name) {
                        out.push(format!(
                            "overload {}: parameter '{}' added{}",
                            i + 1,
                            param.name,
                            if param.optional { " (optional)" } else { "" }
                        ));
                    }
                }
                if bo.return_type != ao.return_type {
                    out.push(format!(
                        "overload {}: return type changed from '{}' to '{}'",
                        i + 1,
                        bo.return_type,
                        ao.return_type
                    ));
                }
            }
        }
        (ApiShape::Class(b), ApiShape::Class(a)) => {
            for member in &b.members {
                match a.members.iter().find(|m| m.name == member.name) {
                    None => out.push(format!("member '{}' removed", member.name)),
                    Some(after_member) => {
                        if member != after_member {
                            let before_text = member
                                .signature
                                .as_ref()
                                .map(signature_text)
                                .or_else(|| member.type_text.clone())
                                .unwrap_or_default();
                            let after_text = after_member
                                .signature
                                .as_ref()
                                .map(signature_text)
                                .or_else(|| after_member.type_text.clone())
                                .unwrap_or_default();
                            out.push(format!(
                                "member '{}' changed from '{}' to '{}'",
                                member.name, before_text, after_text
                            ));
                        }
                    }
                }
            }
            for member in &a.members {
                if !b.members.iter().any(|m| m.name == member.name) {
                    out.push(format!("member '{}' added", member.name));
                }
            }
            if b.extends != a.extends {
                out.push(format!(
                    "extends changed from '{}' to '{}'",
                    b.extends.clone().unwrap_or_default(),
                    a.extends.clone().unwrap_or_default()
                ));
            }
        }
        (ApiShape::Interface(b), ApiShape::Interface(a))
        | (ApiShape::Type(b), ApiShape::Type(a)) => {
            if b.type_text.is_some() || a.type_text.is_some() {
                if b.type_text != a.type_text {
                    out.push(format!(
                        "type changed from '{}' to '{}'",
                        b.type_text.clone().unwrap_or_default(),
                        a.type_text.clone().unwrap_or_default()
                    ));
                }
            } else {
                for prop in &b.properties {
                    match a.properties.iter().find(|p| p.name == prop.name) {
                        None => out.push(format!("property '{}' removed", prop.name)),
                        Some(after_prop) if after_prop.type_text != prop.type_text => {
                            out.push(format!(
                                "property '{}' type changed from '{}' to '{}'",
                                prop.name, prop.type_text, after_prop.type_text
                            ));
                        }
                        _ => {}
                    }
                }
                for prop in &a.properties {
                    if !b.properties.iter().any(|p| p.name == prop.name) {
                        out.push(format!("property '{}' added", prop.name));
                    }
                }
            }
        }
        (ApiShape::Enum(b), ApiShape::Enum(a)) => {
            for member in &b.members {
                match a.members.iter().find(|m| m.name == member.name) {
                    None => out.push(format!("enum member '{}' removed", member.name)),
                    Some(after_member) if after_member.value != member.value => {
                        out.push(format!(
                            "enum member '{}' value changed from '{}' to '{}'",
                            member.name,
                            member.value.clone().unwrap_or_default(),
                            after_member.value.clone().unwrap_or_default()
                        ));
                    }
                    _ => {}
                }
            }
            for member in &a.members {
                if !b.members.iter().any(|m| m.name == member.name) {
                    out.push(format!("enum member '{}' added", member.name));
                }
            }
        }
        (ApiShape::Variable(b), ApiShape::Variable(a))
        | (ApiShape::Const(b), ApiShape::Const(a)) => {
            if b.type_text != a.type_text {
                out.push(format!(
                    "type changed from '{}' to '{}'",
                    b.type_text, a.type_text
                ));
            }
        }
        (b, a) => {
            if b != a {
                out.push(format!(
                    "kind changed from '{}' to '{}'",
                    b.kind_str(),
                    a.kind_str()
                ));
            }
        }
    }
    out
}

/// Project an [`ApiDiff`] into catalog findings.
pub fn api_diff_to_findings(diff: &ApiDiff) -> Vec<BreakingChange> {
    let mut out = Vec::new();

    for entry in &diff.removed {
        out.push(finding(
            "TSAPI-EXP-001",
            Severity::Breaking,
            &entry.name,
            format!("Export '{}' was removed from the API surface", entry.name),
            entry.kind.clone(),
            String::new(),
            "removed",
            &entry.kind,
        ));
    }
    for entry in &diff.added {
        out.push(finding(
            "EXPORT-ADDED",
            Severity::Info,
            &entry.name,
            format!("Export '{}' was added to the API surface", entry.name),
            String::new(),
            entry.kind.clone(),
            "added",
            &entry.kind,
        ));
    }
    for entry in &diff.modified {
        let rule_id = match entry.kind.as_str() {
            "function" => "TSAPI-FN-003",
            "class" => "TSAPI-CLS-002",
            "interface" => "TSAPI-IF-003",
            "type" => "TSAPI-TYPE-004",
            "enum" => "ENUM_MEMBER_REMOVED",
            _ => "SIGNATURE-CHANGED",
        };
        out.push(finding(
            rule_id,
            rules::base_severity(rule_id),
            &entry.name,
            format!("'{}' changed: {}", entry.name, entry.details.join("; ")),
            String::new(),
            String::new(),
            "modified",
            &entry.kind,
        ));
    }
    for entry in &diff.renamed {
        out.push(finding(
            "EXPORT-RENAMED",
            Severity::Warning,
            &entry.before_name,
            format!(
                "Export '{}' appears to be renamed to '{}'",
                entry.before_name, entry.after_name
            ),
            entry.before_name.clone(),
            entry.after_name.clone(),
            "modified",
            &entry.kind,
        ));
    }

    out.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.rule_id.cmp(&b.rule_id)));
    out
}

#[allow(clippy::too_many_arguments)]
fn finding(
    rule_id: &str,
    severity: Severity,
    symbol: &str,
    message: String,
    before: String,
    after: String,
    change_type: &str,
    kind: &str,
) -> BreakingChange {
    BreakingChange {
        rule_id: rule_id.to_string(),
        severity,
        symbol: symbol.to_string(),
        message,
        before,
        after,
        line: 0,
        context: FindingContext {
            change_type: change_type.to_string(),
            is_exported: true,
            kind: kind.to_string(),
            is_heuristic: rules::is_heuristic(rule_id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{AnalysisMode, VariableApiShape};
    use std::collections::BTreeMap;

    fn snapshot(entries: Vec<(&str, ApiShape)>) -> ApiSnapshot {
        ApiSnapshot {
            entrypoint_path: "src/index.ts".to_string(),
            exports: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
            timestamp: 0,
            partial: false,
            failed_shapes: Vec::new(),
            analysis_mode: AnalysisMode::TypeScript,
        }
    }

    fn var_shape(name: &str, ty: &str) -> ApiShape {
        ApiShape::Const(VariableApiShape {
            name: name.to_string(),
            type_text: ty.to_string(),
            readonly: true,
        })
    }

    #[test]
    fn identity_match_detects_type_change() {
        let before = snapshot(vec![("a|value|src/a.ts|0", var_shape("a", "number"))]);
        let after = snapshot(vec![("a|value|src/a.ts|0", var_shape("a", "string"))]);
        let diff = compute_api_diff(&before, &after);
        assert_eq!(diff.modified.len(), 1);
        assert!(diff.modified[0].details[0].contains("number"));
    }

    #[test]
    fn moved_declaration_matches_by_name_and_kind() {
        let before = snapshot(vec![("a|value|src/a.ts|0", var_shape("a", "number"))]);
        let after = snapshot(vec![("a|value|src/b.ts|40", var_shape("a", "number"))]);
        let diff = compute_api_diff(&before, &after);
        assert!(diff.is_empty(), "{diff:?}");
    }

    #[test]
    fn rename_detection_pairs_equal_shapes() {
        let before = snapshot(vec![("old|value|src/a.ts|0", var_shape("old", "number"))]);
        let after = snapshot(vec![("new|value|src/a.ts|0", var_shape("new", "number"))]);
        let diff = compute_api_diff(&before, &after);
        assert_eq!(diff.renamed.len(), 1);
        assert_eq!(diff.renamed[0].before_name, "old");
        assert_eq!(diff.renamed[0].after_name, "new");
        assert!(diff.removed.is_empty());
        assert!(diff.added.is_empty());
    }

    #[test]
    fn removal_produces_breaking_finding() {
        let before = snapshot(vec![("gone|value|src/a.ts|0", var_shape("gone", "number"))]);
        let after = snapshot(vec![]);
        let diff = compute_api_diff(&before, &after);
        let findings = api_diff_to_findings(&diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "TSAPI-EXP-001");
        assert_eq!(findings[0].severity, Severity::Breaking);
    }
}
