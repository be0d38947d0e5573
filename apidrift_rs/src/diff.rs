//! Snapshot diff engine.
//!
//! Compares two [`SymbolSnapshot`]s and emits symbol- and export-level
//! deltas, each classified against the rule catalog. The engine is
//! deterministic in insertion order; the formatter applies suppression,
//! disclaimers and priority dedup on top.
//!
//! Stages:
//! 1. Export diff - grouped by name (a name may appear as both a direct and
//!    a re-export entry), compared by literal signature strings.
//! 2. Symbol diff per kind - overload sets first for functions, member sets
//!    for classes, index signatures before properties for interfaces/types.
//!    Removed symbols whose name is covered by a removed export are
//!    suppressed.
//! 3. Package-level changes computed from the JS flavor's manifest
//!    summaries, passed through as opaque records.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{
    ClassMemberInfo, ExportInfo, IndexSignatureInfo, PackageChange, ParameterInfo, SymbolDetail,
    SymbolInfo, SymbolKind, SymbolSnapshot, TypePropertyInfo,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One classified symbol-level change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolDelta {
    /// Qualified symbol (`"Class.method"` for members).
    pub symbol: String,
    pub kind: SymbolKind,
    pub change: ChangeKind,
    /// Catalog rule this delta maps to.
    pub rule_id: String,
    pub message: String,
    pub before: String,
    pub after: String,
    pub line: usize,
    pub is_exported: bool,
}

/// A modified export with both sides kept for diagnosis (re-export source
/// swaps need the original entries).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportModified {
    pub before: ExportInfo,
    pub after: ExportInfo,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportChanges {
    pub added: Vec<ExportInfo>,
    pub removed: Vec<ExportInfo>,
    pub modified: Vec<ExportModified>,
}

/// Result of comparing two snapshots of one file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub changed_symbols: Vec<SymbolDelta>,
    /// Symbol names added / removed / modified, in emission order.
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    pub export_changes: ExportChanges,
    pub package_changes: Vec<PackageChange>,
    /// True when the "before" file was a pure barrel (re-exports only);
    /// drives the barrel-specific removal rule downstream.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub before_was_barrel: bool,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.changed_symbols.is_empty()
            && self.export_changes.added.is_empty()
            && self.export_changes.removed.is_empty()
            && self.export_changes.modified.is_empty()
            && self.package_changes.is_empty()
    }
}

fn is_ts_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".ts") || lower.ends_with(".tsx") || lower.ends_with(".mts") || lower.ends_with(".cts")
}

fn is_jsx_like(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".tsx") || lower.ends_with(".jsx")
}

/// Compare two snapshots of the same file.
pub fn diff_snapshots(before: &SymbolSnapshot, after: &SymbolSnapshot) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();
    let ts = is_ts_file(&after.file_path) || is_ts_file(&before.file_path);
    diff.before_was_barrel = before.is_barrel();

    diff_exports(before, after, &mut diff);

    // Names covered by a removed export suppress removed-symbol findings.
    let mut removed_export_names: HashSet<String> = HashSet::new();
    for entry in &diff.export_changes.removed {
        removed_export_names.insert(entry.name.clone());
        if let Some(local) = &entry.local_name {
            removed_export_names.insert(local.clone());
        }
    }

    let kinds: [(&[SymbolInfo], &[SymbolInfo]); 6] = [
        (&before.functions, &after.functions),
        (&before.classes, &after.classes),
        (&before.interfaces, &after.interfaces),
        (&before.types, &after.types),
        (&before.enums, &after.enums),
        (&before.variables, &after.variables),
    ];
    for (before_list, after_list) in kinds {
        diff_symbol_kind(
            before_list,
            after_list,
            ts,
            is_jsx_like(&after.file_path),
            &removed_export_names,
            &mut diff,
        );
    }

    if before.module_system != after.module_system
        && before.module_system != crate::types::ModuleSystem::Unknown
        && after.module_system != crate::types::ModuleSystem::Unknown
    {
        push_delta(
            &mut diff,
            SymbolDelta {
                symbol: "module".to_string(),
                kind: SymbolKind::Variable,
                change: ChangeKind::Modified,
                rule_id: "JSAPI-MOD-001".to_string(),
                message: format!(
                    "Module system changed from {:?} to {:?}",
                    before.module_system, after.module_system
                )
                .to_lowercase(),
                before: format!("{:?}", before.module_system).to_lowercase(),
                after: format!("{:?}", after.module_system).to_lowercase(),
                line: 1,
                is_exported: true,
            },
        );
    }

    diff.package_changes = diff_packages(before, after);
    diff
}

/// Stage 1: export diff, grouped by public name.
fn diff_exports(before: &SymbolSnapshot, after: &SymbolSnapshot, diff: &mut SnapshotDiff) {
    let group = |snapshot: &SymbolSnapshot| -> (Vec<String>, HashMap<String, Vec<ExportInfo>>) {
        let mut order = Vec::new();
        let mut map: HashMap<String, Vec<ExportInfo>> = HashMap::new();
        for export in &snapshot.exports {
            if !map.contains_key(&export.name) {
                order.push(export.name.clone());
            }
            map.entry(export.name.clone()).or_default().push(export.clone());
        }
        (order, map)
    };

    let (before_order, before_by_name) = group(before);
    let (after_order, after_by_name) = group(after);

    for name in &before_order {
        if !after_by_name.contains_key(name) {
            diff.export_changes
                .removed
                .extend(before_by_name[name].iter().cloned());
        }
    }
    for name in &after_order {
        if !before_by_name.contains_key(name) {
            diff.export_changes
                .added
                .extend(after_by_name[name].iter().cloned());
        }
    }

    for name in &before_order {
        let Some(after_entries) = after_by_name.get(name) else {
            continue;
        };
        let before_entries = &before_by_name[name];
        let len = before_entries.len().max(after_entries.len());
        for i in 0..len {
            match (before_entries.get(i), after_entries.get(i)) {
                (Some(b), Some(a)) => {
                    if b.diff_signature() != a.diff_signature() {
                        diff.export_changes.modified.push(ExportModified {
                            before: b.clone(),
                            after: a.clone(),
                        });
                    }
                }
                (Some(b), None) => diff.export_changes.removed.push(b.clone()),
                (None, Some(a)) => diff.export_changes.added.push(a.clone()),
                (None, None) => {}
            }
        }
    }
}

/// Stage 2 for one kind list pair.
fn diff_symbol_kind(
    before_list: &[SymbolInfo],
    after_list: &[SymbolInfo],
    ts: bool,
    jsx: bool,
    removed_export_names: &HashSet<String>,
    diff: &mut SnapshotDiff,
) {
    let before_map: HashMap<&str, &SymbolInfo> = before_list
        .iter()
        .map(|s| (s.qualified_name.as_str(), s))
        .collect();
    let after_map: HashMap<&str, &SymbolInfo> = after_list
        .iter()
        .map(|s| (s.qualified_name.as_str(), s))
        .collect();

    for sym in after_list {
        if !before_map.contains_key(sym.qualified_name.as_str()) {
            push_delta(
                diff,
                SymbolDelta {
                    symbol: sym.qualified_name.clone(),
                    kind: sym.kind,
                    change: ChangeKind::Added,
                    rule_id: "SYMBOL-ADDED".to_string(),
                    message: format!("{} '{}' was added", kind_label(sym.kind), sym.name),
                    before: String::new(),
                    after: sym.signature.clone(),
                    line: sym.line,
                    is_exported: sym.is_exported,
                },
            );
        }
    }

    for sym in before_list {
        if after_map.contains_key(sym.qualified_name.as_str()) {
            continue;
        }
        // The export-removed finding already covers this name.
        if removed_export_names.contains(&sym.name) {
            continue;
        }
        let rule_id = match sym.kind {
            SymbolKind::Enum => "ENUM_REMOVED",
            SymbolKind::Class => "TSAPI-CLS-003",
            _ => "SYMBOL-REMOVED",
        };
        push_delta(
            diff,
            SymbolDelta {
                symbol: sym.qualified_name.clone(),
                kind: sym.kind,
                change: ChangeKind::Removed,
                rule_id: rule_id.to_string(),
                message: format!("{} '{}' was removed", kind_label(sym.kind), sym.name),
                before: sym.signature.clone(),
                after: String::new(),
                line: sym.line,
                is_exported: sym.is_exported,
            },
        );
    }

    for sym in before_list {
        let Some(after_sym) = after_map.get(sym.qualified_name.as_str()) else {
            continue;
        };
        diff_symbol_pair(sym, after_sym, ts, jsx, diff);
    }
}

fn diff_symbol_pair(
    before: &SymbolInfo,
    after: &SymbolInfo,
    ts: bool,
    jsx: bool,
    diff: &mut SnapshotDiff,
) {
    let emitted_before = diff.changed_symbols.len();

    match before.kind {
        SymbolKind::Function | SymbolKind::Method => {
            diff_function(before, after, ts, jsx, diff);
        }
        SymbolKind::Class => diff_class(before, after, ts, diff),
        SymbolKind::Interface => diff_interface(before, after, diff),
        SymbolKind::Type => diff_type_alias(before, after, diff),
        SymbolKind::Enum => diff_enum(before, after, diff),
        _ => {}
    }

    // Fallback: no specific rule fired but the signatures disagree.
    if diff.changed_symbols.len() == emitted_before && before.signature != after.signature {
        push_delta(
            diff,
            SymbolDelta {
                symbol: after.qualified_name.clone(),
                kind: after.kind,
                change: ChangeKind::Modified,
                rule_id: "SIGNATURE-CHANGED".to_string(),
                message: format!(
                    "Signature of '{}' changed from '{}' to '{}'",
                    after.name, before.signature, after.signature
                ),
                before: before.signature.clone(),
                after: after.signature.clone(),
                line: after.line,
                is_exported: after.is_exported,
            },
        );
    }
}

fn overload_keys(sym: &SymbolInfo) -> Vec<String> {
    match &sym.overloads {
        Some(keys) => keys.clone(),
        None => vec![crate::analyzer::ast_ts::symbols::call_signature(
            sym.parameters.as_deref().unwrap_or(&[]),
            sym.return_type.as_deref(),
        )],
    }
}

fn diff_function(
    before: &SymbolInfo,
    after: &SymbolInfo,
    ts: bool,
    jsx: bool,
    diff: &mut SnapshotDiff,
) {
    let exported = before.is_exported || after.is_exported;

    // Overload-set check first: one finding, no further checks.
    if before.overloads.is_some() || after.overloads.is_some() {
        let before_keys = overload_keys(before);
        let after_keys = overload_keys(after);
        let before_set: HashSet<&String> = before_keys.iter().collect();
        let after_set: HashSet<&String> = after_keys.iter().collect();
        if before_set != after_set {
            let added: Vec<&str> = after_keys
                .iter()
                .filter(|k| !before_set.contains(k))
                .map(|s| s.as_str())
                .collect();
            let removed: Vec<&str> = before_keys
                .iter()
                .filter(|k| !after_set.contains(k))
                .map(|s| s.as_str())
                .collect();
            push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: after.kind,
                    change: ChangeKind::Modified,
                    rule_id: "TSAPI-FN-007".to_string(),
                    message: format!(
                        "Overload set of '{}' changed ({} removed, {} added)",
                        after.name,
                        removed.len(),
                        added.len()
                    ),
                    before: before_keys.join(" / "),
                    after: after_keys.join(" / "),
                    line: after.line,
                    is_exported: exported,
                },
            );
        }
        return;
    }

    let empty: Vec<ParameterInfo> = Vec::new();
    let before_params = before.parameters.as_ref().unwrap_or(&empty);
    let after_params = after.parameters.as_ref().unwrap_or(&empty);

    if !ts {
        diff_function_js(before, after, before_params, after_params, jsx, diff);
        return;
    }

    let after_by_name: HashMap<&str, &ParameterInfo> =
        after_params.iter().map(|p| (p.name.as_str(), p)).collect();
    let before_names: HashSet<&str> = before_params.iter().map(|p| p.name.as_str()).collect();

    for param in before_params {
        if !after_by_name.contains_key(param.name.as_str()) {
            push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: after.kind,
                    change: ChangeKind::Modified,
                    rule_id: "TSAPI-FN-002".to_string(),
                    message: format!(
                        "Parameter '{}' was removed from '{}'",
                        param.name, after.name
                    ),
                    before: before.signature.clone(),
                    after: after.signature.clone(),
                    line: after.line,
                    is_exported: exported,
                },
            );
        }
    }

    for param in after_params {
        match before_params.iter().find(|p| p.name == param.name) {
            Some(before_param) => {
                if before_param.optional && !param.optional {
                    push_delta(
                        diff,
                        SymbolDelta {
                            symbol: after.qualified_name.clone(),
                            kind: after.kind,
                            change: ChangeKind::Modified,
                            rule_id: "TSAPI-FN-001".to_string(),
                            message: format!(
                                "Parameter '{}' of '{}' is no longer optional",
                                param.name, after.name
                            ),
                            before: before.signature.clone(),
                            after: after.signature.clone(),
                            line: after.line,
                            is_exported: exported,
                        },
                    );
                } else if before_param.type_text != param.type_text {
                    push_delta(
                        diff,
                        SymbolDelta {
                            symbol: after.qualified_name.clone(),
                            kind: after.kind,
                            change: ChangeKind::Modified,
                            rule_id: "TSAPI-FN-003".to_string(),
                            message: format!(
                                "Parameter '{}' of '{}' changed type from '{}' to '{}'",
                                param.name, after.name, before_param.type_text, param.type_text
                            ),
                            before: before.signature.clone(),
                            after: after.signature.clone(),
                            line: after.line,
                            is_exported: exported,
                        },
                    );
                }
            }
            None => {
                // Added optional parameters are compatible; added required
                // parameters break every existing call site.
                if !param.optional && !param.rest && !before_names.contains(param.name.as_str()) {
                    push_delta(
                        diff,
                        SymbolDelta {
                            symbol: after.qualified_name.clone(),
                            kind: after.kind,
                            change: ChangeKind::Modified,
                            rule_id: "TSAPI-FN-001".to_string(),
                            message: format!(
                                "Parameter '{}' of '{}' is required but was not accepted before",
                                param.name, after.name
                            ),
                            before: before.signature.clone(),
                            after: after.signature.clone(),
                            line: after.line,
                            is_exported: exported,
                        },
                    );
                }
            }
        }
    }

    let before_ret = before.return_type.as_deref().unwrap_or("");
    let after_ret = after.return_type.as_deref().unwrap_or("");
    if before_ret != after_ret {
        push_delta(
            diff,
            SymbolDelta {
                symbol: after.qualified_name.clone(),
                kind: after.kind,
                change: ChangeKind::Modified,
                rule_id: "TSAPI-FN-004".to_string(),
                message: format!(
                    "Return type of '{}' changed from '{}' to '{}'",
                    after.name, before_ret, after_ret
                ),
                before: before.signature.clone(),
                after: after.signature.clone(),
                line: after.line,
                is_exported: exported,
            },
        );
    }
}

/// Structural-only function checks for the JavaScript flavor.
fn diff_function_js(
    before: &SymbolInfo,
    after: &SymbolInfo,
    before_params: &[ParameterInfo],
    after_params: &[ParameterInfo],
    jsx: bool,
    diff: &mut SnapshotDiff,
) {
    let exported = before.is_exported || after.is_exported;
    let component = jsx && after.name.chars().next().is_some_and(|c| c.is_uppercase());

    let mut changes: Vec<(String, String)> = Vec::new();
    if before_params.len() != after_params.len() {
        changes.push((
            "JSAPI-FN-001".to_string(),
            format!(
                "Function '{}' parameter count changed from {} to {}",
                after.name,
                before_params.len(),
                after_params.len()
            ),
        ));
    } else if before_params
        .iter()
        .zip(after_params.iter())
        .any(|(b, a)| b.name != a.name)
    {
        changes.push((
            "JSAPI-FN-002".to_string(),
            format!("Function '{}' parameters were renamed", after.name),
        ));
    }

    let async_of = |sym: &SymbolInfo| match &sym.detail {
        SymbolDetail::Function { is_async, .. } => *is_async,
        _ => false,
    };
    if async_of(before) != async_of(after) {
        changes.push((
            "JSAPI-FN-003".to_string(),
            format!(
                "Function '{}' {} async",
                after.name,
                if async_of(after) { "became" } else { "is no longer" }
            ),
        ));
    }

    for (rule_id, message) in changes {
        let rule_id = if component {
            "JSAPI-JSX-001".to_string()
        } else {
            rule_id
        };
        push_delta(
            diff,
            SymbolDelta {
                symbol: after.qualified_name.clone(),
                kind: after.kind,
                change: ChangeKind::Modified,
                rule_id,
                message,
                before: before.signature.clone(),
                after: after.signature.clone(),
                line: after.line,
                is_exported: exported,
            },
        );
    }
}

fn class_members(sym: &SymbolInfo) -> &[ClassMemberInfo] {
    match &sym.detail {
        SymbolDetail::Class { members, .. } => members,
        _ => &[],
    }
}

fn diff_class(before: &SymbolInfo, after: &SymbolInfo, ts: bool, diff: &mut SnapshotDiff) {
    let exported = before.is_exported || after.is_exported;
    let before_members = class_members(before);
    let after_members = class_members(after);
    let after_names: HashSet<&str> = after_members.iter().map(|m| m.name.as_str()).collect();

    for member in before_members {
        if member.visibility == "private" || member.kind == "constructor" {
            continue;
        }
        if !after_names.contains(member.name.as_str()) {
            let qualified = format!("{}.{}", before.name, member.name);
            // JavaScript class rules stay in the heuristic warning family.
            let (rule_id, kind) = if member.kind == "property" {
                if ts {
                    ("TSAPI-CLS-004", SymbolKind::Property)
                } else {
                    ("JSAPI-CLS-002", SymbolKind::Property)
                }
            } else if ts {
                ("TSAPI-CLS-001", SymbolKind::Method)
            } else {
                ("JSAPI-CLS-002", SymbolKind::Method)
            };
            let message = if member.kind == "property" {
                format!("Property '{}' was removed from class", qualified)
            } else {
                format!("Method '{}' was removed from class", qualified)
            };
            push_delta(
                diff,
                SymbolDelta {
                    symbol: qualified,
                    kind,
                    change: ChangeKind::Removed,
                    rule_id: rule_id.to_string(),
                    message,
                    before: member.signature.clone(),
                    after: String::new(),
                    line: before.line,
                    is_exported: exported,
                },
            );
        }
    }

    for member in after_members {
        if member.visibility == "private" || member.kind == "constructor" {
            continue;
        }
        let Some(before_member) = before_members.iter().find(|m| m.name == member.name) else {
            continue;
        };
        if before_member.visibility == "private" {
            continue;
        }
        if before_member.signature != member.signature
            || before_member.is_static != member.is_static
            || before_member.visibility != member.visibility
        {
            let qualified = format!("{}.{}", after.name, member.name);
            push_delta(
                diff,
                SymbolDelta {
                    symbol: qualified.clone(),
                    kind: if member.kind == "property" {
                        SymbolKind::Property
                    } else {
                        SymbolKind::Method
                    },
                    change: ChangeKind::Modified,
                    rule_id: if ts { "TSAPI-CLS-002" } else { "JSAPI-CLS-002" }.to_string(),
                    message: format!(
                        "Signature of '{}' changed from '{}' to '{}'",
                        qualified, before_member.signature, member.signature
                    ),
                    before: before_member.signature.clone(),
                    after: member.signature.clone(),
                    line: after.line,
                    is_exported: exported,
                },
            );
        }
    }

    // Hierarchy changes matter even when every member matched.
    let extends_of = |sym: &SymbolInfo| match &sym.detail {
        SymbolDetail::Class { extends, .. } => extends.clone(),
        _ => None,
    };
    if !ts && extends_of(before) != extends_of(after) {
        push_delta(
            diff,
            SymbolDelta {
                symbol: after.qualified_name.clone(),
                kind: SymbolKind::Class,
                change: ChangeKind::Modified,
                rule_id: "JSAPI-CLS-003".to_string(),
                message: format!(
                    "Class '{}' changed its parent from '{}' to '{}'",
                    after.name,
                    extends_of(before).unwrap_or_default(),
                    extends_of(after).unwrap_or_default()
                ),
                before: before.signature.clone(),
                after: after.signature.clone(),
                line: after.line,
                is_exported: exported,
            },
        );
    }
}

fn type_members(
    sym: &SymbolInfo,
) -> (&[TypePropertyInfo], &[IndexSignatureInfo], Option<&String>) {
    match &sym.detail {
        SymbolDetail::Interface {
            properties,
            index_signatures,
            ..
        } => (properties, index_signatures, None),
        SymbolDetail::TypeAlias {
            properties,
            index_signatures,
            type_text,
            ..
        } => (properties, index_signatures, type_text.as_ref()),
        _ => (&[], &[], None),
    }
}

fn diff_interface(before: &SymbolInfo, after: &SymbolInfo, diff: &mut SnapshotDiff) {
    diff_property_bag(before, after, "TSAPI-IF", diff);
}

fn diff_type_alias(before: &SymbolInfo, after: &SymbolInfo, diff: &mut SnapshotDiff) {
    let (_, _, before_text) = type_members(before);
    let (_, _, after_text) = type_members(after);

    // Aliases whose properties could not be extracted compare by type text.
    if before_text.is_some() || after_text.is_some() {
        if before_text != after_text {
            push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: SymbolKind::Type,
                    change: ChangeKind::Modified,
                    rule_id: "TSAPI-TYPE-002".to_string(),
                    message: format!(
                        "Type '{}' changed from '{}' to '{}'",
                        after.name,
                        before_text.map(String::as_str).unwrap_or("{ ... }"),
                        after_text.map(String::as_str).unwrap_or("{ ... }")
                    ),
                    before: before.signature.clone(),
                    after: after.signature.clone(),
                    line: after.line,
                    is_exported: before.is_exported || after.is_exported,
                },
            );
        }
        return;
    }

    diff_property_bag(before, after, "TSAPI-TYPE", diff);
}

/// Shared interface/type-alias member diff. Rule suffixes differ per family:
/// interfaces use -001/-002/-003 (removed/optional/type+index), aliases use
/// -001/-003/-004 with -002 for index changes.
fn diff_property_bag(
    before: &SymbolInfo,
    after: &SymbolInfo,
    family: &str,
    diff: &mut SnapshotDiff,
) {
    let exported = before.is_exported || after.is_exported;
    let (before_props, before_idx, _) = type_members(before);
    let (after_props, after_idx, _) = type_members(after);
    let interface = family == "TSAPI-IF";

    let removed_rule = format!("{family}-001");
    let optional_rule = if interface {
        format!("{family}-002")
    } else {
        format!("{family}-003")
    };
    let type_rule = if interface {
        format!("{family}-003")
    } else {
        format!("{family}-004")
    };
    let index_changed_rule = if interface {
        format!("{family}-003")
    } else {
        format!("{family}-002")
    };

    // Index signatures first.
    for idx in before_idx {
        match after_idx.iter().find(|a| a.key_type == idx.key_type) {
            None => push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: after.kind,
                    change: ChangeKind::Modified,
                    rule_id: removed_rule.clone(),
                    message: format!(
                        "Index signature '[{}: {}]' was removed from '{}'",
                        idx.key_name, idx.key_type, after.name
                    ),
                    before: format!("[{}: {}]: {}", idx.key_name, idx.key_type, idx.value_type),
                    after: String::new(),
                    line: after.line,
                    is_exported: exported,
                },
            ),
            Some(after_sig) if after_sig.value_type != idx.value_type => push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: after.kind,
                    change: ChangeKind::Modified,
                    rule_id: index_changed_rule.clone(),
                    message: format!(
                        "Index signature of '{}' changed value type from '{}' to '{}'",
                        after.name, idx.value_type, after_sig.value_type
                    ),
                    before: format!("[{}: {}]: {}", idx.key_name, idx.key_type, idx.value_type),
                    after: format!(
                        "[{}: {}]: {}",
                        after_sig.key_name, after_sig.key_type, after_sig.value_type
                    ),
                    line: after.line,
                    is_exported: exported,
                },
            ),
            _ => {}
        }
    }

    for prop in before_props {
        let Some(after_prop) = after_props.iter().find(|p| p.name == prop.name) else {
            push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: after.kind,
                    change: ChangeKind::Modified,
                    rule_id: removed_rule.clone(),
                    message: format!("Property '{}' was removed from '{}'", prop.name, after.name),
                    before: format!("{}: {}", prop.name, prop.type_text),
                    after: String::new(),
                    line: after.line,
                    is_exported: exported,
                },
            );
            continue;
        };
        if prop.optional && !after_prop.optional {
            push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: after.kind,
                    change: ChangeKind::Modified,
                    rule_id: optional_rule.clone(),
                    message: format!(
                        "Property '{}' of '{}' is no longer optional",
                        prop.name, after.name
                    ),
                    before: format!("{}?: {}", prop.name, prop.type_text),
                    after: format!("{}: {}", after_prop.name, after_prop.type_text),
                    line: after.line,
                    is_exported: exported,
                },
            );
        } else if prop.type_text != after_prop.type_text {
            push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: after.kind,
                    change: ChangeKind::Modified,
                    rule_id: type_rule.clone(),
                    message: format!(
                        "Property '{}' of '{}' changed type from '{}' to '{}'",
                        prop.name, after.name, prop.type_text, after_prop.type_text
                    ),
                    before: format!("{}: {}", prop.name, prop.type_text),
                    after: format!("{}: {}", after_prop.name, after_prop.type_text),
                    line: after.line,
                    is_exported: exported,
                },
            );
        }
    }
}

fn diff_enum(before: &SymbolInfo, after: &SymbolInfo, diff: &mut SnapshotDiff) {
    let exported = before.is_exported || after.is_exported;
    let members_of = |sym: &SymbolInfo| match &sym.detail {
        SymbolDetail::Enum { members, .. } => members.clone(),
        _ => Vec::new(),
    };
    let before_members = members_of(before);
    let after_members = members_of(after);

    for member in &before_members {
        if !after_members.iter().any(|m| m.name == member.name) {
            push_delta(
                diff,
                SymbolDelta {
                    symbol: after.qualified_name.clone(),
                    kind: SymbolKind::Enum,
                    change: ChangeKind::Modified,
                    rule_id: "ENUM_MEMBER_REMOVED".to_string(),
                    message: format!(
                        "Enum member '{}.{}' was removed",
                        after.name, member.name
                    ),
                    before: member.name.clone(),
                    after: String::new(),
                    line: after.line,
                    is_exported: exported,
                },
            );
        }
    }
}

fn diff_packages(before: &SymbolSnapshot, after: &SymbolSnapshot) -> Vec<PackageChange> {
    let (Some(b), Some(a)) = (&before.package, &after.package) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if b.module_type != a.module_type {
        out.push(PackageChange {
            field: "type".to_string(),
            before: b.module_type.clone().unwrap_or_default(),
            after: a.module_type.clone().unwrap_or_default(),
        });
    }
    if b.main != a.main {
        out.push(PackageChange {
            field: "main".to_string(),
            before: b.main.clone().unwrap_or_default(),
            after: a.main.clone().unwrap_or_default(),
        });
    }
    if b.exports_keys != a.exports_keys {
        out.push(PackageChange {
            field: "exports".to_string(),
            before: b.exports_keys.join(", "),
            after: a.exports_keys.join(", "),
        });
    }
    out
}

fn kind_label(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Function => "Function",
        SymbolKind::Class => "Class",
        SymbolKind::Interface => "Interface",
        SymbolKind::Type => "Type",
        SymbolKind::Enum => "Enum",
        SymbolKind::Variable => "Variable",
        SymbolKind::Method => "Method",
        SymbolKind::Property => "Property",
    }
}

fn push_delta(diff: &mut SnapshotDiff, delta: SymbolDelta) {
    match delta.change {
        ChangeKind::Added => diff.added.push(delta.symbol.clone()),
        ChangeKind::Removed => diff.removed.push(delta.symbol.clone()),
        ChangeKind::Modified => {
            if !diff.modified.contains(&delta.symbol) {
                diff.modified.push(delta.symbol.clone());
            }
        }
    }
    diff.changed_symbols.push(delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ast_ts::build_snapshot_standalone;

    fn ts_diff(before: &str, after: &str) -> SnapshotDiff {
        let b = build_snapshot_standalone("src/mod.ts", before);
        let a = build_snapshot_standalone("src/mod.ts", after);
        diff_snapshots(&b, &a)
    }

    #[test]
    fn self_diff_is_empty() {
        let src = r#"
        export function greet(who?: string): string { return ""; }
        export class Client { ping(): string { return "ok"; } }
        export interface Opts { timeout: number; }
        export type Mode = "a" | "b";
        export enum Color { Red, Green }
        export * from "./missing";
        "#;
        let snap = build_snapshot_standalone("src/mod.ts", src);
        let diff = diff_snapshots(&snap, &snap);
        assert!(diff.is_empty(), "self diff not empty: {diff:?}");
    }

    #[test]
    fn optional_to_required_parameter() {
        let diff = ts_diff(
            "export function greet(who?: string): string { return \"\"; }\n",
            "export function greet(who: string): string { return \"\"; }\n",
        );
        assert_eq!(diff.changed_symbols.len(), 1);
        let delta = &diff.changed_symbols[0];
        assert_eq!(delta.rule_id, "TSAPI-FN-001");
        assert_eq!(delta.symbol, "greet");
        assert!(delta.before.contains("who?: string"));
        assert!(delta.after.contains("who: string"));
    }

    #[test]
    fn added_optional_parameter_is_not_a_finding() {
        let diff = ts_diff(
            "export function f(a: number): void {}\n",
            "export function f(a: number, b?: string): void {}\n",
        );
        assert!(
            diff.changed_symbols.iter().all(|d| d.rule_id != "TSAPI-FN-001"),
            "added optional param must not fire FN-001: {:?}",
            diff.changed_symbols
        );
    }

    #[test]
    fn added_required_parameter_fires_fn001() {
        let diff = ts_diff(
            "export function f(a: number): void {}\n",
            "export function f(a: number, b: string): void {}\n",
        );
        let delta = diff
            .changed_symbols
            .iter()
            .find(|d| d.rule_id == "TSAPI-FN-001")
            .expect("FN-001 expected");
        assert!(delta.message.contains("'b'"));
    }

    #[test]
    fn parameter_removed_and_return_changed() {
        let diff = ts_diff(
            "export function f(a: number, b: string): number { return 1; }\n",
            "export function f(a: number): string { return \"\"; }\n",
        );
        let rules: Vec<&str> = diff
            .changed_symbols
            .iter()
            .map(|d| d.rule_id.as_str())
            .collect();
        assert!(rules.contains(&"TSAPI-FN-002"));
        assert!(rules.contains(&"TSAPI-FN-004"));
    }

    #[test]
    fn overload_set_change_is_single_finding() {
        let diff = ts_diff(
            r#"
            export function pick(v: string): string;
            export function pick(v: number): number;
            export function pick(v: unknown): unknown { return v; }
            "#,
            r#"
            export function pick(v: string): string;
            export function pick(v: unknown): unknown { return v; }
            "#,
        );
        let fn_rules: Vec<&SymbolDelta> = diff
            .changed_symbols
            .iter()
            .filter(|d| d.rule_id.starts_with("TSAPI-FN"))
            .collect();
        assert_eq!(fn_rules.len(), 1);
        assert_eq!(fn_rules[0].rule_id, "TSAPI-FN-007");
    }

    #[test]
    fn class_method_removed_is_requalified() {
        let diff = ts_diff(
            "export class Client { ping(): string { return \"ok\"; } }\n",
            "export class Client {}\n",
        );
        let delta = diff
            .changed_symbols
            .iter()
            .find(|d| d.rule_id == "TSAPI-CLS-001")
            .expect("CLS-001 expected");
        assert_eq!(delta.symbol, "Client.ping");
        assert_eq!(delta.kind, SymbolKind::Method);
        assert_eq!(delta.message, "Method 'Client.ping' was removed from class");
    }

    #[test]
    fn interface_property_type_change() {
        let diff = ts_diff(
            "export interface Opts { timeout: number; }\n",
            "export interface Opts { timeout: string; }\n",
        );
        let delta = diff
            .changed_symbols
            .iter()
            .find(|d| d.rule_id == "TSAPI-IF-003")
            .expect("IF-003 expected");
        assert_eq!(delta.symbol, "Opts");
        assert!(delta.message.contains("timeout"));
        assert!(delta.message.contains("number"));
        assert!(delta.message.contains("string"));
    }

    #[test]
    fn interface_index_signature_rules() {
        let removed = ts_diff(
            "export interface Bag { [key: string]: number; a: number; }\n",
            "export interface Bag { a: number; }\n",
        );
        assert!(removed
            .changed_symbols
            .iter()
            .any(|d| d.rule_id == "TSAPI-IF-001" && d.message.contains("Index signature")));

        let changed = ts_diff(
            "export interface Bag { [key: string]: number; }\n",
            "export interface Bag { [key: string]: string; }\n",
        );
        assert!(changed
            .changed_symbols
            .iter()
            .any(|d| d.rule_id == "TSAPI-IF-003"));
    }

    #[test]
    fn union_alias_text_change() {
        let diff = ts_diff(
            "export type Mode = \"a\" | \"b\";\n",
            "export type Mode = \"a\" | \"c\";\n",
        );
        assert!(diff
            .changed_symbols
            .iter()
            .any(|d| d.rule_id == "TSAPI-TYPE-002"));
    }

    #[test]
    fn enum_member_removed() {
        let diff = ts_diff(
            "export enum Color { Red, Green }\n",
            "export enum Color { Red }\n",
        );
        let delta = diff
            .changed_symbols
            .iter()
            .find(|d| d.rule_id == "ENUM_MEMBER_REMOVED")
            .expect("member removal expected");
        assert!(delta.message.contains("Color.Green"));
    }

    #[test]
    fn removed_export_suppresses_removed_symbol() {
        let diff = ts_diff(
            "export function gone(): void {}\n",
            "const unrelated = 1;\n",
        );
        assert_eq!(diff.export_changes.removed.len(), 1);
        assert!(
            !diff
                .changed_symbols
                .iter()
                .any(|d| d.change == ChangeKind::Removed && d.symbol == "gone"),
            "removed export must suppress the removed-symbol delta"
        );
    }

    #[test]
    fn reexport_source_swap_is_modified_with_both_sides() {
        let diff = ts_diff(
            "export { a as x } from \"./m\";\n",
            "export { b as x } from \"./m\";\n",
        );
        assert_eq!(diff.export_changes.modified.len(), 1);
        let modified = &diff.export_changes.modified[0];
        assert_eq!(modified.before.source_name.as_deref(), Some("a"));
        assert_eq!(modified.after.source_name.as_deref(), Some("b"));
    }

    #[test]
    fn class_property_removal_rules_follow_flavor() {
        let diff = ts_diff(
            "export class Config { endpoint: string = \"\"; ping(): void {} }\n",
            "export class Config { ping(): void {} }\n",
        );
        let delta = diff
            .changed_symbols
            .iter()
            .find(|d| d.rule_id == "TSAPI-CLS-004")
            .expect("CLS-004 expected for a TypeScript property removal");
        assert_eq!(delta.symbol, "Config.endpoint");
        assert_eq!(delta.kind, SymbolKind::Property);

        let b = build_snapshot_standalone(
            "src/store.js",
            "export class Store { limit = 10; get(key) { return key; } }\n",
        );
        let a = build_snapshot_standalone(
            "src/store.js",
            "export class Store { get(key) { return key; } }\n",
        );
        let diff = diff_snapshots(&b, &a);
        let delta = diff
            .changed_symbols
            .iter()
            .find(|d| d.rule_id == "JSAPI-CLS-002")
            .expect("JSAPI-CLS-002 expected for a JavaScript property removal");
        assert_eq!(delta.symbol, "Store.limit");
        assert_eq!(delta.kind, SymbolKind::Property);
        assert!(
            diff.changed_symbols
                .iter()
                .all(|d| !d.rule_id.starts_with("TSAPI-CLS")),
            "JS class changes must not use TypeScript class rules: {:?}",
            diff.changed_symbols
        );
    }

    #[test]
    fn js_param_count_change_is_heuristic_rule() {
        let b = build_snapshot_standalone("src/mod.js", "export function f(a) {}\n");
        let a = build_snapshot_standalone("src/mod.js", "export function f(a, b) {}\n");
        let diff = diff_snapshots(&b, &a);
        assert!(diff
            .changed_symbols
            .iter()
            .any(|d| d.rule_id == "JSAPI-FN-001"));
    }
}
