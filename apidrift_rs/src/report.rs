//! Report formatter: from a [`SnapshotDiff`] to an impact report.
//!
//! Projects symbol- and export-level deltas into [`BreakingChange`] findings
//! keyed by the rule catalog, then applies the suppression pipeline:
//! named/default transitions, import-specifier pairing, CJS default-shape
//! collapse, the heuristic disclaimer, and priority deduplication per
//! `(file, symbol)` group. The impacted-symbol list is derived from the
//! retained findings, never the other way around.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::{ExportModified, SnapshotDiff, SymbolDelta};
use crate::rules;
use crate::types::{ExportInfo, ExportType, Severity};

/// Context bag attached to every finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingContext {
    /// "added" | "removed" | "modified"
    pub change_type: String,
    pub is_exported: bool,
    pub kind: String,
    pub is_heuristic: bool,
}

/// One classified API compatibility finding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BreakingChange {
    pub rule_id: String,
    pub severity: Severity,
    pub symbol: String,
    pub message: String,
    pub before: String,
    pub after: String,
    pub line: usize,
    pub context: FindingContext,
}

/// Externally-supplied downstream context merged into the report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImpactBundle {
    pub downstream_files: Vec<String>,
    pub affected_tests: Vec<String>,
}

/// Final per-file impact report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Repo-relative path with forward slashes.
    pub file: String,
    pub breaking_changes: Vec<BreakingChange>,
    pub impacted_symbols: Vec<String>,
    pub downstream_files: Vec<String>,
    pub affected_tests: Vec<String>,
}

impl ImpactReport {
    pub fn has_breaking(&self) -> bool {
        self.breaking_changes
            .iter()
            .any(|c| c.severity == Severity::Breaking)
    }
}

fn is_ts_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".ts")
        || lower.ends_with(".tsx")
        || lower.ends_with(".mts")
        || lower.ends_with(".cts")
}

/// Repo-relative path with forward slashes.
pub fn relative_path(path: &str, root: &Path) -> String {
    let normalized = path.replace('\\', "/");
    let root_str = root.to_string_lossy().replace('\\', "/");
    normalized
        .strip_prefix(&format!("{}/", root_str.trim_end_matches('/')))
        .map(|s| s.to_string())
        .unwrap_or(normalized)
}

/// Format a snapshot diff into the final report.
pub fn format_report(
    file_path: &str,
    diff: &SnapshotDiff,
    bundle: &ImpactBundle,
    project_root: &Path,
) -> ImpactReport {
    let file = relative_path(file_path, project_root);
    let ts = is_ts_file(&file);
    let mut findings: Vec<BreakingChange> = Vec::new();

    let mut removed: Vec<ExportInfo> = diff.export_changes.removed.clone();
    let mut added: Vec<ExportInfo> = diff.export_changes.added.clone();
    let mut modified: Vec<ExportModified> = diff.export_changes.modified.clone();

    apply_export_transitions(&mut removed, &mut added, &mut findings);
    apply_specifier_changes(&mut removed, &mut added, &mut modified, &mut findings);
    apply_cjs_shape_changes(&mut modified, &mut findings);

    for entry in &removed {
        findings.push(export_removed_finding(entry, ts, diff.before_was_barrel));
    }
    for entry in &added {
        let rule_id = if ts { "EXPORT-ADDED" } else { "JSAPI-EXP-002" };
        findings.push(make_finding(
            rule_id,
            rules::base_severity(rule_id),
            &entry.name,
            format!("Export '{}' was added", entry.name),
            String::new(),
            entry.diff_signature(),
            entry.line,
            "added",
            true,
            &entry.kind,
        ));
    }
    for entry in &modified {
        findings.push(export_modified_finding(entry, ts));
    }

    for delta in &diff.changed_symbols {
        if let Some(finding) = symbol_finding(delta, &added) {
            findings.push(finding);
        }
    }

    for change in &diff.package_changes {
        findings.push(make_finding(
            "JSAPI-MOD-002",
            rules::base_severity("JSAPI-MOD-002"),
            "package.json",
            format!(
                "package.json '{}' changed from '{}' to '{}'",
                change.field, change.before, change.after
            ),
            change.before.clone(),
            change.after.clone(),
            1,
            "modified",
            true,
            "package",
        ));
    }

    for finding in &mut findings {
        if rules::needs_disclaimer(&finding.rule_id, &finding.message) {
            finding.message.push_str(rules::HEURISTIC_DISCLAIMER);
        }
    }

    let findings = dedup_by_priority(findings);

    let mut impacted: Vec<String> = Vec::new();
    for finding in &findings {
        push_unique(&mut impacted, finding.symbol.clone());
        // Member removals impact the container class too.
        if matches!(
            finding.rule_id.as_str(),
            "TSAPI-CLS-001" | "TSAPI-CLS-004" | "JSAPI-CLS-002"
        ) {
            if let Some((class, _)) = finding.symbol.split_once('.') {
                push_unique(&mut impacted, class.to_string());
            }
        }
    }
    impacted.sort();

    let mut findings = findings;
    findings.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.rule_id.cmp(&b.rule_id)));

    let mut downstream_files = bundle.downstream_files.clone();
    downstream_files.sort();
    downstream_files.dedup();
    let mut affected_tests = bundle.affected_tests.clone();
    affected_tests.sort();
    affected_tests.dedup();

    ImpactReport {
        file,
        breaking_changes: findings,
        impacted_symbols: impacted,
        downstream_files,
        affected_tests,
    }
}

/// Named <-> default export transitions collapse a removed/added pair into a
/// single transition finding and suppress the generic removals.
fn apply_export_transitions(
    removed: &mut Vec<ExportInfo>,
    added: &mut Vec<ExportInfo>,
    findings: &mut Vec<BreakingChange>,
) {
    let mut removed_drop = Vec::new();
    let mut added_drop = Vec::new();

    for (ri, r) in removed.iter().enumerate() {
        if removed_drop.contains(&ri) {
            continue;
        }
        // named -> default
        if r.export_type == ExportType::Named {
            if let Some((ai, a)) = added.iter().enumerate().find(|(ai, a)| {
                !added_drop.contains(ai)
                    && a.export_type == ExportType::Default
                    && a.local_name.as_deref() == Some(r.name.as_str())
            }) {
                findings.push(make_finding(
                    "JSAPI-EXP-006",
                    rules::base_severity("JSAPI-EXP-006"),
                    &r.name,
                    format!("Export '{}' changed from named to default export", r.name),
                    r.diff_signature(),
                    a.diff_signature(),
                    a.line,
                    "modified",
                    true,
                    &r.kind,
                ));
                removed_drop.push(ri);
                added_drop.push(ai);
                continue;
            }
        }
        // default -> named
        if r.export_type == ExportType::Default {
            let local = r.local_name.clone();
            if let Some(local) = local {
                if let Some((ai, a)) = added.iter().enumerate().find(|(ai, a)| {
                    !added_drop.contains(ai)
                        && a.export_type == ExportType::Named
                        && a.name == local
                }) {
                    findings.push(make_finding(
                        "JSAPI-EXP-007",
                        rules::base_severity("JSAPI-EXP-007"),
                        &local,
                        format!(
                            "Export '{}' changed from default to named export",
                            local
                        ),
                        r.diff_signature(),
                        a.diff_signature(),
                        a.line,
                        "modified",
                        true,
                        &r.kind,
                    ));
                    removed_drop.push(ri);
                    added_drop.push(ai);
                }
            }
        }
    }

    retain_not_dropped(removed, &removed_drop);
    retain_not_dropped(added, &added_drop);
}

/// `export { x } from "./m"` vs `"./m.js"` is a specifier change, not a
/// removal plus addition.
fn apply_specifier_changes(
    removed: &mut Vec<ExportInfo>,
    added: &mut Vec<ExportInfo>,
    modified: &mut Vec<ExportModified>,
    findings: &mut Vec<BreakingChange>,
) {
    fn specifier_variant(before: &str, after: &str) -> bool {
        after.strip_suffix(".js").is_some_and(|stem| stem == before)
            || before.strip_suffix(".js").is_some_and(|stem| stem == after)
            || after.strip_suffix(".jsx").is_some_and(|stem| stem == before)
            || before.strip_suffix(".jsx").is_some_and(|stem| stem == after)
    }

    // Pairs landing as one modified entry (same public name).
    let mut modified_drop = Vec::new();
    for (mi, m) in modified.iter().enumerate() {
        let (Some(before_src), Some(after_src)) =
            (m.before.source_module.as_deref(), m.after.source_module.as_deref())
        else {
            continue;
        };
        if m.before.source_name == m.after.source_name && specifier_variant(before_src, after_src)
        {
            findings.push(specifier_finding(before_src, after_src, m.after.line));
            modified_drop.push(mi);
        }
    }
    retain_not_dropped_mod(modified, &modified_drop);

    // Pairs landing as a removed/added couple.
    let mut removed_drop = Vec::new();
    let mut added_drop = Vec::new();
    for (ri, r) in removed.iter().enumerate() {
        let Some(before_src) = r.source_module.as_deref() else {
            continue;
        };
        if let Some((ai, a)) = added.iter().enumerate().find(|(ai, a)| {
            !added_drop.contains(ai)
                && a.name == r.name
                && a.source_name == r.source_name
                && a.source_module
                    .as_deref()
                    .is_some_and(|after_src| specifier_variant(before_src, after_src))
        }) {
            findings.push(specifier_finding(
                before_src,
                a.source_module.as_deref().unwrap_or_default(),
                a.line,
            ));
            removed_drop.push(ri);
            added_drop.push(ai);
        }
    }
    retain_not_dropped(removed, &removed_drop);
    retain_not_dropped(added, &added_drop);

    // One finding per specifier pair.
    dedup_specifier_findings(findings);
}

fn specifier_finding(before_src: &str, after_src: &str, line: usize) -> BreakingChange {
    make_finding(
        "JSAPI-MOD-003",
        rules::base_severity("JSAPI-MOD-003"),
        before_src,
        format!(
            "Import specifier changed from '{}' to '{}'",
            before_src, after_src
        ),
        before_src.to_string(),
        after_src.to_string(),
        line,
        "modified",
        true,
        "re-export",
    )
}

fn dedup_specifier_findings(findings: &mut Vec<BreakingChange>) {
    let mut seen = std::collections::HashSet::new();
    findings.retain(|f| {
        f.rule_id != "JSAPI-MOD-003" || seen.insert((f.symbol.clone(), f.after.clone()))
    });
}

/// Both sides are CJS default exports whose value kind flipped: one
/// shape-changed finding instead of a remove/add pair.
fn apply_cjs_shape_changes(modified: &mut Vec<ExportModified>, findings: &mut Vec<BreakingChange>) {
    let mut drop = Vec::new();
    for (mi, m) in modified.iter().enumerate() {
        if m.before.name == "default"
            && m.before.kind.starts_with("cjs:")
            && m.after.kind.starts_with("cjs:")
            && m.before.kind != m.after.kind
        {
            findings.push(make_finding(
                "JSAPI-CJS-002",
                rules::base_severity("JSAPI-CJS-002"),
                "default",
                format!(
                    "Default export shape changed from {} to {}",
                    m.before.kind.trim_start_matches("cjs:"),
                    m.after.kind.trim_start_matches("cjs:")
                ),
                m.before.kind.clone(),
                m.after.kind.clone(),
                m.after.line,
                "modified",
                true,
                &m.after.kind,
            ));
            drop.push(mi);
        }
    }
    retain_not_dropped_mod(modified, &drop);
}

fn export_removed_finding(entry: &ExportInfo, ts: bool, was_barrel: bool) -> BreakingChange {
    let rule_id = if entry.kind.starts_with("cjs:") {
        "JSAPI-CJS-001"
    } else if !ts && entry.export_type == ExportType::Default {
        "JSAPI-EXP-003"
    } else if !ts && entry.export_type == ExportType::Namespace {
        "JSAPI-EXP-004"
    } else if !ts && was_barrel && entry.is_reexport() {
        "JSAPI-EXP-008"
    } else if ts {
        "TSAPI-EXP-001"
    } else {
        "JSAPI-EXP-001"
    };
    make_finding(
        rule_id,
        rules::base_severity(rule_id),
        &entry.name,
        format!("Export '{}' was removed", entry.name),
        entry.diff_signature(),
        String::new(),
        entry.line,
        "removed",
        true,
        &entry.kind,
    )
}

fn export_modified_finding(entry: &ExportModified, ts: bool) -> BreakingChange {
    let alias_changed = entry.before.is_reexport()
        && entry.after.is_reexport()
        && entry.before.source_module == entry.after.source_module
        && entry.before.source_name != entry.after.source_name;

    let (rule_id, message) = if alias_changed {
        let rule = if ts { "TSAPI-EXP-002" } else { "JSAPI-EXP-005" };
        (
            rule,
            format!(
                "Export '{}' now re-exports '{}' instead of '{}' from '{}'",
                entry.after.name,
                entry.after.source_name.as_deref().unwrap_or(""),
                entry.before.source_name.as_deref().unwrap_or(""),
                entry.after.source_module.as_deref().unwrap_or("")
            ),
        )
    } else {
        (
            "TSAPI-EXP-002",
            format!(
                "Export '{}' changed from '{}' to '{}'",
                entry.after.name,
                entry.before.diff_signature(),
                entry.after.diff_signature()
            ),
        )
    };

    make_finding(
        rule_id,
        rules::base_severity(rule_id),
        &entry.after.name,
        message,
        entry.before.diff_signature(),
        entry.after.diff_signature(),
        entry.after.line,
        "modified",
        true,
        &entry.after.kind,
    )
}

/// Convert a symbol delta into a finding. TypeScript-family rules downgrade
/// to `info` for non-exported symbols; additions already covered by an added
/// export are dropped.
fn symbol_finding(delta: &SymbolDelta, added_exports: &[ExportInfo]) -> Option<BreakingChange> {
    if delta.rule_id == "SYMBOL-ADDED" {
        if !delta.is_exported {
            return None;
        }
        if added_exports.iter().any(|e| {
            e.name == delta.symbol || e.local_name.as_deref() == Some(delta.symbol.as_str())
        }) {
            return None;
        }
    }

    let mut severity = rules::base_severity(&delta.rule_id);
    let js_rule = delta.rule_id.starts_with("JSAPI-");
    if !js_rule && !delta.is_exported {
        severity = Severity::Info;
    }

    Some(make_finding(
        &delta.rule_id,
        severity,
        &delta.symbol,
        delta.message.clone(),
        delta.before.clone(),
        delta.after.clone(),
        delta.line,
        match delta.change {
            crate::diff::ChangeKind::Added => "added",
            crate::diff::ChangeKind::Removed => "removed",
            crate::diff::ChangeKind::Modified => "modified",
        },
        delta.is_exported,
        delta.kind.as_str(),
    ))
}

#[allow(clippy::too_many_arguments)]
fn make_finding(
    rule_id: &str,
    severity: Severity,
    symbol: &str,
    message: String,
    before: String,
    after: String,
    line: usize,
    change_type: &str,
    is_exported: bool,
    kind: &str,
) -> BreakingChange {
    BreakingChange {
        rule_id: rule_id.to_string(),
        severity,
        symbol: symbol.to_string(),
        message,
        before,
        after,
        line,
        context: FindingContext {
            change_type: change_type.to_string(),
            is_exported,
            kind: kind.to_string(),
            is_heuristic: rules::is_heuristic(rule_id),
        },
    }
}

/// Keep the highest-priority finding per symbol group.
fn dedup_by_priority(findings: Vec<BreakingChange>) -> Vec<BreakingChange> {
    let mut best: Vec<BreakingChange> = Vec::new();
    for finding in findings {
        match best.iter_mut().find(|f| f.symbol == finding.symbol) {
            None => best.push(finding),
            Some(existing) => {
                if rules::priority(&finding.rule_id) < rules::priority(&existing.rule_id) {
                    *existing = finding;
                }
            }
        }
    }
    best
}

fn retain_not_dropped(entries: &mut Vec<ExportInfo>, drop: &[usize]) {
    let mut idx = 0;
    entries.retain(|_| {
        let keep = !drop.contains(&idx);
        idx += 1;
        keep
    });
}

fn retain_not_dropped_mod(entries: &mut Vec<ExportModified>, drop: &[usize]) {
    let mut idx = 0;
    entries.retain(|_| {
        let keep = !drop.contains(&idx);
        idx += 1;
        keep
    });
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Human-readable rendering of a report.
pub fn format_report_text(report: &ImpactReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("Impact report for: {}\n\n", report.file));

    if report.breaking_changes.is_empty() {
        output.push_str("[OK] No API changes detected.\n");
        return output;
    }

    for change in &report.breaking_changes {
        output.push_str(&format!(
            "  [{}] {} {}\n",
            change.severity.as_str(),
            change.rule_id,
            change.message
        ));
        if !change.before.is_empty() {
            output.push_str(&format!("      before: {}\n", change.before));
        }
        if !change.after.is_empty() {
            output.push_str(&format!("      after:  {}\n", change.after));
        }
    }

    output.push_str(&format!(
        "\nImpacted symbols ({}): {}\n",
        report.impacted_symbols.len(),
        report.impacted_symbols.join(", ")
    ));
    if !report.downstream_files.is_empty() {
        output.push_str(&format!(
            "Downstream files ({}):\n",
            report.downstream_files.len()
        ));
        for file in &report.downstream_files {
            output.push_str(&format!("  {}\n", file));
        }
    }
    if !report.affected_tests.is_empty() {
        output.push_str(&format!(
            "Affected tests ({}):\n",
            report.affected_tests.len()
        ));
        for test in &report.affected_tests {
            output.push_str(&format!("  {}\n", test));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ast_ts::build_snapshot_standalone;
    use crate::diff::diff_snapshots;

    fn report_for(path: &str, before: &str, after: &str) -> ImpactReport {
        let b = build_snapshot_standalone(path, before);
        let a = build_snapshot_standalone(path, after);
        let diff = diff_snapshots(&b, &a);
        format_report(path, &diff, &ImpactBundle::default(), Path::new("."))
    }

    #[test]
    fn method_removal_report_matches_contract() {
        let report = report_for(
            "src/client.ts",
            "export class Client { ping(): string { return 'ok'; } }\n",
            "export class Client {}\n",
        );
        let finding = report
            .breaking_changes
            .iter()
            .find(|f| f.rule_id == "TSAPI-CLS-001")
            .expect("CLS-001 expected");
        assert_eq!(finding.severity, Severity::Breaking);
        assert_eq!(finding.symbol, "Client.ping");
        assert_eq!(finding.message, "Method 'Client.ping' was removed from class");
        assert_eq!(
            report.impacted_symbols,
            vec!["Client".to_string(), "Client.ping".to_string()]
        );
    }

    #[test]
    fn every_finding_symbol_is_impacted() {
        let report = report_for(
            "src/mod.ts",
            r#"
            export function gone(a: number): void {}
            export interface Opts { timeout: number; }
            export enum Color { Red, Green }
            "#,
            r#"
            export interface Opts { timeout: string; }
            export enum Color { Red }
            "#,
        );
        for finding in &report.breaking_changes {
            assert!(
                report.impacted_symbols.contains(&finding.symbol),
                "symbol {} missing from impacted_symbols",
                finding.symbol
            );
        }
    }

    #[test]
    fn named_to_default_transition() {
        let report = report_for(
            "src/mod.js",
            "export function f() {}\n",
            "export default function f() {}\n",
        );
        let rules_fired: Vec<&str> = report
            .breaking_changes
            .iter()
            .map(|f| f.rule_id.as_str())
            .collect();
        assert!(rules_fired.contains(&"JSAPI-EXP-006"), "got {rules_fired:?}");
        assert!(!rules_fired.contains(&"JSAPI-EXP-001"));
        assert!(!rules_fired.contains(&"TSAPI-EXP-001"));
        let finding = report
            .breaking_changes
            .iter()
            .find(|f| f.rule_id == "JSAPI-EXP-006")
            .unwrap();
        assert_eq!(finding.symbol, "f");
        assert_eq!(finding.severity, Severity::Breaking);
    }

    #[test]
    fn import_specifier_change_is_single_info_finding() {
        let report = report_for(
            "src/index.ts",
            "export { foo } from \"./m\";\n",
            "export { foo } from \"./m.js\";\n",
        );
        assert_eq!(report.breaking_changes.len(), 1, "{:?}", report.breaking_changes);
        let finding = &report.breaking_changes[0];
        assert_eq!(finding.rule_id, "JSAPI-MOD-003");
        assert_eq!(finding.severity, Severity::Info);
        assert_eq!(finding.symbol, "./m");
    }

    #[test]
    fn reexport_source_swap_mentions_both_names() {
        let report = report_for(
            "src/index.ts",
            "export { a as x } from \"./m\";\n",
            "export { b as x } from \"./m\";\n",
        );
        let finding = report
            .breaking_changes
            .iter()
            .find(|f| f.rule_id == "TSAPI-EXP-002")
            .expect("EXP-002 expected");
        assert!(finding.message.contains("'a'"));
        assert!(finding.message.contains("'b'"));
    }

    #[test]
    fn heuristic_findings_carry_disclaimer() {
        let report = report_for(
            "src/mod.js",
            "export function f(a) {}\n",
            "export function f(a, b) {}\n",
        );
        let finding = report
            .breaking_changes
            .iter()
            .find(|f| f.rule_id == "JSAPI-FN-001")
            .expect("JS heuristic expected");
        assert!(finding.message.ends_with(rules::HEURISTIC_DISCLAIMER));
        assert!(finding.context.is_heuristic);
    }

    #[test]
    fn priority_dedup_keeps_most_specific() {
        // A removed default export in a JS file: the generic removal and the
        // default-specific rule target the same symbol; the table keeps the
        // default-specific one.
        let report = report_for(
            "src/mod.js",
            "export default function f() {}\nexport const keep = 1;\n",
            "export const keep = 1;\n",
        );
        let default_findings: Vec<&BreakingChange> = report
            .breaking_changes
            .iter()
            .filter(|f| f.symbol == "default" || f.symbol == "f")
            .collect();
        assert_eq!(default_findings.len(), 1, "{default_findings:?}");
        assert_eq!(default_findings[0].rule_id, "JSAPI-EXP-003");
    }

    #[test]
    fn empty_diff_formats_to_empty_report() {
        let report = report_for("src/mod.ts", "export const a = 1;\n", "export const a = 1;\n");
        assert!(report.breaking_changes.is_empty());
        assert!(report.impacted_symbols.is_empty());
    }
}
