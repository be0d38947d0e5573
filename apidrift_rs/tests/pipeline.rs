//! End-to-end pipeline scenarios: source text in, classified report out.

use std::fs;
use std::path::Path;

use apidrift::report::{ImpactBundle, format_report};
use apidrift::runner::{AnalyzerMode, AnalyzerOptions, build_api_snapshot, diff_sources};
use apidrift::types::Severity;

fn report_for(path: &str, before: &str, after: &str) -> apidrift::ImpactReport {
    let root = tempfile::tempdir().unwrap();
    let diff = diff_sources(root.path(), Path::new(path), before, after, None);
    format_report(path, &diff, &ImpactBundle::default(), root.path())
}

#[test]
fn method_removal() {
    let report = report_for(
        "src/client.ts",
        "export class Client { ping(): string { return 'ok'; } }\n",
        "export class Client {}\n",
    );

    let finding = report
        .breaking_changes
        .iter()
        .find(|f| f.rule_id == "TSAPI-CLS-001")
        .expect("TSAPI-CLS-001 expected");
    assert_eq!(finding.severity, Severity::Breaking);
    assert_eq!(finding.symbol, "Client.ping");
    assert_eq!(finding.message, "Method 'Client.ping' was removed from class");
    assert_eq!(report.impacted_symbols, vec!["Client", "Client.ping"]);
}

#[test]
fn optional_to_required_parameter() {
    let report = report_for(
        "src/greet.ts",
        "export function greet(who?: string): string { return ''; }\n",
        "export function greet(who: string): string { return ''; }\n",
    );

    assert_eq!(report.breaking_changes.len(), 1);
    let finding = &report.breaking_changes[0];
    assert_eq!(finding.rule_id, "TSAPI-FN-001");
    assert_eq!(finding.symbol, "greet");
    assert!(finding.before.contains("who?: string"));
    assert!(finding.after.contains("who: string"));
}

#[test]
fn reexport_source_swap() {
    let root = tempfile::tempdir().unwrap();
    let diff = diff_sources(
        root.path(),
        Path::new("src/index.ts"),
        "export { a as x } from \"./m\";\n",
        "export { b as x } from \"./m\";\n",
        None,
    );

    assert_eq!(diff.export_changes.modified.len(), 1);
    let modified = &diff.export_changes.modified[0];
    assert_eq!(modified.before.source_name.as_deref(), Some("a"));
    assert_eq!(modified.after.source_name.as_deref(), Some("b"));

    let report = format_report("src/index.ts", &diff, &ImpactBundle::default(), root.path());
    let finding = report
        .breaking_changes
        .iter()
        .find(|f| f.rule_id == "TSAPI-EXP-002")
        .expect("TSAPI-EXP-002 expected");
    assert!(finding.message.contains("'a'"));
    assert!(finding.message.contains("'b'"));
}

#[test]
fn import_specifier_change() {
    let report = report_for(
        "src/index.ts",
        "export { foo } from \"./m\";\n",
        "export { foo } from \"./m.js\";\n",
    );

    assert_eq!(report.breaking_changes.len(), 1);
    let finding = &report.breaking_changes[0];
    assert_eq!(finding.rule_id, "JSAPI-MOD-003");
    assert_eq!(finding.severity, Severity::Info);
    assert_eq!(finding.symbol, "./m");
    assert!(
        report
            .breaking_changes
            .iter()
            .all(|f| f.rule_id != "JSAPI-EXP-001" && f.rule_id != "EXPORT-ADDED")
    );
}

#[test]
fn named_to_default_export() {
    let report = report_for(
        "src/f.ts",
        "export function f() {}\n",
        "export default function f() {}\n",
    );

    let finding = report
        .breaking_changes
        .iter()
        .find(|f| f.rule_id == "JSAPI-EXP-006")
        .expect("JSAPI-EXP-006 expected");
    assert_eq!(finding.symbol, "f");
    assert_eq!(finding.severity, Severity::Breaking);
    assert!(
        report
            .breaking_changes
            .iter()
            .all(|f| f.rule_id != "EXPORT-REMOVED" && f.rule_id != "TSAPI-EXP-001"),
        "generic removal must be suppressed: {:?}",
        report.breaking_changes
    );
}

#[test]
fn interface_property_type_change() {
    let report = report_for(
        "src/opts.ts",
        "export interface Opts { timeout: number; }\n",
        "export interface Opts { timeout: string; }\n",
    );

    let finding = report
        .breaking_changes
        .iter()
        .find(|f| f.rule_id == "TSAPI-IF-003")
        .expect("TSAPI-IF-003 expected");
    assert_eq!(finding.symbol, "Opts");
    assert!(finding.message.contains("timeout"));
    assert!(finding.message.contains("number"));
    assert!(finding.message.contains("string"));
}

#[test]
fn barrel_file_statistics_and_self_diff() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("x.ts"),
        "export function fx(): void {}\nexport const cx = 1;\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("y.ts"),
        "export interface Ya { a: number }\nexport type Yb = string;\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("index.ts"),
        "export * from \"./x\";\nexport type * from \"./y\";\n",
    )
    .unwrap();

    let barrel_src = fs::read_to_string(dir.path().join("index.ts")).unwrap();
    let diff = diff_sources(
        dir.path(),
        Path::new("index.ts"),
        &barrel_src,
        &barrel_src,
        None,
    );
    assert!(diff.is_empty(), "barrel self-diff must be clean: {diff:?}");

    let report = format_report("index.ts", &diff, &ImpactBundle::default(), dir.path());
    assert!(
        report
            .breaking_changes
            .iter()
            .all(|f| !f.rule_id.starts_with("TSAPI-EXP")),
        "no export findings on identical barrels"
    );

    // Stats via the analyzer on the real file.
    let analyzer_report = apidrift::run_analyzer(&AnalyzerOptions {
        repo_root: dir.path().to_path_buf(),
        paths: vec!["index.ts".into()],
        ..Default::default()
    });
    let stats = analyzer_report.export_stats.unwrap();
    assert_eq!(stats.direct_exports, 0);
    assert_eq!(
        stats.re_exported_symbols + stats.type_only_exports,
        stats.exports_total
    );
    assert!(stats.exports_type >= stats.type_only_exports);
    assert_eq!(stats.reexport_groups_unresolved, 0);
}

#[test]
fn impact_bundle_is_merged_and_sorted() {
    let root = tempfile::tempdir().unwrap();
    let diff = diff_sources(
        root.path(),
        Path::new("src/a.ts"),
        "export const a: number = 1;\n",
        "export const a: string = \"\";\n",
        None,
    );
    let bundle = ImpactBundle {
        downstream_files: vec!["src/z.ts".to_string(), "src/b.ts".to_string()],
        affected_tests: vec!["tests/b.test.ts".to_string(), "tests/a.test.ts".to_string()],
    };
    let report = format_report("src/a.ts", &diff, &bundle, root.path());
    assert_eq!(report.downstream_files, vec!["src/b.ts", "src/z.ts"]);
    assert_eq!(
        report.affected_tests,
        vec!["tests/a.test.ts", "tests/b.test.ts"]
    );
    for finding in &report.breaking_changes {
        assert!(report.impacted_symbols.contains(&finding.symbol));
    }
}

#[test]
fn api_snapshot_mode_resolves_reexport_chains() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("core.ts"),
        "export function parse(input: string): number { return input.length; }\n",
    )
    .unwrap();
    fs::write(dir.path().join("mid.ts"), "export { parse } from \"./core\";\n").unwrap();
    fs::write(
        dir.path().join("index.ts"),
        "export { parse as parseInput } from \"./mid\";\n",
    )
    .unwrap();

    let snapshot = build_api_snapshot(&AnalyzerOptions {
        repo_root: dir.path().to_path_buf(),
        paths: vec!["index.ts".into()],
        mode: AnalyzerMode::ApiSnapshot,
        ..Default::default()
    })
    .unwrap();

    let shape = snapshot
        .exports
        .values()
        .find(|s| s.name() == "parseInput")
        .expect("aliased re-export should resolve to a shape");
    assert_eq!(shape.kind_str(), "function");
    // The identity anchors at the originating declaration file.
    let identity = snapshot
        .exports
        .keys()
        .find(|k| k.starts_with("parseInput|"))
        .unwrap();
    assert!(identity.contains("core.ts"), "identity was {identity}");
}

#[test]
fn js_flavor_uses_heuristic_rules_with_disclaimer() {
    let report = report_for(
        "src/legacy.js",
        "export function handler(req) {}\n",
        "export function handler(req, res) {}\n",
    );
    let finding = report
        .breaking_changes
        .iter()
        .find(|f| f.rule_id == "JSAPI-FN-001")
        .expect("JSAPI-FN-001 expected");
    assert_eq!(finding.severity, Severity::Warning);
    assert!(
        finding
            .message
            .ends_with("(JavaScript heuristic - may miss runtime changes)")
    );
}

#[test]
fn js_class_property_removal_is_heuristic_warning() {
    let report = report_for(
        "src/store.js",
        "export class Store { limit = 10; get(key) { return key; } }\n",
        "export class Store { get(key) { return key; } }\n",
    );
    let finding = report
        .breaking_changes
        .iter()
        .find(|f| f.rule_id == "JSAPI-CLS-002")
        .expect("JSAPI-CLS-002 expected");
    assert_eq!(finding.severity, Severity::Warning);
    assert_eq!(finding.symbol, "Store.limit");
    assert!(finding.context.is_heuristic);
    assert!(
        finding
            .message
            .ends_with("(JavaScript heuristic - may miss runtime changes)")
    );
    // The container class is impacted alongside the member.
    assert!(report.impacted_symbols.contains(&"Store".to_string()));
    assert!(report.impacted_symbols.contains(&"Store.limit".to_string()));
}

#[test]
fn cjs_default_shape_change() {
    let report = report_for(
        "src/legacy.js",
        "module.exports = function make() {};\n",
        "module.exports = { make: function () {} };\n",
    );
    let finding = report
        .breaking_changes
        .iter()
        .find(|f| f.rule_id == "JSAPI-CJS-002")
        .expect("JSAPI-CJS-002 expected");
    assert_eq!(finding.symbol, "default");
    assert!(finding.message.contains("function"));
    assert!(finding.message.contains("object"));
}
