//! Entrypoint orchestrator: the public analyzer API.
//!
//! Drives resolver -> builder -> export resolver -> shape extractor ->
//! diff -> formatter over a repository root and a set of entrypoint files.
//! All outputs are deterministic: sorted collections, repo-relative
//! forward-slash paths, no timestamps or random identifiers in report
//! bodies. Errors are absorbed per file; the returned report is always
//! valid, possibly empty.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::analyzer::ast_ts;
use crate::analyzer::tsconfig::{TsconfigSummary, load_tsconfig_summary};
use crate::diff::{SnapshotDiff, diff_snapshots};
use crate::report::{
    BreakingChange, FindingContext, ImpactBundle, ImpactReport, format_report, relative_path,
};
use crate::resolve::resolve_entrypoint_exports;
use crate::rules;
use crate::session::AnalysisSession;
use crate::shape::{AnalysisMode, ApiSnapshot, build_api_shape};
use crate::types::{ExportStats, SymbolSnapshot};
use crate::{fs_utils, warn};

/// Analyzer flavor selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnalyzerMode {
    /// Export-surface inventory plus self-consistency checks.
    #[default]
    ExportsOnly,
    /// Additionally resolve exports and build API shapes.
    ApiSnapshot,
}

/// Inputs for one analyzer run.
#[derive(Clone, Debug, Default)]
pub struct AnalyzerOptions {
    pub repo_root: PathBuf,
    /// Entrypoint files; empty means "scan the root recursively".
    pub paths: Vec<PathBuf>,
    pub tsconfig: Option<PathBuf>,
    pub mode: AnalyzerMode,
}

/// Aggregate result of an analyzer run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalyzerReport {
    pub findings: Vec<BreakingChange>,
    pub rule_ids: Vec<String>,
    pub symbol_names: Vec<String>,
    pub severities: Vec<String>,
    pub file_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_stats: Option<ExportStats>,
}

/// Sorted export-name deltas used by the regression harness.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportsDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

fn entry_paths(options: &AnalyzerOptions) -> Vec<PathBuf> {
    if options.paths.is_empty() {
        return fs_utils::gather_source_files(&options.repo_root);
    }
    options
        .paths
        .iter()
        .map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                options.repo_root.join(p)
            }
        })
        .collect()
}

fn open_session(options: &AnalyzerOptions) -> Option<AnalysisSession> {
    if !options.repo_root.is_dir() {
        warn(&format!(
            "repo root is not a directory: {}",
            options.repo_root.display()
        ));
        return None;
    }
    let tsconfig = load_tsconfig_summary(&options.repo_root, options.tsconfig.as_deref());
    Some(AnalysisSession::new(&options.repo_root, tsconfig))
}

/// Analyze the current surface of a set of entrypoints.
///
/// In `ExportsOnly` mode this inventories exports and verifies the pipeline
/// is self-consistent (a snapshot diffed against itself is empty); in
/// `ApiSnapshot` mode the export resolver and shape extractor run too.
/// Deterministic: sorted outputs, no timestamps.
pub fn run_analyzer(options: &AnalyzerOptions) -> AnalyzerReport {
    let mut report = AnalyzerReport::default();
    let Some(mut session) = open_session(options) else {
        return report;
    };
    let root = session.root().to_path_buf();

    let mut stats = ExportStats::default();
    let mut have_stats = false;

    for path in entry_paths(options) {
        let Some(record) = session.load_module(&path) else {
            continue;
        };
        let snapshot = record.snapshot.clone();
        report
            .file_paths
            .push(relative_path(&snapshot.file_path, &root));

        let self_diff = diff_snapshots(&snapshot, &snapshot);
        if !self_diff.is_empty() {
            warn(&format!(
                "self-diff of {} is not empty; analysis may be unstable",
                snapshot.file_path
            ));
            let file_report =
                format_report(&snapshot.file_path, &self_diff, &ImpactBundle::default(), &root);
            report.findings.extend(file_report.breaking_changes);
        }
        report.findings.extend(invariant_findings(&snapshot));

        for export in &snapshot.exports {
            if !report.symbol_names.contains(&export.name) {
                report.symbol_names.push(export.name.clone());
            }
        }
        if let Some(file_stats) = &snapshot.export_stats {
            have_stats = true;
            stats.direct_exports += file_stats.direct_exports;
            stats.re_exported_symbols += file_stats.re_exported_symbols;
            stats.type_only_exports += file_stats.type_only_exports;
            stats.exports_total += file_stats.exports_total;
            stats.exports_runtime += file_stats.exports_runtime;
            stats.exports_type += file_stats.exports_type;
            stats.exports_unique += file_stats.exports_unique;
            stats.exports_with_declarations += file_stats.exports_with_declarations;
            stats.reexport_groups_unresolved += file_stats.reexport_groups_unresolved;
        }

        if options.mode == AnalyzerMode::ApiSnapshot {
            let exports = snapshot.exports.clone();
            for resolved in resolve_entrypoint_exports(&mut session, &path, &exports) {
                build_api_shape(&mut session, &resolved);
            }
        }
    }

    report.file_paths.sort();
    report.symbol_names.sort();
    report.rule_ids = report
        .findings
        .iter()
        .map(|f| f.rule_id.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    report.severities = report
        .findings
        .iter()
        .map(|f| f.severity.as_str().to_string())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    report.export_stats = have_stats.then_some(stats);
    report
}

/// Logic-invariant checks over a built snapshot.
///
/// Violations warn with context and keep going, but they also surface as
/// `info`-severity findings so analyzer reports carry them. One duplicate
/// export identity key is tolerated; beyond that every colliding entry is
/// reported. The statistics block must agree with the export list it was
/// computed from.
fn invariant_findings(snapshot: &SymbolSnapshot) -> Vec<BreakingChange> {
    let mut out = Vec::new();

    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut colliding = Vec::new();
    for export in &snapshot.exports {
        if !seen.insert(export.strong_key()) {
            colliding.push(export);
        }
    }
    if colliding.len() > 1 {
        for export in colliding {
            warn(&format!(
                "{}: duplicate export identity key for '{}'",
                snapshot.file_path, export.name
            ));
            out.push(invariant_finding(
                &export.name,
                format!(
                    "Export '{}' appears more than once with the same identity key",
                    export.name
                ),
                &export.kind,
                export.line,
            ));
        }
    }

    if let Some(stats) = &snapshot.export_stats {
        if stats.exports_total != snapshot.exports.len() {
            warn(&format!(
                "{}: export statistics disagree with the export list ({} counted, {} present)",
                snapshot.file_path,
                stats.exports_total,
                snapshot.exports.len()
            ));
            out.push(invariant_finding(
                "exports",
                format!(
                    "Export statistics disagree with the export list ({} counted, {} present)",
                    stats.exports_total,
                    snapshot.exports.len()
                ),
                "exports",
                1,
            ));
        }
    }

    out
}

fn invariant_finding(symbol: &str, message: String, kind: &str, line: usize) -> BreakingChange {
    BreakingChange {
        rule_id: "ANALYZER-INVARIANT".to_string(),
        severity: rules::base_severity("ANALYZER-INVARIANT"),
        symbol: symbol.to_string(),
        message,
        before: String::new(),
        after: String::new(),
        line,
        context: FindingContext {
            change_type: "invariant".to_string(),
            is_exported: true,
            kind: kind.to_string(),
            is_heuristic: false,
        },
    }
}

fn analysis_mode(path: &Path, tsconfig: &TsconfigSummary) -> AnalysisMode {
    if ast_ts::is_js_file(path) {
        if tsconfig.js_is_type_aware() {
            AnalysisMode::TypedJs
        } else {
            AnalysisMode::ModuleSurface
        }
    } else {
        AnalysisMode::TypeScript
    }
}

/// Resolve and shape every export reachable from the given entrypoints.
///
/// Returns `None` for invalid configuration (bad root, no usable
/// entrypoints).
pub fn build_api_snapshot(options: &AnalyzerOptions) -> Option<ApiSnapshot> {
    let mut session = open_session(options)?;
    let paths = entry_paths(options);
    let first = paths.first()?;

    let mut snapshot = ApiSnapshot {
        entrypoint_path: relative_path(&first.to_string_lossy().replace('\\', "/"), &options.repo_root),
        exports: std::collections::BTreeMap::new(),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
        partial: false,
        failed_shapes: Vec::new(),
        analysis_mode: analysis_mode(first, session.tsconfig()),
    };

    let mut loaded_any = false;
    for path in &paths {
        let Some(record) = session.load_module(path) else {
            snapshot.partial = true;
            continue;
        };
        loaded_any = true;
        let exports = record.snapshot.exports.clone();
        for resolved in resolve_entrypoint_exports(&mut session, path, &exports) {
            if resolved.is_type_only {
                continue;
            }
            match build_api_shape(&mut session, &resolved) {
                Some(shape) => {
                    snapshot.exports.insert(resolved.identity(), shape);
                }
                None => {
                    snapshot.partial = true;
                    snapshot.failed_shapes.push(resolved.name.clone());
                }
            }
        }
    }
    if !loaded_any {
        return None;
    }
    snapshot.failed_shapes.sort();
    snapshot.failed_shapes.dedup();
    Some(snapshot)
}

/// Diff two versions of one file supplied as source text.
///
/// Each side gets its own session (peer files resolve from disk), so the
/// same path can be analyzed at two different contents.
pub fn diff_sources(
    repo_root: &Path,
    file_path: &Path,
    before_source: &str,
    after_source: &str,
    tsconfig: Option<&Path>,
) -> SnapshotDiff {
    let summary = load_tsconfig_summary(repo_root, tsconfig);
    let mut before_session = AnalysisSession::new(repo_root, summary.clone());
    let mut after_session = AnalysisSession::new(repo_root, summary);
    let abs = if file_path.is_absolute() {
        file_path.to_path_buf()
    } else {
        repo_root.join(file_path)
    };
    let before = before_session
        .add_or_replace_module(&abs, before_source)
        .snapshot
        .clone();
    let after = after_session
        .add_or_replace_module(&abs, after_source)
        .snapshot
        .clone();
    diff_snapshots(&before, &after)
}

/// Diff two files on disk as before/after versions of the same module and
/// format the impact report.
pub fn diff_files(
    repo_root: &Path,
    before_path: &Path,
    after_path: &Path,
    bundle: &ImpactBundle,
    tsconfig: Option<&Path>,
) -> Option<ImpactReport> {
    let before_source = match std::fs::read_to_string(before_path) {
        Ok(s) => s,
        Err(err) => {
            warn(&format!("cannot read {}: {}", before_path.display(), err));
            return None;
        }
    };
    let after_source = match std::fs::read_to_string(after_path) {
        Ok(s) => s,
        Err(err) => {
            warn(&format!("cannot read {}: {}", after_path.display(), err));
            return None;
        }
    };
    let diff = diff_sources(repo_root, after_path, &before_source, &after_source, tsconfig);
    Some(format_report(
        &after_path.to_string_lossy().replace('\\', "/"),
        &diff,
        bundle,
        repo_root,
    ))
}

/// Sorted export-name deltas between two snapshots (regression harness).
pub fn compute_exports_diff(before: &SymbolSnapshot, after: &SymbolSnapshot) -> ExportsDelta {
    let diff = diff_snapshots(before, after);
    let mut delta = ExportsDelta::default();
    for entry in &diff.export_changes.added {
        delta.added.push(entry.name.clone());
    }
    for entry in &diff.export_changes.removed {
        delta.removed.push(entry.name.clone());
    }
    for entry in &diff.export_changes.modified {
        delta.changed.push(entry.after.name.clone());
    }
    delta.added.sort();
    delta.added.dedup();
    delta.removed.sort();
    delta.removed.dedup();
    delta.changed.sort();
    delta.changed.dedup();
    delta
}

/// Serialize a report with stable key order and write it atomically.
pub fn write_report_json(report: &ImpactReport, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix("apidrift_tmp")
        .tempfile_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn run_analyzer_on_clean_tree_has_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/a.ts"),
            "export function f(a: number): void {}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("src/index.ts"),
            "export * from \"./a\";\n",
        )
        .unwrap();

        let report = run_analyzer(&AnalyzerOptions {
            repo_root: dir.path().to_path_buf(),
            ..Default::default()
        });
        assert!(report.findings.is_empty());
        assert_eq!(
            report.file_paths,
            vec!["src/a.ts".to_string(), "src/index.ts".to_string()]
        );
        assert!(report.symbol_names.contains(&"f".to_string()));
        let stats = report.export_stats.unwrap();
        assert_eq!(stats.reexport_groups_unresolved, 0);
    }

    #[test]
    fn run_analyzer_with_bad_root_is_empty() {
        let report = run_analyzer(&AnalyzerOptions {
            repo_root: PathBuf::from("/definitely/not/a/dir"),
            ..Default::default()
        });
        assert!(report.findings.is_empty());
        assert!(report.file_paths.is_empty());
    }

    #[test]
    fn duplicate_identity_keys_surface_as_info_findings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ts"),
            "export const one = 1;\nexport const two = 2;\n",
        )
        .unwrap();
        // The same star twice: every expanded name collides on its
        // identity key, which exceeds the one tolerated collision.
        fs::write(
            dir.path().join("index.ts"),
            "export * from \"./a\";\nexport * from \"./a\";\n",
        )
        .unwrap();

        let report = run_analyzer(&AnalyzerOptions {
            repo_root: dir.path().to_path_buf(),
            paths: vec![PathBuf::from("index.ts")],
            ..Default::default()
        });

        assert!(!report.findings.is_empty());
        assert!(
            report
                .findings
                .iter()
                .all(|f| f.rule_id == "ANALYZER-INVARIANT")
        );
        let symbols: Vec<&str> = report.findings.iter().map(|f| f.symbol.as_str()).collect();
        assert!(symbols.contains(&"one"));
        assert!(symbols.contains(&"two"));
        assert_eq!(report.rule_ids, vec!["ANALYZER-INVARIANT".to_string()]);
        assert_eq!(report.severities, vec!["info".to_string()]);
    }

    #[test]
    fn single_identity_collision_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "export const one = 1;\n").unwrap();
        fs::write(
            dir.path().join("index.ts"),
            "export * from \"./a\";\nexport * from \"./a\";\n",
        )
        .unwrap();

        let report = run_analyzer(&AnalyzerOptions {
            repo_root: dir.path().to_path_buf(),
            paths: vec![PathBuf::from("index.ts")],
            ..Default::default()
        });
        assert!(report.findings.is_empty(), "{:?}", report.findings);
    }

    #[test]
    fn api_snapshot_shapes_resolved_exports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("lib.ts"),
            "export function util(a: string): number { return a.length; }\nexport type Hidden = string;\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("index.ts"),
            "export * from \"./lib\";\nexport const version: string = \"1.0\";\n",
        )
        .unwrap();

        let snapshot = build_api_snapshot(&AnalyzerOptions {
            repo_root: dir.path().to_path_buf(),
            paths: vec![PathBuf::from("index.ts")],
            mode: AnalyzerMode::ApiSnapshot,
            ..Default::default()
        })
        .unwrap();

        let names: Vec<&str> = snapshot
            .exports
            .values()
            .map(|shape| shape.name())
            .collect();
        assert!(names.contains(&"util"));
        assert!(names.contains(&"version"));
        assert_eq!(snapshot.analysis_mode, AnalysisMode::TypeScript);
    }

    #[test]
    fn exports_diff_is_sorted() {
        let before = crate::analyzer::ast_ts::build_snapshot_standalone(
            "src/mod.ts",
            "export const b = 1;\nexport const a = 1;\n",
        );
        let after = crate::analyzer::ast_ts::build_snapshot_standalone(
            "src/mod.ts",
            "export const c = 1;\n",
        );
        let delta = compute_exports_diff(&before, &after);
        assert_eq!(delta.removed, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(delta.added, vec!["c".to_string()]);
    }

    #[test]
    fn deterministic_report_serialization() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("before.ts"), "export const a: number = 1;\n").unwrap();
        fs::write(dir.path().join("after.ts"), "export const a: string = \"\";\n").unwrap();

        let run = || {
            let report = diff_files(
                dir.path(),
                &dir.path().join("before.ts"),
                &dir.path().join("after.ts"),
                &ImpactBundle::default(),
                None,
            )
            .unwrap();
            serde_json::to_string_pretty(&report).unwrap()
        };
        assert_eq!(run(), run());
    }
}
