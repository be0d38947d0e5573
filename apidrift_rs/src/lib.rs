//! # apidrift
//!
//! **Semantic API-surface diff for TypeScript/JavaScript.**
//!
//! apidrift snapshots the public API surface of a source tree (exports,
//! signatures, class members, interface shapes, enum members), diffs two
//! versions of that surface, and classifies every difference against a
//! closed catalog of breaking-change rules (`TSAPI-*`, `JSAPI-*`,
//! `ENUM_*`). The result is a deterministic, machine-readable impact
//! report: which rules fired, which symbols are affected, what the change
//! looked like before and after.
//!
//! ## Pipeline
//!
//! files -> snapshot builder -> [`types::SymbolSnapshot`] pair ->
//! diff engine -> [`diff::SnapshotDiff`] -> formatter ->
//! [`report::ImpactReport`]
//!
//! API-snapshot mode additionally resolves every export to its originating
//! declaration and builds normalized [`shape::ApiShape`]s, which diff
//! separately via [`api_diff`].
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,no_run
//! use apidrift::runner::{AnalyzerOptions, run_analyzer};
//! use std::path::PathBuf;
//!
//! let report = run_analyzer(&AnalyzerOptions {
//!     repo_root: PathBuf::from("."),
//!     ..Default::default()
//! });
//! println!("{} files analyzed", report.file_paths.len());
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! apidrift snapshot src/index.ts     # inventory the current surface
//! apidrift diff old.ts new.ts        # classified breaking changes
//! apidrift diff old.ts new.ts --json # machine-readable report
//! ```

/// Per-file analysis: OXC-based snapshot builder, module resolver,
/// tsconfig summary, CJS surface scan.
pub mod analyzer;

/// ApiSnapshot comparison (library-level diffing with rename detection).
pub mod api_diff;

/// Snapshot diff engine: classified symbol- and export-level deltas.
pub mod diff;

/// Source gathering with ignore-directory pruning.
pub mod fs_utils;

/// Report formatter: findings, suppression pipeline, impact report.
pub mod report;

/// Export resolution across re-export chains.
pub mod resolve;

/// The closed breaking-change rule catalog.
pub mod rules;

/// Entrypoint orchestrator: the public analyzer API.
pub mod runner;

/// Mutable project state: module registry and caches.
pub mod session;

/// API shapes and the shape extractor.
pub mod shape;

/// Core data model.
pub mod types;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use api_diff::{ApiDiff, api_diff_to_findings, compute_api_diff};
pub use diff::{SnapshotDiff, diff_snapshots};
pub use report::{BreakingChange, ImpactBundle, ImpactReport, format_report, format_report_text};
pub use runner::{
    AnalyzerMode, AnalyzerOptions, AnalyzerReport, build_api_snapshot, compute_exports_diff,
    diff_files, diff_sources, run_analyzer,
};
pub use session::AnalysisSession;
pub use shape::{ApiShape, ApiSnapshot};
pub use types::{Severity, SymbolSnapshot};

/// Warning to stderr; always on.
pub(crate) fn warn(msg: &str) {
    eprintln!("[apidrift][warn] {}", msg);
}

/// Debug chatter to stderr; gated by `APIDRIFT_VERBOSE`.
pub(crate) fn debug(msg: &str) {
    if std::env::var("APIDRIFT_VERBOSE").is_ok() {
        eprintln!("[apidrift][debug] {}", msg);
    }
}
