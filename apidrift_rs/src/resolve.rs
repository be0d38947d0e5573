//! Export resolution: from an export entry to its originating declaration.
//!
//! Direct exports already carry their declaration site from the snapshot
//! builder. Re-exports are chased through the session: the source module is
//! resolved and loaded, the source name looked up there, and alias chains
//! followed with a visited set. Value symbols win over same-named type
//! symbols unless the outer export is type-only.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::session::AnalysisSession;
use crate::shape::export_identity;
use crate::types::{ExportInfo, ExportType};

/// An export resolved to its originating declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedExport {
    /// Public name consumers import.
    pub name: String,
    /// Name of the declaration in the declaring file.
    pub target_name: String,
    /// Declaration kind ("function", "class", ...).
    pub kind: String,
    pub is_type_only: bool,
    pub decl_file_path: String,
    pub decl_pos: u32,
    pub decl_end: u32,
    pub symbol_handle: String,
}

impl ResolvedExport {
    pub fn identity(&self) -> String {
        export_identity(
            &self.name,
            self.is_type_only || self.kind == "interface" || self.kind == "type",
            &self.decl_file_path,
            self.decl_pos,
        )
    }

    pub fn public_name(&self) -> String {
        self.name.clone()
    }
}

/// Resolve every export of an entrypoint to its declaration site.
///
/// Unresolvable entries are dropped (the caller records them as failed
/// shapes); `export *` never contributes `default`, which the snapshot
/// builder already guarantees.
pub fn resolve_entrypoint_exports(
    session: &mut AnalysisSession,
    entrypoint: &Path,
    exports: &[ExportInfo],
) -> Vec<ResolvedExport> {
    let mut out = Vec::new();
    for export in exports {
        if let Some(resolved) = resolve_export(session, entrypoint, export) {
            out.push(resolved);
        }
    }
    out
}

fn resolve_export(
    session: &mut AnalysisSession,
    entrypoint: &Path,
    export: &ExportInfo,
) -> Option<ResolvedExport> {
    if !export.is_reexport() {
        let decl_file = export.decl_file_path.clone()?;
        let target_name = export
            .local_name
            .clone()
            .unwrap_or_else(|| export.name.clone());
        return Some(ResolvedExport {
            name: export.name.clone(),
            target_name,
            kind: export.kind.clone(),
            is_type_only: export.is_type_only,
            decl_pos: export.decl_pos.unwrap_or(0),
            decl_end: export.decl_end.unwrap_or(0),
            symbol_handle: export
                .symbol_handle
                .clone()
                .unwrap_or_else(|| format!("{}#0:{}:value", decl_file, export.name)),
            decl_file_path: decl_file,
        });
    }

    // Namespace re-exports have no single originating declaration; anchor
    // them at the target module itself.
    let source = export.source_module.as_deref()?;
    let target = session.resolve(source, entrypoint)?;
    if export.export_type == ExportType::Namespace {
        let decl_file = path_string(&target);
        return Some(ResolvedExport {
            name: export.name.clone(),
            target_name: export.name.clone(),
            kind: "re-export".to_string(),
            is_type_only: export.is_type_only,
            decl_pos: 0,
            decl_end: 0,
            symbol_handle: format!("{}#0:{}:value", decl_file, export.name),
            decl_file_path: decl_file,
        });
    }

    let source_name = export
        .source_name
        .clone()
        .unwrap_or_else(|| export.name.clone());
    let mut visited = HashSet::new();
    let terminal = chase(session, &target, &source_name, export.is_type_only, &mut visited)?;

    Some(ResolvedExport {
        name: export.name.clone(),
        target_name: terminal.target_name,
        kind: terminal.kind,
        is_type_only: export.is_type_only || terminal.is_type_only,
        decl_file_path: terminal.decl_file_path,
        decl_pos: terminal.decl_pos,
        decl_end: terminal.decl_end,
        symbol_handle: terminal.symbol_handle,
    })
}

struct Terminal {
    target_name: String,
    kind: String,
    is_type_only: bool,
    decl_file_path: String,
    decl_pos: u32,
    decl_end: u32,
    symbol_handle: String,
}

/// Follow alias chains (`export { a as b } from`) to the declaring file.
fn chase(
    session: &mut AnalysisSession,
    module: &PathBuf,
    name: &str,
    prefer_type: bool,
    visited: &mut HashSet<(PathBuf, String)>,
) -> Option<Terminal> {
    if !visited.insert((module.clone(), name.to_string())) {
        return None;
    }
    let record = session.load_module(module)?;

    // A name can surface both as a value and a type; pick per preference.
    let candidates: Vec<ExportInfo> = record
        .snapshot
        .exports
        .iter()
        .filter(|e| e.name == name)
        .cloned()
        .collect();
    let entry = pick_candidate(&candidates, prefer_type)?;

    if entry.is_reexport() {
        let source = entry.source_module.as_deref()?;
        let next = session.resolve(source, module)?;
        let next_name = entry.source_name.clone().unwrap_or_else(|| name.to_string());
        let mut terminal = chase(session, &next, &next_name, prefer_type, visited)?;
        terminal.is_type_only = terminal.is_type_only || entry.is_type_only;
        return Some(terminal);
    }

    let decl_file = entry
        .decl_file_path
        .clone()
        .unwrap_or_else(|| path_string(module));
    Some(Terminal {
        target_name: entry
            .local_name
            .clone()
            .unwrap_or_else(|| entry.name.clone()),
        kind: entry.kind.clone(),
        is_type_only: entry.is_type_only,
        decl_pos: entry.decl_pos.unwrap_or(0),
        decl_end: entry.decl_end.unwrap_or(0),
        symbol_handle: entry
            .symbol_handle
            .clone()
            .unwrap_or_else(|| format!("{}#0:{}:value", decl_file, entry.name)),
        decl_file_path: decl_file,
    })
}

/// Prefer value symbols (function/class/enum/variable) over same-named type
/// symbols, unless the outer export is type-only.
fn pick_candidate(candidates: &[ExportInfo], prefer_type: bool) -> Option<ExportInfo> {
    if candidates.is_empty() {
        return None;
    }
    let value = candidates.iter().find(|e| e.is_runtime());
    let typed = candidates.iter().find(|e| !e.is_runtime());
    let picked = if prefer_type {
        typed.or(value)
    } else {
        value.or(typed)
    };
    picked.cloned()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::tsconfig::TsconfigSummary;
    use crate::session::AnalysisSession;
    use std::fs;

    fn session_with(files: &[(&str, &str)]) -> (tempfile::TempDir, AnalysisSession) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let session = AnalysisSession::new(dir.path(), TsconfigSummary::default());
        (dir, session)
    }

    #[test]
    fn direct_export_resolves_to_local_declaration() {
        let (dir, mut session) = session_with(&[("a.ts", "export function f(): void {}\n")]);
        let entry = dir.path().join("a.ts");
        let exports = session.load_module(&entry).unwrap().snapshot.exports.clone();

        let resolved = resolve_entrypoint_exports(&mut session, &entry, &exports);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].kind, "function");
        assert!(resolved[0].decl_file_path.ends_with("a.ts"));
    }

    #[test]
    fn named_reexport_chases_to_origin() {
        let (dir, mut session) = session_with(&[
            ("origin.ts", "export const value: number = 1;\n"),
            ("index.ts", "export { value as renamed } from \"./origin\";\n"),
        ]);
        let entry = dir.path().join("index.ts");
        let exports = session.load_module(&entry).unwrap().snapshot.exports.clone();

        let resolved = resolve_entrypoint_exports(&mut session, &entry, &exports);
        let renamed = resolved.iter().find(|r| r.name == "renamed").unwrap();
        assert_eq!(renamed.target_name, "value");
        assert!(renamed.decl_file_path.ends_with("origin.ts"));
        assert_eq!(renamed.kind, "variable");
    }

    #[test]
    fn star_reexport_omits_default() {
        let (dir, mut session) = session_with(&[
            (
                "lib.ts",
                "export default function main(): void {}\nexport const named = 1;\n",
            ),
            ("index.ts", "export * from \"./lib\";\n"),
        ]);
        let entry = dir.path().join("index.ts");
        let exports = session.load_module(&entry).unwrap().snapshot.exports.clone();

        assert!(exports.iter().all(|e| e.name != "default"));
        let resolved = resolve_entrypoint_exports(&mut session, &entry, &exports);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "named");
    }

    #[test]
    fn value_preferred_over_same_named_type() {
        let (dir, mut session) = session_with(&[
            (
                "dual.ts",
                "export interface Config { a: number }\nexport const Config = { a: 1 };\n",
            ),
            ("index.ts", "export { Config } from \"./dual\";\n"),
        ]);
        let entry = dir.path().join("index.ts");
        let exports = session.load_module(&entry).unwrap().snapshot.exports.clone();

        let resolved = resolve_entrypoint_exports(&mut session, &entry, &exports);
        let config = resolved.iter().find(|r| r.name == "Config").unwrap();
        assert_eq!(config.kind, "variable");
    }

    #[test]
    fn alias_cycle_terminates() {
        let (dir, mut session) = session_with(&[
            ("a.ts", "export { x } from \"./b\";\n"),
            ("b.ts", "export { x } from \"./a\";\n"),
        ]);
        let entry = dir.path().join("a.ts");
        let exports = session.load_module(&entry).unwrap().snapshot.exports.clone();

        // Unresolvable chain: dropped rather than looping.
        let resolved = resolve_entrypoint_exports(&mut session, &entry, &exports);
        assert!(resolved.is_empty());
    }
}
