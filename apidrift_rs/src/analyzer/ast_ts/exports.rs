//! Export enumeration: the three-pass algorithm.
//!
//! Pass 1 discovers re-export statements and expands `export * from` through
//! the session (recursive, cycle-safe). Pass 2 emits direct exports for
//! local declarations, suppressing names already contributed by a re-export
//! statement. Pass 3 replays the re-export statements in source order. The
//! result never double-counts a name that appears both as a local
//! declaration and as a re-export target.

use std::collections::HashSet;

use oxc_ast::ast::*;

use crate::session::{AnalysisSession, ModuleExport};
use crate::types::{ExportInfo, ExportStats, ExportType, SymbolKind, SymbolSnapshot};

use super::FileContext;

enum ReexportStmt {
    Named {
        source: String,
        /// (source_name, exported_name, specifier_is_type_only)
        pairs: Vec<(String, String, bool)>,
        type_only: bool,
        line: usize,
    },
    Star {
        source: String,
        /// Expanded names from the resolved target; `None` when unresolved.
        resolved: Option<Vec<ModuleExport>>,
        /// `export * as ns from "m"` binds a single namespace name.
        namespace: Option<String>,
        type_only: bool,
        line: usize,
    },
}

/// A pending direct export recorded from `export { a as b }` / `export default`.
struct LocalSpecExport {
    local: String,
    exported: String,
    type_only: bool,
    line: usize,
}

pub(super) fn collect_exports(
    program: &Program<'_>,
    ctx: &FileContext<'_>,
    session: &mut AnalysisSession,
    snapshot: &mut SymbolSnapshot,
) -> usize {
    let mut stmts: Vec<ReexportStmt> = Vec::new();
    let mut reexported_names: HashSet<String> = HashSet::new();
    let mut local_specs: Vec<LocalSpecExport> = Vec::new();
    let mut default_export: Option<ExportInfo> = None;
    let mut unresolved = 0usize;

    // Pass 1: discover re-export statements and their contributed names.
    for stmt in &program.body {
        match stmt {
            Statement::ExportNamedDeclaration(decl) => {
                let stmt_type_only = matches!(decl.export_kind, ImportOrExportKind::Type);
                let line = ctx.line(decl.span);
                if let Some(src) = &decl.source {
                    let source = src.value.to_string();
                    let mut pairs = Vec::new();
                    for spec in &decl.specifiers {
                        let local = module_export_name(&spec.local);
                        let exported = module_export_name(&spec.exported);
                        let spec_type_only = matches!(spec.export_kind, ImportOrExportKind::Type);
                        reexported_names.insert(exported.clone());
                        pairs.push((local, exported, spec_type_only));
                    }
                    stmts.push(ReexportStmt::Named {
                        source,
                        pairs,
                        type_only: stmt_type_only,
                        line,
                    });
                } else {
                    for spec in &decl.specifiers {
                        let local = module_export_name(&spec.local);
                        let exported = module_export_name(&spec.exported);
                        let spec_type_only = matches!(spec.export_kind, ImportOrExportKind::Type);
                        local_specs.push(LocalSpecExport {
                            local,
                            exported,
                            type_only: stmt_type_only || spec_type_only,
                            line,
                        });
                    }
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                let type_only = matches!(decl.export_kind, ImportOrExportKind::Type);
                let line = ctx.line(decl.span);
                let source = decl.source.value.to_string();
                if let Some(exported) = &decl.exported {
                    let namespace = module_export_name(exported);
                    reexported_names.insert(namespace.clone());
                    stmts.push(ReexportStmt::Star {
                        source,
                        resolved: None,
                        namespace: Some(namespace),
                        type_only,
                        line,
                    });
                } else {
                    let resolved = match session.resolve(&source, ctx.path) {
                        Some(target) => session.exports_of_module(&target),
                        None => None,
                    };
                    match &resolved {
                        Some(names) => {
                            for export in names {
                                if export.name != "default" {
                                    reexported_names.insert(export.name.clone());
                                }
                            }
                        }
                        None => unresolved += 1,
                    }
                    stmts.push(ReexportStmt::Star {
                        source,
                        resolved,
                        namespace: None,
                        type_only,
                        line,
                    });
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                default_export = Some(default_export_info(decl, ctx));
            }
            Statement::TSExportAssignment(decl) => {
                // `export = x` surfaces like a default export.
                let mut info =
                    ExportInfo::new("default".to_string(), ExportType::Default, "variable", ctx.line(decl.span));
                if let Expression::Identifier(id) = &decl.expression {
                    info.local_name = Some(id.name.to_string());
                }
                default_export = Some(info);
            }
            _ => {}
        }
    }

    // Pass 2: direct exports for local declarations. A name may surface on
    // both the value and the type side (declaration merging); dedup keys
    // carry the side so both entries survive.
    let mut emitted: HashSet<(String, bool)> = HashSet::new();
    let mut direct: Vec<ExportInfo> = Vec::new();
    let file_path = ctx.path.to_string_lossy().replace('\\', "/");

    let symbols: Vec<(String, SymbolKind, usize, u32, u32)> = snapshot
        .all_symbols()
        .filter(|s| s.is_exported)
        .map(|s| (s.name.clone(), s.kind, s.line, s.pos, s.end))
        .collect();
    for (name, kind, line, pos, end) in symbols {
        let type_side = matches!(kind, SymbolKind::Interface | SymbolKind::Type);
        if reexported_names.contains(&name) || !emitted.insert((name.clone(), type_side)) {
            continue;
        }
        let mut info = ExportInfo::new(name.clone(), ExportType::Named, kind.as_str(), line);
        attach_decl(&mut info, &file_path, pos, end, kind);
        direct.push(info);
    }

    for spec in &local_specs {
        mark_exported(snapshot, &spec.local);
        let target = find_symbol(snapshot, &spec.local);
        let type_side = spec.type_only
            || matches!(
                target.map(|(kind, ..)| kind),
                Some(SymbolKind::Interface | SymbolKind::Type)
            );
        if reexported_names.contains(&spec.exported)
            || !emitted.insert((spec.exported.clone(), type_side))
        {
            continue;
        }
        let export_type = if spec.exported == "default" {
            ExportType::Default
        } else {
            ExportType::Named
        };
        let kind_str = target.map(|(kind, ..)| kind.as_str()).unwrap_or("named");
        let mut info = ExportInfo::new(spec.exported.clone(), export_type, kind_str, spec.line);
        info.is_type_only = spec.type_only;
        if spec.local != spec.exported {
            info.local_name = Some(spec.local.clone());
        }
        if let Some((kind, pos, end)) = target {
            attach_decl(&mut info, &file_path, pos, end, kind);
        }
        direct.push(info);
    }

    if let Some(mut info) = default_export {
        if let Some(local) = info.local_name.clone() {
            mark_exported(snapshot, &local);
            if let Some((kind, pos, end)) = find_symbol(snapshot, &local) {
                info.kind = kind.as_str().to_string();
                attach_decl(&mut info, &file_path, pos, end, kind);
            }
        }
        if !reexported_names.contains("default")
            && emitted.insert(("default".to_string(), false))
        {
            direct.push(info);
        }
    }

    snapshot.exports.extend(direct);

    // Pass 3: replay re-export statements in source order.
    for stmt in &stmts {
        match stmt {
            ReexportStmt::Named {
                source,
                pairs,
                type_only,
                line,
            } => {
                for (source_name, exported, spec_type_only) in pairs {
                    let export_type = if exported == "default" {
                        ExportType::Default
                    } else {
                        ExportType::Named
                    };
                    let mut info =
                        ExportInfo::new(exported.clone(), export_type, "re-export", *line);
                    info.source_module = Some(source.clone());
                    info.source_name = Some(source_name.clone());
                    info.is_type_only = *type_only || *spec_type_only;
                    snapshot.exports.push(info);
                }
            }
            ReexportStmt::Star {
                source,
                resolved,
                namespace,
                type_only,
                line,
            } => {
                if let Some(namespace) = namespace {
                    let mut info = ExportInfo::new(
                        namespace.clone(),
                        ExportType::Namespace,
                        "re-export",
                        *line,
                    );
                    info.source_module = Some(source.clone());
                    info.source_name = Some("*".to_string());
                    info.is_type_only = *type_only;
                    snapshot.exports.push(info);
                    continue;
                }
                let Some(names) = resolved else {
                    continue;
                };
                for export in dedup_value_over_type(names, *type_only) {
                    if export.name == "default" {
                        continue;
                    }
                    let mut info =
                        ExportInfo::new(export.name.clone(), ExportType::Named, "re-export", *line);
                    info.source_module = Some(source.clone());
                    info.source_name = Some(export.name.clone());
                    info.is_type_only = *type_only || export.is_type_only;
                    snapshot.exports.push(info);
                }
            }
        }
    }

    unresolved
}

/// When the target surfaces a value and a same-named type symbol, star
/// expansion keeps only the value, unless the outer re-export is type-only.
fn dedup_value_over_type(names: &[ModuleExport], outer_type_only: bool) -> Vec<ModuleExport> {
    fn type_side(e: &ModuleExport) -> bool {
        e.is_type_only || e.kind == "interface" || e.kind == "type"
    }

    let mut out: Vec<ModuleExport> = Vec::new();
    for export in names {
        match out.iter_mut().find(|e| e.name == export.name) {
            None => out.push(export.clone()),
            Some(existing) => {
                let want_type = outer_type_only;
                if type_side(existing) != want_type && type_side(export) == want_type {
                    *existing = export.clone();
                }
            }
        }
    }
    out
}

fn default_export_info(decl: &ExportDefaultDeclaration<'_>, ctx: &FileContext<'_>) -> ExportInfo {
    let line = ctx.line(decl.span);
    let (kind, local_name) = match &decl.declaration {
        ExportDefaultDeclarationKind::FunctionDeclaration(f) => (
            "function",
            f.id.as_ref().map(|id| id.name.to_string()),
        ),
        ExportDefaultDeclarationKind::ClassDeclaration(c) => (
            "class",
            c.id.as_ref().map(|id| id.name.to_string()),
        ),
        ExportDefaultDeclarationKind::TSInterfaceDeclaration(i) => {
            ("interface", Some(i.id.name.to_string()))
        }
        ExportDefaultDeclarationKind::Identifier(id) => ("named", Some(id.name.to_string())),
        _ => ("variable", None),
    };
    let mut info = ExportInfo::new("default".to_string(), ExportType::Default, kind, line);
    info.local_name = local_name;
    info
}

fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(s) => s.value.to_string(),
    }
}

fn mark_exported(snapshot: &mut SymbolSnapshot, name: &str) {
    for list in [
        &mut snapshot.functions,
        &mut snapshot.classes,
        &mut snapshot.interfaces,
        &mut snapshot.types,
        &mut snapshot.enums,
        &mut snapshot.variables,
    ] {
        for sym in list.iter_mut() {
            if sym.name == name {
                sym.is_exported = true;
            }
        }
    }
}

/// Value declarations win over same-named type declarations.
fn find_symbol(snapshot: &SymbolSnapshot, name: &str) -> Option<(SymbolKind, u32, u32)> {
    let mut fallback = None;
    for sym in snapshot.all_symbols().filter(|s| s.name == name) {
        if matches!(sym.kind, SymbolKind::Interface | SymbolKind::Type) {
            fallback.get_or_insert((sym.kind, sym.pos, sym.end));
        } else {
            return Some((sym.kind, sym.pos, sym.end));
        }
    }
    fallback
}

fn attach_decl(info: &mut ExportInfo, file_path: &str, pos: u32, end: u32, kind: SymbolKind) {
    info.decl_file_path = Some(file_path.to_string());
    info.decl_pos = Some(pos);
    info.decl_end = Some(end);
    let flavor = match kind {
        SymbolKind::Interface | SymbolKind::Type => "type",
        _ => "value",
    };
    info.symbol_handle = Some(format!("{}#{}:{}:{}", file_path, pos, info.name, flavor));
}

/// Compute the diagnostic statistics block and run the barrel self-checks.
pub(super) fn compute_stats(snapshot: &SymbolSnapshot, unresolved: usize) -> ExportStats {
    let exports = &snapshot.exports;
    let mut strong_keys = HashSet::new();
    let mut stats = ExportStats {
        exports_total: exports.len(),
        reexport_groups_unresolved: unresolved,
        ..Default::default()
    };
    for export in exports {
        strong_keys.insert(export.strong_key());
        if export.is_reexport() {
            if !export.is_type_only {
                stats.re_exported_symbols += 1;
            }
        } else {
            stats.direct_exports += 1;
        }
        if export.is_type_only {
            stats.type_only_exports += 1;
        }
        if export.is_runtime() {
            stats.exports_runtime += 1;
        } else {
            stats.exports_type += 1;
        }
        if export.decl_file_path.is_some() {
            stats.exports_with_declarations += 1;
        }
    }
    stats.exports_unique = strong_keys.len();

    if snapshot.is_barrel() {
        if stats.exports_total.saturating_sub(stats.exports_unique) > 1 {
            crate::warn(&format!(
                "{}: barrel export keys collide ({} total, {} unique)",
                snapshot.file_path, stats.exports_total, stats.exports_unique
            ));
        }
        if stats.exports_type < stats.type_only_exports {
            crate::warn(&format!(
                "{}: barrel type export accounting mismatch ({} type, {} type-only)",
                snapshot.file_path, stats.exports_type, stats.type_only_exports
            ));
        }
    }

    stats
}
