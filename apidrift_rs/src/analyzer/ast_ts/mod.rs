//! TypeScript/JavaScript snapshot builder.
//!
//! This is the entry point for per-file analysis. It:
//! 1. Parses the source with the OXC parser (TypeScript grammar, JSX for
//!    `.tsx`/`.jsx`)
//! 2. Enumerates top-level symbols in source order
//! 3. Runs the three-pass export algorithm (re-export discovery, direct
//!    exports, re-export replay with star expansion through the session)
//! 4. Tags the module system and, for JS files, merges the CommonJS surface
//!    and the nearest package.json summary
//! 5. Computes the diagnostic export statistics
//!
//! Parse errors never abort: whatever symbols were recovered still yield a
//! (possibly partial) snapshot.

mod exports;
mod imports;
pub(crate) mod symbols;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::analyzer::cjs::{self, CjsSurface};
use crate::analyzer::type_text::{
    normalize_type_string, offset_to_column, offset_to_line, span_text,
};
use crate::session::AnalysisSession;
use crate::types::{ModuleSystem, SymbolSnapshot};

pub(crate) use symbols::property_key_name;

/// Per-file context shared by the collection passes.
pub(crate) struct FileContext<'a> {
    pub path: &'a Path,
    pub source: &'a str,
}

impl FileContext<'_> {
    pub fn line(&self, span: Span) -> usize {
        offset_to_line(self.source, span.start as usize)
    }

    pub fn column(&self, span: Span) -> usize {
        offset_to_column(self.source, span.start as usize)
    }

    pub fn text(&self, span: Span) -> &str {
        span_text(self.source, span.start, span.end)
    }

    pub fn norm(&self, span: Span) -> String {
        normalize_type_string(self.text(span))
    }
}

/// Name of a destructured `require()` binding property.
pub(crate) fn binding_property_name(prop: &BindingProperty<'_>) -> Option<String> {
    match &prop.value.kind {
        BindingPatternKind::BindingIdentifier(id) => Some(id.name.to_string()),
        _ => None,
    }
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// True for files analyzed by the JS flavor (CJS surface scan applies).
pub(crate) fn is_js_file(path: &Path) -> bool {
    matches!(file_extension(path).as_str(), "js" | "jsx" | "mjs" | "cjs")
}

/// Build a [`SymbolSnapshot`] for one file.
///
/// The session supplies module resolution and recursive export expansion for
/// `export * from` statements; peer files discovered that way are parsed
/// into the session as a side effect.
pub fn build_snapshot(
    path: &Path,
    content: &str,
    session: &mut AnalysisSession,
) -> SymbolSnapshot {
    let allocator = Allocator::default();

    // Only enable JSX for .tsx/.jsx to avoid conflicts with TS generics.
    let ext = file_extension(path);
    let is_jsx_file = ext == "tsx" || ext == "jsx";
    let source_type = SourceType::from_path(path)
        .unwrap_or_default()
        .with_typescript(true)
        .with_jsx(is_jsx_file);

    let ret = Parser::new(&allocator, content, source_type).parse();
    if !ret.errors.is_empty() {
        crate::debug(&format!(
            "parser errors in {}: {} errors",
            path.display(),
            ret.errors.len()
        ));
        for (i, err) in ret.errors.iter().take(5).enumerate() {
            crate::debug(&format!("  [{}] {}", i + 1, err));
        }
    }

    let ctx = FileContext {
        path,
        source: content,
    };
    let mut snapshot = SymbolSnapshot::new(path.to_string_lossy().replace('\\', "/"));
    snapshot.timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut cjs_surface = CjsSurface::default();
    let mut has_esm = false;
    let scan_cjs = is_js_file(path);

    for stmt in &ret.program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                has_esm = true;
                imports::collect_import(decl, &mut snapshot);
            }
            Statement::ExportNamedDeclaration(decl) => {
                has_esm = true;
                if let Some(declaration) = &decl.declaration {
                    symbols::collect_declaration(declaration, true, &ctx, &mut snapshot);
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                has_esm = true;
                match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                        let fallback = f.id.is_none().then_some("default");
                        if let Some(sym) = symbols::function_symbol(f, fallback, true, &ctx) {
                            snapshot.functions.push(sym);
                        }
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                        let fallback = c.id.is_none().then_some("default");
                        if let Some(sym) = symbols::class_symbol(c, fallback, true, &ctx) {
                            snapshot.classes.push(sym);
                        }
                    }
                    ExportDefaultDeclarationKind::TSInterfaceDeclaration(i) => {
                        snapshot.interfaces.push(symbols::interface_symbol(i, true, &ctx));
                    }
                    _ => {}
                }
            }
            Statement::ExportAllDeclaration(_) | Statement::TSExportAssignment(_) => {
                has_esm = true;
            }
            Statement::FunctionDeclaration(f) => {
                if let Some(sym) = symbols::function_symbol(f, None, false, &ctx) {
                    snapshot.functions.push(sym);
                }
            }
            Statement::ClassDeclaration(c) => {
                if let Some(sym) = symbols::class_symbol(c, None, false, &ctx) {
                    snapshot.classes.push(sym);
                }
            }
            Statement::TSInterfaceDeclaration(i) => {
                snapshot.interfaces.push(symbols::interface_symbol(i, false, &ctx));
            }
            Statement::TSTypeAliasDeclaration(t) => {
                snapshot.types.push(symbols::type_alias_symbol(t, false, &ctx));
            }
            Statement::TSEnumDeclaration(e) => {
                snapshot.enums.push(symbols::enum_symbol(e, false, &ctx));
            }
            Statement::VariableDeclaration(var) => {
                symbols::collect_variable_declaration(var, false, &ctx, &mut snapshot);
                if scan_cjs {
                    cjs::scan_statement(stmt, &ctx, &mut cjs_surface);
                }
            }
            Statement::ExpressionStatement(_) => {
                if scan_cjs {
                    cjs::scan_statement(stmt, &ctx, &mut cjs_surface);
                }
            }
            _ => {}
        }
    }

    symbols::fold_overloads(&mut snapshot.functions);

    let unresolved = exports::collect_exports(&ret.program, &ctx, session, &mut snapshot);

    // Merge the CommonJS surface; ESM entries win on name clashes.
    if scan_cjs {
        for export in cjs_surface.exports {
            if !snapshot.exports.iter().any(|e| e.name == export.name) {
                snapshot.exports.push(export);
            }
        }
        for import in cjs_surface.imports {
            snapshot.imports.push(import);
        }
        snapshot.package = cjs::package_summary(path, session.root());
    }

    snapshot.module_system = match (
        has_esm,
        cjs_surface.has_module_exports || cjs_surface.has_require,
    ) {
        (true, true) => ModuleSystem::Mixed,
        (true, false) => ModuleSystem::Esm,
        (false, true) => ModuleSystem::Cjs,
        (false, false) => ModuleSystem::Unknown,
    };

    snapshot.export_stats = Some(exports::compute_stats(&snapshot, unresolved));
    snapshot
}

/// Build a snapshot from in-memory content with a throwaway session.
///
/// Star re-exports that point at real files still resolve (relative to the
/// given path); everything else degrades gracefully. Intended for tests and
/// one-off inspection.
pub fn build_snapshot_standalone(path: &str, content: &str) -> SymbolSnapshot {
    let mut session = AnalysisSession::new(
        Path::new("."),
        crate::analyzer::tsconfig::TsconfigSummary::default(),
    );
    build_snapshot(Path::new(path), content, &mut session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExportType, SymbolDetail, SymbolKind};

    #[test]
    fn basic_symbols_and_exports() {
        let snap = build_snapshot_standalone(
            "src/test.ts",
            r#"
            import { Foo } from "./bar";

            export const myVar = 1;
            export function myFunc(a: number): void {}
            export default class MyClass {}
            export interface Opts { timeout: number; }
            export type Mode = "a" | "b";
            export enum Color { Red, Green }
            const hidden = 2;
            "#,
        );

        assert_eq!(snap.imports.len(), 1);

        let names: Vec<_> = snap.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"myVar"));
        assert!(names.contains(&"myFunc"));
        assert!(names.contains(&"default"));
        assert!(names.contains(&"Opts"));
        assert!(names.contains(&"Mode"));
        assert!(names.contains(&"Color"));
        assert!(!names.contains(&"hidden"));

        let default = snap.exports.iter().find(|e| e.name == "default").unwrap();
        assert_eq!(default.export_type, ExportType::Default);
        assert_eq!(default.local_name.as_deref(), Some("MyClass"));

        let func = snap.functions.iter().find(|f| f.name == "myFunc").unwrap();
        assert_eq!(func.signature, "myFunc(a: number): void");
        assert!(func.is_exported);

        assert!(snap.variables.iter().any(|v| v.name == "hidden" && !v.is_exported));
    }

    #[test]
    fn arrow_initializers_count_as_functions() {
        let snap = build_snapshot_standalone(
            "src/test.ts",
            "export const handler = async (req: Request): Promise<void> => {};\n",
        );
        let f = &snap.functions[0];
        assert_eq!(f.kind, SymbolKind::Function);
        match &f.detail {
            SymbolDetail::Function { is_arrow, is_async, .. } => {
                assert!(*is_arrow);
                assert!(*is_async);
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn overloads_fold_into_one_symbol() {
        let snap = build_snapshot_standalone(
            "src/test.ts",
            r#"
            export function pick(value: string): string;
            export function pick(value: number): number;
            export function pick(value: unknown): unknown { return value; }
            "#,
        );
        assert_eq!(snap.functions.len(), 1);
        let overloads = snap.functions[0].overloads.as_ref().unwrap();
        assert_eq!(overloads.len(), 3);
        assert_eq!(overloads.last().unwrap(), "(value: unknown): unknown");
    }

    #[test]
    fn local_specifier_exports_mark_symbols() {
        let snap = build_snapshot_standalone(
            "src/test.ts",
            r#"
            function helper(): void {}
            const value = 1;
            export { helper, value as exported };
            "#,
        );
        assert!(snap.functions[0].is_exported);
        let entry = snap.exports.iter().find(|e| e.name == "exported").unwrap();
        assert_eq!(entry.local_name.as_deref(), Some("value"));
        assert_eq!(entry.kind, "variable");
    }

    #[test]
    fn whitespace_perturbation_keeps_surface_identical() {
        let original = "export function greet(who?: string): string { return \"\"; }\nexport interface Opts { timeout: number; }\nexport const n = 1;\n";
        let perturbed = "export function greet( who?:  string ):string { return \"\"; }\n\nexport interface Opts {\n    timeout:   number;\n}\nexport const n = 1;\n";

        let a = build_snapshot_standalone("src/a.ts", original);
        let b = build_snapshot_standalone("src/a.ts", perturbed);

        let sigs = |s: &crate::types::SymbolSnapshot| {
            s.all_symbols().map(|x| x.signature.clone()).collect::<Vec<_>>()
        };
        assert_eq!(sigs(&a), sigs(&b));
        let exports = |s: &crate::types::SymbolSnapshot| {
            s.exports.iter().map(|e| e.diff_signature()).collect::<Vec<_>>()
        };
        assert_eq!(exports(&a), exports(&b));
    }

    #[test]
    fn class_members_are_captured() {
        let snap = build_snapshot_standalone(
            "src/client.ts",
            r#"
            export class Client {
                private secret: string = "";
                protected retries = 3;
                readonly endpoint: string;
                constructor(endpoint: string) { this.endpoint = endpoint; }
                ping(): string { return "ok"; }
                static create(): Client { return new Client(""); }
                get status(): number { return 200; }
            }
            "#,
        );
        let class = &snap.classes[0];
        let SymbolDetail::Class { members, .. } = &class.detail else {
            panic!("expected class detail");
        };
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"ping"));
        assert!(names.contains(&"secret"));
        let secret = members.iter().find(|m| m.name == "secret").unwrap();
        assert_eq!(secret.visibility, "private");
        let create = members.iter().find(|m| m.name == "create").unwrap();
        assert!(create.is_static);
        let status = members.iter().find(|m| m.name == "status").unwrap();
        assert_eq!(status.kind, "get");
    }
}
