//! CommonJS module-surface detection (JS flavor).
//!
//! `.js` files outside `allowJs`/`checkJs` projects get a module-surface
//! snapshot: `module.exports = ...` / `exports.x = ...` assignments become
//! export entries (kind-prefixed `cjs:`), `require()` bindings become
//! imports, and the file is tagged `cjs`/`esm`/`mixed`. The nearest
//! `package.json` up to the session root is summarized for package-level
//! diffing.

use std::fs;
use std::path::Path;

use oxc_ast::ast::*;

use crate::types::{ExportInfo, ExportType, ImportInfo, PackageSummary};

use super::ast_ts::FileContext;

/// CJS surface collected from expression statements.
#[derive(Debug, Default)]
pub(crate) struct CjsSurface {
    pub exports: Vec<ExportInfo>,
    pub imports: Vec<ImportInfo>,
    pub has_module_exports: bool,
    pub has_require: bool,
}

pub(crate) fn scan_statement(stmt: &Statement<'_>, ctx: &FileContext<'_>, out: &mut CjsSurface) {
    match stmt {
        Statement::ExpressionStatement(es) => scan_expression(&es.expression, ctx, out),
        Statement::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                let Some(init) = &declarator.init else {
                    continue;
                };
                let Some(module) = require_target(init) else {
                    continue;
                };
                out.has_require = true;
                let symbols = match &declarator.id.kind {
                    BindingPatternKind::BindingIdentifier(id) => vec![id.name.to_string()],
                    BindingPatternKind::ObjectPattern(obj) => obj
                        .properties
                        .iter()
                        .filter_map(|p| super::ast_ts::binding_property_name(p))
                        .collect(),
                    _ => Vec::new(),
                };
                out.imports.push(ImportInfo {
                    module,
                    is_default: symbols.len() == 1,
                    symbols,
                    is_namespace: false,
                });
            }
        }
        _ => {}
    }
}

fn scan_expression(expr: &Expression<'_>, ctx: &FileContext<'_>, out: &mut CjsSurface) {
    match expr {
        Expression::AssignmentExpression(assign) => scan_assignment(assign, ctx, out),
        Expression::CallExpression(_) => {
            if let Some(module) = require_target(expr) {
                out.has_require = true;
                out.imports.push(ImportInfo {
                    module,
                    ..Default::default()
                });
            }
        }
        _ => {}
    }
}

fn scan_assignment(assign: &AssignmentExpression<'_>, ctx: &FileContext<'_>, out: &mut CjsSurface) {
    let AssignmentTarget::StaticMemberExpression(member) = &assign.left else {
        return;
    };
    let line = ctx.line(assign.span);
    let prop = member.property.name.to_string();

    match &member.object {
        // module.exports = ...
        Expression::Identifier(obj) if obj.name == "module" && prop == "exports" => {
            out.has_module_exports = true;
            push_default(out, &assign.right, ctx, line);
            // An object literal also surfaces each property as a named export.
            if let Expression::ObjectExpression(obj_expr) = &assign.right {
                for prop in &obj_expr.properties {
                    if let ObjectPropertyKind::ObjectProperty(p) = prop {
                        if let Some(name) = object_key_name(&p.key, ctx) {
                            push_named(out, name, classify_value(&p.value), ctx.line(p.span));
                        }
                    }
                }
            }
        }
        // exports.foo = ...
        Expression::Identifier(obj) if obj.name == "exports" => {
            out.has_module_exports = true;
            push_named(out, prop, classify_value(&assign.right), line);
        }
        // module.exports.foo = ...
        Expression::StaticMemberExpression(inner) => {
            if let Expression::Identifier(obj) = &inner.object {
                if obj.name == "module" && inner.property.name == "exports" {
                    out.has_module_exports = true;
                    push_named(out, prop, classify_value(&assign.right), line);
                }
            }
        }
        _ => {}
    }
}

fn push_default(out: &mut CjsSurface, value: &Expression<'_>, _ctx: &FileContext<'_>, line: usize) {
    let kind = format!("cjs:{}", classify_value(value));
    let mut info = ExportInfo::new("default".to_string(), ExportType::Default, &kind, line);
    if let Expression::Identifier(id) = value {
        info.local_name = Some(id.name.to_string());
    }
    // Last assignment wins, like the runtime.
    out.exports.retain(|e| e.name != "default");
    out.exports.push(info);
}

fn push_named(out: &mut CjsSurface, name: String, value_kind: &str, line: usize) {
    let kind = format!("cjs:{}", value_kind);
    out.exports.retain(|e| e.name != name);
    out.exports
        .push(ExportInfo::new(name, ExportType::Named, &kind, line));
}

fn classify_value(value: &Expression<'_>) -> &'static str {
    match value {
        Expression::FunctionExpression(_) | Expression::ArrowFunctionExpression(_) => "function",
        Expression::ClassExpression(_) => "class",
        Expression::ObjectExpression(_) => "object",
        _ => "value",
    }
}

fn object_key_name(key: &PropertyKey<'_>, ctx: &FileContext<'_>) -> Option<String> {
    super::ast_ts::property_key_name(key, ctx)
}

/// `require("m")` or `require("m").member`.
fn require_target(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::CallExpression(call) => {
            let Expression::Identifier(callee) = &call.callee else {
                return None;
            };
            if callee.name != "require" {
                return None;
            }
            match call.arguments.first() {
                Some(Argument::StringLiteral(s)) => Some(s.value.to_string()),
                _ => None,
            }
        }
        Expression::StaticMemberExpression(member) => require_target(&member.object),
        _ => None,
    }
}

/// Summarize the nearest package.json between `file` and `root` (inclusive).
pub(crate) fn package_summary(file: &Path, root: &Path) -> Option<PackageSummary> {
    let mut dir = file.parent()?;
    loop {
        let manifest = dir.join("package.json");
        if manifest.is_file() {
            return parse_package(&manifest);
        }
        if dir == root {
            break;
        }
        dir = dir.parent()?;
        if !dir.starts_with(root) {
            break;
        }
    }
    None
}

fn parse_package(path: &Path) -> Option<PackageSummary> {
    let content = fs::read_to_string(path).ok()?;
    let parsed: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(err) => {
            crate::warn(&format!("invalid package.json {}: {}", path.display(), err));
            return None;
        }
    };
    let mut exports_keys: Vec<String> = parsed
        .get("exports")
        .and_then(|v| v.as_object())
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    exports_keys.sort();

    Some(PackageSummary {
        name: parsed
            .get("name")
            .and_then(|v| v.as_str())
            .map(String::from),
        module_type: parsed
            .get("type")
            .and_then(|v| v.as_str())
            .map(String::from),
        main: parsed
            .get("main")
            .and_then(|v| v.as_str())
            .map(String::from),
        exports_keys,
    })
}

#[cfg(test)]
mod tests {
    use crate::analyzer::ast_ts::build_snapshot_standalone;
    use crate::types::{ExportType, ModuleSystem};

    #[test]
    fn module_exports_object_literal() {
        let snap = build_snapshot_standalone(
            "src/legacy.js",
            r#"
            const helper = require("./helper");
            function greet(name) { return "hi " + name; }
            module.exports = { greet, VERSION: "1.0" };
            "#,
        );

        assert_eq!(snap.module_system, ModuleSystem::Cjs);
        let names: Vec<_> = snap.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"default"));
        assert!(names.contains(&"greet"));
        assert!(names.contains(&"VERSION"));

        let default = snap.exports.iter().find(|e| e.name == "default").unwrap();
        assert_eq!(default.kind, "cjs:object");
        assert_eq!(default.export_type, ExportType::Default);

        assert!(snap.imports.iter().any(|i| i.module == "./helper"));
    }

    #[test]
    fn exports_dot_assignments() {
        let snap = build_snapshot_standalone(
            "src/util.js",
            r#"
            exports.parse = function (input) { return input; };
            exports.MAX = 10;
            module.exports.stringify = (v) => String(v);
            "#,
        );

        let parse = snap.exports.iter().find(|e| e.name == "parse").unwrap();
        assert_eq!(parse.kind, "cjs:function");
        let max = snap.exports.iter().find(|e| e.name == "MAX").unwrap();
        assert_eq!(max.kind, "cjs:value");
        assert!(snap.exports.iter().any(|e| e.name == "stringify"));
    }

    #[test]
    fn esm_and_cjs_mixed() {
        let snap = build_snapshot_standalone(
            "src/mixed.js",
            r#"
            import { a } from "./a";
            module.exports = a;
            "#,
        );
        assert_eq!(snap.module_system, ModuleSystem::Mixed);
    }
}
