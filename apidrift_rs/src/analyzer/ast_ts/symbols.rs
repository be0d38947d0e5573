//! Top-level symbol enumeration.
//!
//! Walks declarations (plain or behind `export`) and captures per-kind
//! detail: parameters with optionality/rest markers, class member sets with
//! visibility, interface/type property bags with index signatures, enum
//! members with literal values. Every extraction is fallible in isolation;
//! a declaration that cannot be captured is simply absent from the snapshot.

use oxc_ast::ast::*;
use oxc_span::GetSpan;

use crate::types::{
    ClassMemberInfo, EnumMemberInfo, IndexSignatureInfo, ParameterInfo, SymbolDetail, SymbolInfo,
    SymbolKind, TypeParamInfo, TypePropertyInfo,
};

use super::FileContext;

/// Collect a `Declaration` (the payload of an `export` statement or a plain
/// statement) into the snapshot lists.
pub(super) fn collect_declaration(
    decl: &Declaration<'_>,
    exported: bool,
    ctx: &FileContext<'_>,
    out: &mut crate::types::SymbolSnapshot,
) {
    match decl {
        Declaration::FunctionDeclaration(f) => {
            if let Some(sym) = function_symbol(f, None, exported, ctx) {
                out.functions.push(sym);
            }
        }
        Declaration::ClassDeclaration(c) => {
            if let Some(sym) = class_symbol(c, None, exported, ctx) {
                out.classes.push(sym);
            }
        }
        Declaration::TSInterfaceDeclaration(i) => {
            out.interfaces.push(interface_symbol(i, exported, ctx));
        }
        Declaration::TSTypeAliasDeclaration(t) => {
            out.types.push(type_alias_symbol(t, exported, ctx));
        }
        Declaration::TSEnumDeclaration(e) => {
            out.enums.push(enum_symbol(e, exported, ctx));
        }
        Declaration::VariableDeclaration(var) => {
            collect_variable_declaration(var, exported, ctx, out);
        }
        _ => {}
    }
}

/// Variable declarations split per declarator; lambda initializers count as
/// functions, everything else as variables.
pub(super) fn collect_variable_declaration(
    var: &VariableDeclaration<'_>,
    exported: bool,
    ctx: &FileContext<'_>,
    out: &mut crate::types::SymbolSnapshot,
) {
    let is_const = matches!(var.kind, VariableDeclarationKind::Const);
    for declarator in &var.declarations {
        let name = match &declarator.id.kind {
            BindingPatternKind::BindingIdentifier(id) => id.name.to_string(),
            // Destructured top-level bindings have no single API name.
            _ => continue,
        };
        match &declarator.init {
            Some(Expression::ArrowFunctionExpression(arrow)) => {
                if let Some(sym) = arrow_symbol(arrow, &name, exported, ctx, declarator.span) {
                    out.functions.push(sym);
                }
            }
            Some(Expression::FunctionExpression(func)) => {
                if let Some(sym) = function_symbol(func, Some(name.as_str()), exported, ctx) {
                    out.functions.push(sym);
                }
            }
            init => {
                out.variables.push(variable_symbol(
                    &name, declarator, init.as_ref(), is_const, exported, ctx,
                ));
            }
        }
    }
}

pub(super) fn function_symbol(
    f: &Function<'_>,
    name_override: Option<&str>,
    exported: bool,
    ctx: &FileContext<'_>,
) -> Option<SymbolInfo> {
    let name = match name_override {
        Some(n) => n.to_string(),
        None => f.id.as_ref()?.name.to_string(),
    };
    let parameters = parameters_of(&f.params, ctx);
    let return_type = f
        .return_type
        .as_ref()
        .map(|r| ctx.norm(r.type_annotation.span()));
    let type_params = type_params_of(f.type_parameters.as_deref(), ctx);
    let signature = function_signature(&name, &parameters, return_type.as_deref());

    Some(SymbolInfo {
        qualified_name: name.clone(),
        name,
        line: ctx.line(f.span),
        column: ctx.column(f.span),
        signature,
        kind: SymbolKind::Function,
        is_exported: exported,
        pos: f.span.start,
        end: f.span.end,
        parameters: Some(parameters),
        return_type,
        overloads: None,
        detail: SymbolDetail::Function {
            is_async: f.r#async,
            is_arrow: false,
            type_params,
            overload_signatures: Vec::new(),
        },
    })
}

pub(super) fn arrow_symbol(
    arrow: &ArrowFunctionExpression<'_>,
    name: &str,
    exported: bool,
    ctx: &FileContext<'_>,
    decl_span: oxc_span::Span,
) -> Option<SymbolInfo> {
    let parameters = parameters_of(&arrow.params, ctx);
    let return_type = arrow
        .return_type
        .as_ref()
        .map(|r| ctx.norm(r.type_annotation.span()));
    let type_params = type_params_of(arrow.type_parameters.as_deref(), ctx);
    let signature = function_signature(name, &parameters, return_type.as_deref());

    Some(SymbolInfo {
        name: name.to_string(),
        qualified_name: name.to_string(),
        line: ctx.line(decl_span),
        column: ctx.column(decl_span),
        signature,
        kind: SymbolKind::Function,
        is_exported: exported,
        pos: decl_span.start,
        end: decl_span.end,
        parameters: Some(parameters),
        return_type,
        overloads: None,
        detail: SymbolDetail::Function {
            is_async: arrow.r#async,
            is_arrow: true,
            type_params,
            overload_signatures: Vec::new(),
        },
    })
}

pub(super) fn class_symbol(
    c: &Class<'_>,
    name_override: Option<&str>,
    exported: bool,
    ctx: &FileContext<'_>,
) -> Option<SymbolInfo> {
    let name = match name_override {
        Some(n) => n.to_string(),
        None => c.id.as_ref()?.name.to_string(),
    };
    let extends = c.super_class.as_ref().map(|e| ctx.norm(e.span()));
    let implements: Vec<String> = c.implements.iter().map(|i| ctx.norm(i.span)).collect();
    let type_params = type_params_of(c.type_parameters.as_deref(), ctx);

    let mut members = Vec::new();
    for element in &c.body.body {
        match element {
            ClassElement::MethodDefinition(m) => {
                if let Some(member) = method_member(m, ctx) {
                    members.push(member);
                }
            }
            ClassElement::PropertyDefinition(p) => {
                if let Some(member) = property_member(p, ctx) {
                    members.push(member);
                }
            }
            _ => {}
        }
    }

    let signature = match &extends {
        Some(sup) => format!("class {} extends {}", name, sup),
        None => format!("class {}", name),
    };

    Some(SymbolInfo {
        qualified_name: name.clone(),
        name,
        line: ctx.line(c.span),
        column: ctx.column(c.span),
        signature,
        kind: SymbolKind::Class,
        is_exported: exported,
        pos: c.span.start,
        end: c.span.end,
        parameters: None,
        return_type: None,
        overloads: None,
        detail: SymbolDetail::Class {
            extends,
            implements,
            type_params,
            members,
        },
    })
}

fn method_member(m: &MethodDefinition<'_>, ctx: &FileContext<'_>) -> Option<ClassMemberInfo> {
    let name = property_key_name(&m.key, ctx)?;
    let kind = match m.kind {
        MethodDefinitionKind::Constructor => "constructor",
        MethodDefinitionKind::Method => "method",
        MethodDefinitionKind::Get => "get",
        MethodDefinitionKind::Set => "set",
    };
    let parameters = parameters_of(&m.value.params, ctx);
    let return_type = m
        .value
        .return_type
        .as_ref()
        .map(|r| ctx.norm(r.type_annotation.span()));
    let signature = call_signature(&parameters, return_type.as_deref());

    Some(ClassMemberInfo {
        visibility: accessibility_str(m.accessibility, &name),
        name,
        kind: kind.to_string(),
        is_static: m.r#static,
        optional: m.optional,
        readonly: false,
        signature,
        parameters: Some(parameters),
        return_type,
    })
}

fn property_member(p: &PropertyDefinition<'_>, ctx: &FileContext<'_>) -> Option<ClassMemberInfo> {
    let name = property_key_name(&p.key, ctx)?;
    let type_text = p
        .type_annotation
        .as_ref()
        .map(|t| ctx.norm(t.type_annotation.span()))
        .unwrap_or_default();

    Some(ClassMemberInfo {
        visibility: accessibility_str(p.accessibility, &name),
        name,
        kind: "property".to_string(),
        is_static: p.r#static,
        optional: p.optional,
        readonly: p.readonly,
        signature: type_text,
        parameters: None,
        return_type: None,
    })
}

fn accessibility_str(accessibility: Option<TSAccessibility>, name: &str) -> String {
    match accessibility {
        Some(TSAccessibility::Private) => "private".to_string(),
        Some(TSAccessibility::Protected) => "protected".to_string(),
        _ if name.starts_with('#') => "private".to_string(),
        _ => "public".to_string(),
    }
}

pub(super) fn interface_symbol(
    i: &TSInterfaceDeclaration<'_>,
    exported: bool,
    ctx: &FileContext<'_>,
) -> SymbolInfo {
    let name = i.id.name.to_string();
    let extends: Vec<String> = i.extends.iter().map(|h| ctx.norm(h.span)).collect();
    let type_params = type_params_of(i.type_parameters.as_deref(), ctx);
    let (properties, index_signatures) = members_of_signatures(&i.body.body, ctx);

    let signature = format!("interface {} {}", name, property_bag_text(&properties));

    SymbolInfo {
        qualified_name: name.clone(),
        name,
        line: ctx.line(i.span),
        column: ctx.column(i.span),
        signature,
        kind: SymbolKind::Interface,
        is_exported: exported,
        pos: i.span.start,
        end: i.span.end,
        parameters: None,
        return_type: None,
        overloads: None,
        detail: SymbolDetail::Interface {
            extends,
            type_params,
            properties,
            index_signatures,
        },
    }
}

pub(super) fn type_alias_symbol(
    t: &TSTypeAliasDeclaration<'_>,
    exported: bool,
    ctx: &FileContext<'_>,
) -> SymbolInfo {
    let name = t.id.name.to_string();
    let type_params = type_params_of(t.type_parameters.as_deref(), ctx);
    let annotation_text = ctx.norm(t.type_annotation.span());

    let (properties, index_signatures, type_text) = match &t.type_annotation {
        TSType::TSTypeLiteral(lit) => {
            let (props, indexes) = members_of_signatures(&lit.members, ctx);
            (props, indexes, None)
        }
        TSType::TSUnionType(_)
        | TSType::TSIntersectionType(_)
        | TSType::TSMappedType(_)
        | TSType::TSConditionalType(_) => (Vec::new(), Vec::new(), Some(annotation_text.clone())),
        _ => (Vec::new(), Vec::new(), Some(annotation_text.clone())),
    };

    SymbolInfo {
        qualified_name: name.clone(),
        signature: format!("type {} = {}", name, annotation_text),
        name,
        line: ctx.line(t.span),
        column: ctx.column(t.span),
        kind: SymbolKind::Type,
        is_exported: exported,
        pos: t.span.start,
        end: t.span.end,
        parameters: None,
        return_type: None,
        overloads: None,
        detail: SymbolDetail::TypeAlias {
            type_params,
            properties,
            index_signatures,
            type_text,
        },
    }
}

pub(super) fn enum_symbol(
    e: &TSEnumDeclaration<'_>,
    exported: bool,
    ctx: &FileContext<'_>,
) -> SymbolInfo {
    let name = e.id.name.to_string();
    let mut members = Vec::new();
    for member in &e.body.members {
        let member_name = match &member.id {
            TSEnumMemberName::Identifier(id) => id.name.to_string(),
            TSEnumMemberName::String(s) => s.value.to_string(),
            other => ctx.text(other.span()).to_string(),
        };
        let value = member.initializer.as_ref().and_then(|init| match init {
            Expression::StringLiteral(s) => Some(s.value.to_string()),
            Expression::NumericLiteral(_) | Expression::UnaryExpression(_) => {
                Some(ctx.norm(init.span()))
            }
            _ => None,
        });
        members.push(EnumMemberInfo {
            name: member_name,
            value,
        });
    }

    let rendered: Vec<String> = members
        .iter()
        .map(|m| match &m.value {
            Some(v) => format!("{} = {}", m.name, v),
            None => m.name.clone(),
        })
        .collect();
    let signature = format!(
        "{}enum {} {{ {} }}",
        if e.r#const { "const " } else { "" },
        name,
        rendered.join(", ")
    );

    SymbolInfo {
        qualified_name: name.clone(),
        name,
        line: ctx.line(e.span),
        column: ctx.column(e.span),
        signature,
        kind: SymbolKind::Enum,
        is_exported: exported,
        pos: e.span.start,
        end: e.span.end,
        parameters: None,
        return_type: None,
        overloads: None,
        detail: SymbolDetail::Enum {
            members,
            is_const: e.r#const,
        },
    }
}

fn variable_symbol(
    name: &str,
    declarator: &VariableDeclarator<'_>,
    init: Option<&Expression<'_>>,
    is_const: bool,
    exported: bool,
    ctx: &FileContext<'_>,
) -> SymbolInfo {
    let type_text = declarator
        .id
        .type_annotation
        .as_ref()
        .map(|t| ctx.norm(t.type_annotation.span()))
        .unwrap_or_else(|| inferred_init_type(init));

    let keyword = if is_const { "const" } else { "let" };
    let signature = if type_text.is_empty() {
        format!("{} {}", keyword, name)
    } else {
        format!("{} {}: {}", keyword, name, type_text)
    };

    SymbolInfo {
        name: name.to_string(),
        qualified_name: name.to_string(),
        line: ctx.line(declarator.span),
        column: ctx.column(declarator.span),
        signature,
        kind: SymbolKind::Variable,
        is_exported: exported,
        pos: declarator.span.start,
        end: declarator.span.end,
        parameters: None,
        return_type: None,
        overloads: None,
        detail: SymbolDetail::Variable {
            type_text,
            readonly: is_const,
        },
    }
}

/// Crude literal-shape inference for unannotated variables. This stands in
/// for checker inference and only covers unambiguous initializers.
fn inferred_init_type(init: Option<&Expression<'_>>) -> String {
    match init {
        Some(Expression::StringLiteral(_)) | Some(Expression::TemplateLiteral(_)) => {
            "string".to_string()
        }
        Some(Expression::NumericLiteral(_)) => "number".to_string(),
        Some(Expression::BooleanLiteral(_)) => "boolean".to_string(),
        Some(Expression::NewExpression(new_expr)) => match &new_expr.callee {
            Expression::Identifier(id) => id.name.to_string(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

/// Interface/type-literal members split into named properties and index
/// signatures. Method signatures become properties with a function type.
fn members_of_signatures(
    members: &[TSSignature<'_>],
    ctx: &FileContext<'_>,
) -> (Vec<TypePropertyInfo>, Vec<IndexSignatureInfo>) {
    let mut properties = Vec::new();
    let mut index_signatures = Vec::new();

    for member in members {
        match member {
            TSSignature::TSPropertySignature(p) => {
                let Some(name) = property_key_name(&p.key, ctx) else {
                    continue;
                };
                let type_text = p
                    .type_annotation
                    .as_ref()
                    .map(|t| ctx.norm(t.type_annotation.span()))
                    .unwrap_or_default();
                properties.push(TypePropertyInfo {
                    name,
                    type_text,
                    optional: p.optional,
                    readonly: p.readonly,
                });
            }
            TSSignature::TSMethodSignature(m) => {
                let Some(name) = property_key_name(&m.key, ctx) else {
                    continue;
                };
                let parameters = parameters_of(&m.params, ctx);
                let return_type = m
                    .return_type
                    .as_ref()
                    .map(|r| ctx.norm(r.type_annotation.span()));
                let type_text = format!(
                    "({}) => {}",
                    render_parameters(&parameters),
                    return_type.as_deref().unwrap_or("void")
                );
                properties.push(TypePropertyInfo {
                    name,
                    type_text,
                    optional: m.optional,
                    readonly: false,
                });
            }
            TSSignature::TSIndexSignature(idx) => {
                let Some(param) = idx.parameters.first() else {
                    continue;
                };
                index_signatures.push(IndexSignatureInfo {
                    key_name: param.name.to_string(),
                    key_type: ctx.norm(param.type_annotation.type_annotation.span()),
                    value_type: ctx.norm(idx.type_annotation.type_annotation.span()),
                });
            }
            _ => {}
        }
    }

    (properties, index_signatures)
}

pub(super) fn parameters_of(
    params: &FormalParameters<'_>,
    ctx: &FileContext<'_>,
) -> Vec<ParameterInfo> {
    let mut out = Vec::new();
    for param in &params.items {
        let pattern = &param.pattern;
        let (name, default_value, annotation, has_default) = match &pattern.kind {
            BindingPatternKind::BindingIdentifier(id) => {
                (id.name.to_string(), None, &pattern.type_annotation, false)
            }
            BindingPatternKind::AssignmentPattern(assign) => {
                let inner_name = match &assign.left.kind {
                    BindingPatternKind::BindingIdentifier(id) => id.name.to_string(),
                    other => ctx.norm(other.span()),
                };
                let annotation = if pattern.type_annotation.is_some() {
                    &pattern.type_annotation
                } else {
                    &assign.left.type_annotation
                };
                (
                    inner_name,
                    Some(ctx.norm(assign.right.span())),
                    annotation,
                    true,
                )
            }
            other => (ctx.norm(other.span()), None, &pattern.type_annotation, false),
        };
        out.push(ParameterInfo {
            name,
            type_text: annotation
                .as_ref()
                .map(|t| ctx.norm(t.type_annotation.span()))
                .unwrap_or_default(),
            optional: pattern.optional || has_default,
            default_value,
            rest: false,
        });
    }
    if let Some(rest) = &params.rest {
        let name = match &rest.argument.kind {
            BindingPatternKind::BindingIdentifier(id) => id.name.to_string(),
            other => ctx.norm(other.span()),
        };
        out.push(ParameterInfo {
            name,
            type_text: rest
                .argument
                .type_annotation
                .as_ref()
                .map(|t| ctx.norm(t.type_annotation.span()))
                .unwrap_or_default(),
            optional: false,
            default_value: None,
            rest: true,
        });
    }
    out
}

fn type_params_of(
    decl: Option<&TSTypeParameterDeclaration<'_>>,
    ctx: &FileContext<'_>,
) -> Vec<TypeParamInfo> {
    let Some(decl) = decl else {
        return Vec::new();
    };
    decl.params
        .iter()
        .map(|p| TypeParamInfo {
            name: p.name.name.to_string(),
            constraint: p.constraint.as_ref().map(|c| ctx.norm(c.span())),
        })
        .collect()
}

pub(crate) fn property_key_name(key: &PropertyKey<'_>, ctx: &FileContext<'_>) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
        PropertyKey::PrivateIdentifier(p) => Some(format!("#{}", p.name)),
        PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
        other => {
            let text = ctx.text(other.span()).trim().to_string();
            if text.is_empty() { None } else { Some(text) }
        }
    }
}

/// Render a parameter list the way signature strings expect:
/// `a: number, b?: string, ...rest: T[]`.
pub(crate) fn render_parameters(params: &[ParameterInfo]) -> String {
    params
        .iter()
        .map(|p| {
            let mut s = String::new();
            if p.rest {
                s.push_str("...");
            }
            s.push_str(&p.name);
            if p.optional && !p.rest {
                s.push('?');
            }
            if !p.type_text.is_empty() {
                s.push_str(": ");
                s.push_str(&p.type_text);
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `name(a: number, b?: string): R`
pub(crate) fn function_signature(
    name: &str,
    params: &[ParameterInfo],
    return_type: Option<&str>,
) -> String {
    match return_type {
        Some(ret) if !ret.is_empty() => {
            format!("{}({}): {}", name, render_parameters(params), ret)
        }
        _ => format!("{}({})", name, render_parameters(params)),
    }
}

/// Anonymous call signature used for overload keys and class members.
pub(crate) fn call_signature(params: &[ParameterInfo], return_type: Option<&str>) -> String {
    function_signature("", params, return_type)
}

fn property_bag_text(properties: &[TypePropertyInfo]) -> String {
    if properties.is_empty() {
        return "{}".to_string();
    }
    let rendered: Vec<String> = properties
        .iter()
        .map(|p| {
            format!(
                "{}{}{}: {}",
                if p.readonly { "readonly " } else { "" },
                p.name,
                if p.optional { "?" } else { "" },
                if p.type_text.is_empty() {
                    "unknown"
                } else {
                    &p.type_text
                }
            )
        })
        .collect();
    format!("{{ {} }}", rendered.join("; "))
}

/// Collapse same-name function declarations into one entry carrying the
/// normalized overload set. TypeScript requires the implementation last in
/// source order, so the final entry of each group is kept.
pub(super) fn fold_overloads(functions: &mut Vec<SymbolInfo>) {
    use crate::types::FunctionSigInfo;
    use std::collections::HashMap;

    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, sym) in functions.iter().enumerate() {
        groups.entry(sym.name.clone()).or_default().push(idx);
    }

    let mut drop_indices = Vec::new();
    let mut overload_sets: HashMap<usize, (Vec<String>, Vec<FunctionSigInfo>)> = HashMap::new();
    for indices in groups.values() {
        if indices.len() < 2 {
            continue;
        }
        let mut keys = Vec::new();
        let mut sigs = Vec::new();
        for &i in indices {
            let sym = &functions[i];
            keys.push(call_signature(
                sym.parameters.as_deref().unwrap_or(&[]),
                sym.return_type.as_deref(),
            ));
            sigs.push(FunctionSigInfo {
                parameters: sym.parameters.clone().unwrap_or_default(),
                return_type: sym.return_type.clone(),
            });
        }
        let keep = *indices.last().expect("non-empty group");
        overload_sets.insert(keep, (keys, sigs));
        drop_indices.extend(indices[..indices.len() - 1].iter().copied());
    }

    for (idx, (keys, sigs)) in overload_sets {
        functions[idx].overloads = Some(keys);
        if let SymbolDetail::Function {
            overload_signatures,
            ..
        } = &mut functions[idx].detail
        {
            *overload_signatures = sigs;
        }
    }
    drop_indices.sort_unstable();
    for idx in drop_indices.into_iter().rev() {
        functions.remove(idx);
    }
}
