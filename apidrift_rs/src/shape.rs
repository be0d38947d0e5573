//! API shapes: normalized, language-agnostic signatures of exported runtime
//! symbols.
//!
//! A shape is derived from the declaring module's snapshot detail and cached
//! by export identity. Type-only exports yield no shape. When a resolved
//! export has no matching declaration detail (namespace exports,
//! `export = require(...)` chains), a `type_text`-only fallback shape is
//! produced instead of failing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resolve::ResolvedExport;
use crate::session::AnalysisSession;
use crate::types::{
    EnumMemberInfo, FunctionSigInfo, IndexSignatureInfo, ParameterInfo, SymbolDetail, SymbolInfo,
    TypeParamInfo, TypePropertyInfo,
};

/// How the entrypoint was analyzed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisMode {
    TypeScript,
    TypedJs,
    ModuleSurface,
}

/// One call signature of a function shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub parameters: Vec<ParameterInfo>,
    pub return_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParamInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionApiShape {
    pub name: String,
    /// Ordered; the implementation signature is last when overloaded.
    pub overloads: Vec<FunctionSignature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParamInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMember {
    pub name: String,
    /// "method" | "property" | "get" | "set"
    pub kind: String,
    pub visibility: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
    /// Declared type for properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
    /// Call signature for methods/accessors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<FunctionSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassApiShape {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParamInfo>,
    pub members: Vec<ClassMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor: Option<FunctionSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
}

/// Covers both `type` aliases and `interface`s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeApiShape {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParamInfo>,
    /// Empty whenever `type_text` is set; readers compare by `type_text`
    /// in that case.
    pub properties: Vec<TypePropertyInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index_signatures: Vec<IndexSignatureInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumApiShape {
    pub name: String,
    pub members: Vec<EnumMemberInfo>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_const: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableApiShape {
    pub name: String,
    #[serde(rename = "type")]
    pub type_text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
}

/// Tagged shape variant per exported runtime symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ApiShape {
    Function(FunctionApiShape),
    Class(ClassApiShape),
    Interface(TypeApiShape),
    Type(TypeApiShape),
    Enum(EnumApiShape),
    Variable(VariableApiShape),
    Const(VariableApiShape),
}

impl ApiShape {
    pub fn name(&self) -> &str {
        match self {
            ApiShape::Function(s) => &s.name,
            ApiShape::Class(s) => &s.name,
            ApiShape::Interface(s) | ApiShape::Type(s) => &s.name,
            ApiShape::Enum(s) => &s.name,
            ApiShape::Variable(s) | ApiShape::Const(s) => &s.name,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            ApiShape::Function(_) => "function",
            ApiShape::Class(_) => "class",
            ApiShape::Interface(_) => "interface",
            ApiShape::Type(_) => "type",
            ApiShape::Enum(_) => "enum",
            ApiShape::Variable(_) => "variable",
            ApiShape::Const(_) => "const",
        }
    }
}

/// Snapshot of an entrypoint's resolved API surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiSnapshot {
    pub entrypoint_path: String,
    /// Keyed by export identity; BTreeMap keeps serialization stable.
    pub exports: BTreeMap<String, ApiShape>,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_shapes: Vec<String>,
    pub analysis_mode: AnalysisMode,
}

/// `"{name}|{value|type}|{declFilePath}|{declPos}"`: the ground truth for
/// matching exports across versions.
pub fn export_identity(name: &str, is_type: bool, decl_file: &str, decl_pos: u32) -> String {
    format!(
        "{}|{}|{}|{}",
        name,
        if is_type { "type" } else { "value" },
        decl_file,
        decl_pos
    )
}

/// Build (or fetch from the session cache) the shape for a resolved export.
///
/// Returns `None` for type-only exports and for exports whose declaration
/// could not be located at all.
pub fn build_api_shape(
    session: &mut AnalysisSession,
    resolved: &ResolvedExport,
) -> Option<ApiShape> {
    let identity = resolved.identity();
    if let Some(cached) = session.cached_shape(&identity) {
        return cached.clone();
    }
    let shape = extract_shape(session, resolved);
    session.cache_shape(identity, shape.clone());
    shape
}

fn extract_shape(session: &mut AnalysisSession, resolved: &ResolvedExport) -> Option<ApiShape> {
    if resolved.is_type_only {
        return None;
    }

    let decl_path = std::path::Path::new(&resolved.decl_file_path);
    let symbol = session
        .get_module(decl_path)
        .and_then(|record| find_declaration(&record.snapshot, resolved))
        .cloned();
    // The declaring file may not be in the registry yet when shapes are
    // requested directly.
    let symbol = match symbol {
        Some(s) => Some(s),
        None => session
            .load_module(decl_path)
            .and_then(|record| find_declaration(&record.snapshot, resolved))
            .cloned(),
    };

    match symbol {
        Some(sym) => Some(shape_from_symbol(&sym, &resolved.public_name())),
        None => Some(fallback_shape(resolved)),
    }
}

fn find_declaration<'a>(
    snapshot: &'a crate::types::SymbolSnapshot,
    resolved: &ResolvedExport,
) -> Option<&'a SymbolInfo> {
    let by_pos = snapshot
        .all_symbols()
        .find(|s| s.pos == resolved.decl_pos && s.name == resolved.target_name);
    by_pos.or_else(|| snapshot.all_symbols().find(|s| s.name == resolved.target_name))
}

/// Variables typed as interfaces stay variables (first-match rule); the
/// declaration's own kind decides the variant.
pub fn shape_from_symbol(sym: &SymbolInfo, public_name: &str) -> ApiShape {
    let name = public_name.to_string();
    match &sym.detail {
        SymbolDetail::Function {
            type_params,
            overload_signatures,
            ..
        } => {
            let overloads = if overload_signatures.is_empty() {
                vec![FunctionSignature {
                    parameters: sym.parameters.clone().unwrap_or_default(),
                    return_type: sym.return_type.clone().unwrap_or_default(),
                    type_params: Vec::new(),
                }]
            } else {
                overload_signatures.iter().map(signature_of).collect()
            };
            ApiShape::Function(FunctionApiShape {
                name,
                overloads,
                type_params: type_params.clone(),
            })
        }
        SymbolDetail::Class {
            extends,
            implements,
            type_params,
            members,
        } => {
            let mut constructor = None;
            let mut out_members = Vec::new();
            for member in members {
                if member.visibility == "private" {
                    continue;
                }
                if member.kind == "constructor" {
                    constructor = Some(FunctionSignature {
                        parameters: member.parameters.clone().unwrap_or_default(),
                        return_type: member.return_type.clone().unwrap_or_default(),
                        type_params: Vec::new(),
                    });
                    continue;
                }
                let is_callable = matches!(member.kind.as_str(), "method" | "get" | "set");
                out_members.push(ClassMember {
                    name: member.name.clone(),
                    kind: member.kind.clone(),
                    visibility: member.visibility.clone(),
                    is_static: member.is_static,
                    optional: member.optional,
                    readonly: member.readonly,
                    type_text: (!is_callable).then(|| member.signature.clone()),
                    signature: is_callable.then(|| FunctionSignature {
                        parameters: member.parameters.clone().unwrap_or_default(),
                        return_type: member.return_type.clone().unwrap_or_default(),
                        type_params: Vec::new(),
                    }),
                });
            }
            ApiShape::Class(ClassApiShape {
                name,
                type_params: type_params.clone(),
                members: out_members,
                constructor,
                extends: extends.clone(),
                implements: implements.clone(),
            })
        }
        SymbolDetail::Interface {
            extends,
            type_params,
            properties,
            index_signatures,
        } => ApiShape::Interface(TypeApiShape {
            name,
            type_params: type_params.clone(),
            properties: properties.clone(),
            index_signatures: index_signatures.clone(),
            type_text: None,
            extends: extends.clone(),
        }),
        SymbolDetail::TypeAlias {
            type_params,
            properties,
            index_signatures,
            type_text,
        } => ApiShape::Type(TypeApiShape {
            name,
            type_params: type_params.clone(),
            properties: if type_text.is_some() {
                Vec::new()
            } else {
                properties.clone()
            },
            index_signatures: index_signatures.clone(),
            type_text: type_text.clone(),
            extends: Vec::new(),
        }),
        SymbolDetail::Enum { members, is_const } => ApiShape::Enum(EnumApiShape {
            name,
            members: members.clone(),
            is_const: *is_const,
        }),
        SymbolDetail::Variable {
            type_text,
            readonly,
        } => {
            let shape = VariableApiShape {
                name,
                type_text: type_text.clone(),
                readonly: *readonly,
            };
            if *readonly {
                ApiShape::Const(shape)
            } else {
                ApiShape::Variable(shape)
            }
        }
        SymbolDetail::None => ApiShape::Variable(VariableApiShape {
            name,
            type_text: sym.signature.clone(),
            readonly: false,
        }),
    }
}

fn signature_of(sig: &FunctionSigInfo) -> FunctionSignature {
    FunctionSignature {
        parameters: sig.parameters.clone(),
        return_type: sig.return_type.clone().unwrap_or_default(),
        type_params: Vec::new(),
    }
}

/// `type_text`-only shape for exports with no locatable declaration
/// (namespace exports, CJS bridges, `export = require(...)`).
fn fallback_shape(resolved: &ResolvedExport) -> ApiShape {
    let name = resolved.public_name();
    match resolved.kind.as_str() {
        "interface" => ApiShape::Interface(TypeApiShape {
            name,
            type_params: Vec::new(),
            properties: Vec::new(),
            index_signatures: Vec::new(),
            type_text: Some("unknown".to_string()),
            extends: Vec::new(),
        }),
        "type" => ApiShape::Type(TypeApiShape {
            name,
            type_params: Vec::new(),
            properties: Vec::new(),
            index_signatures: Vec::new(),
            type_text: Some("unknown".to_string()),
            extends: Vec::new(),
        }),
        _ => ApiShape::Variable(VariableApiShape {
            name,
            type_text: "unknown".to_string(),
            readonly: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ast_ts::build_snapshot_standalone;

    fn symbol<'a>(
        snap: &'a crate::types::SymbolSnapshot,
        name: &str,
    ) -> &'a crate::types::SymbolInfo {
        snap.all_symbols().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn function_shape_has_one_signature_without_overloads() {
        let snap = build_snapshot_standalone(
            "src/a.ts",
            "export function greet(who?: string): string { return \"\"; }\n",
        );
        let shape = shape_from_symbol(symbol(&snap, "greet"), "greet");
        let ApiShape::Function(f) = shape else {
            panic!("expected function shape");
        };
        assert_eq!(f.overloads.len(), 1);
        assert_eq!(f.overloads[0].return_type, "string");
        assert!(f.overloads[0].parameters[0].optional);
    }

    #[test]
    fn class_shape_drops_private_members() {
        let snap = build_snapshot_standalone(
            "src/a.ts",
            r#"
            export class Client {
                private token: string = "";
                ping(): string { return "ok"; }
                constructor(url: string) {}
            }
            "#,
        );
        let shape = shape_from_symbol(symbol(&snap, "Client"), "Client");
        let ApiShape::Class(c) = shape else {
            panic!("expected class shape");
        };
        assert!(c.members.iter().all(|m| m.name != "token"));
        assert!(c.members.iter().any(|m| m.name == "ping"));
        assert!(c.constructor.is_some());
    }

    #[test]
    fn union_alias_is_type_text_only() {
        let snap = build_snapshot_standalone("src/a.ts", "export type Mode = \"a\" | \"b\";\n");
        let shape = shape_from_symbol(symbol(&snap, "Mode"), "Mode");
        let ApiShape::Type(t) = shape else {
            panic!("expected type shape");
        };
        assert!(t.properties.is_empty());
        assert_eq!(t.type_text.as_deref(), Some("\"a\" | \"b\""));
    }

    #[test]
    fn object_alias_keeps_properties() {
        let snap = build_snapshot_standalone(
            "src/a.ts",
            "export type Point = { x: number; y: number };\n",
        );
        let shape = shape_from_symbol(symbol(&snap, "Point"), "Point");
        let ApiShape::Type(t) = shape else {
            panic!("expected type shape");
        };
        assert_eq!(t.properties.len(), 2);
        assert!(t.type_text.is_none());
    }

    #[test]
    fn const_variable_becomes_const_shape() {
        let snap = build_snapshot_standalone("src/a.ts", "export const LIMIT: number = 10;\n");
        let shape = shape_from_symbol(symbol(&snap, "LIMIT"), "LIMIT");
        assert!(matches!(shape, ApiShape::Const(_)));
    }

    #[test]
    fn empty_enum_still_yields_shape() {
        let snap = build_snapshot_standalone("src/a.ts", "export enum Nothing {}\n");
        let shape = shape_from_symbol(symbol(&snap, "Nothing"), "Nothing");
        let ApiShape::Enum(e) = shape else {
            panic!("expected enum shape");
        };
        assert!(e.members.is_empty());
    }
}
