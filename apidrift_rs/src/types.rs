//! Core types for apidrift analysis.
//!
//! This module defines the fundamental data structures used throughout apidrift:
//! - [`SymbolSnapshot`] - Per-file, immutable description of the API surface
//! - [`SymbolInfo`] / [`SymbolDetail`] - Top-level declaration representations
//! - [`ExportInfo`] / [`ImportInfo`] - Export/import representations
//! - [`ExportStats`] - Diagnostic export statistics per snapshot
//! - [`PackageSummary`] / [`PackageChange`] - package.json surface (JS mode)

use serde::{Deserialize, Serialize};

/// Directories skipped during recursive source scanning.
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "out", ".vscode"];

/// Severity of a reported finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Breaking,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Breaking => "breaking",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Kind of a top-level declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Type,
    Enum,
    Variable,
    Method,
    Property,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
            SymbolKind::Method => "method",
            SymbolKind::Property => "property",
        }
    }
}

/// How a module surfaces its bindings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleSystem {
    Cjs,
    Esm,
    Mixed,
    #[default]
    Unknown,
}

/// A single function/method parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name as written.
    pub name: String,
    /// Normalized declared type ("" when unannotated).
    #[serde(rename = "type")]
    pub type_text: String,
    /// True for `p?: T` or parameters with a default value.
    pub optional: bool,
    /// Default value source text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// True for `...rest` parameters.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rest: bool,
}

/// A generic type parameter with optional constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamInfo {
    pub name: String,
    /// Normalized `extends` constraint, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

/// One call signature: parameters plus return type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSigInfo {
    pub parameters: Vec<ParameterInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

/// A class member as captured at snapshot time.
///
/// Private members are captured here (the diff engine needs them to tell
/// "removed" from "made private"); the shape extractor drops them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMemberInfo {
    pub name: String,
    /// "method" | "property" | "get" | "set" | "constructor"
    pub kind: String,
    /// "public" | "protected" | "private"
    pub visibility: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
    /// Normalized call signature for methods/accessors, declared type for properties.
    pub signature: String,
    /// Parameters for methods/accessors (absent for plain properties).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ParameterInfo>>,
    /// Normalized return type for methods/accessors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

/// A named property of an interface or object-literal type alias.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePropertyInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_text: String,
    pub optional: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
}

/// An index signature such as `[key: string]: number`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSignatureInfo {
    pub key_name: String,
    pub key_type: String,
    pub value_type: String,
}

/// An enum member with its literal value when resolvable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMemberInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Per-kind declaration detail.
///
/// Replaces the loosely-typed metadata bag of earlier designs with explicit
/// variants so the diff engine can match exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "detail", rename_all = "snake_case")]
pub enum SymbolDetail {
    Function {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_async: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_arrow: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_params: Vec<TypeParamInfo>,
        /// Structured signatures for overloaded functions (implementation
        /// last); empty for single-signature functions.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        overload_signatures: Vec<FunctionSigInfo>,
    },
    Class {
        #[serde(skip_serializing_if = "Option::is_none")]
        extends: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        implements: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_params: Vec<TypeParamInfo>,
        members: Vec<ClassMemberInfo>,
    },
    Interface {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extends: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_params: Vec<TypeParamInfo>,
        properties: Vec<TypePropertyInfo>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        index_signatures: Vec<IndexSignatureInfo>,
    },
    TypeAlias {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_params: Vec<TypeParamInfo>,
        /// Property bag when the right-hand side is an object literal type.
        properties: Vec<TypePropertyInfo>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        index_signatures: Vec<IndexSignatureInfo>,
        /// Normalized source text for unions/intersections/mapped/conditional
        /// types. When non-empty, `properties` is empty and comparisons go
        /// through this field.
        #[serde(skip_serializing_if = "Option::is_none")]
        type_text: Option<String>,
    },
    Enum {
        members: Vec<EnumMemberInfo>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_const: bool,
    },
    Variable {
        #[serde(rename = "type")]
        type_text: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        readonly: bool,
    },
    None,
}

/// A top-level declaration in a source file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Declared name.
    pub name: String,
    /// Qualified name; `"Class.method"` for class members, otherwise the name.
    pub qualified_name: String,
    /// 1-based line of the declaration.
    pub line: usize,
    /// 1-based column of the declaration.
    pub column: usize,
    /// Stable normalized signature string used for fast equality.
    pub signature: String,
    pub kind: SymbolKind,
    pub is_exported: bool,
    /// Byte offset of the declaration start (identity key component).
    pub pos: u32,
    /// Byte offset one past the declaration end.
    pub end: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ParameterInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// Normalized overload keys; absent unless the function has >= 2
    /// call signatures. The implementation signature is last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overloads: Option<Vec<String>>,
    pub detail: SymbolDetail,
}

/// Export statement shape as consumers see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Named,
    Default,
    Namespace,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Named => "named",
            ExportType::Default => "default",
            ExportType::Namespace => "namespace",
        }
    }
}

/// A single exported binding of a module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportInfo {
    /// Public name consumers import ("default" for default exports).
    pub name: String,
    #[serde(rename = "type")]
    pub export_type: ExportType,
    /// Declaration kind of the target, or the literal `"re-export"`.
    pub kind: String,
    /// 1-based line of the export statement.
    pub line: usize,
    /// Unresolved module specifier for re-exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_module: Option<String>,
    /// Name in the source module before any `as` alias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Local declaration name when it differs from the public name
    /// (`export default function f` carries `local_name = "f"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// True for `export type` syntax (statement- or specifier-level).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_type_only: bool,
    /// Resolved declaration site, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decl_file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decl_pos: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decl_end: Option<u32>,
    /// Stable symbol handle (`"{file}#{pos}:{name}:{value|type}"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_handle: Option<String>,
}

impl ExportInfo {
    pub fn new(name: String, export_type: ExportType, kind: &str, line: usize) -> Self {
        Self {
            name,
            export_type,
            kind: kind.to_string(),
            line,
            source_module: None,
            source_name: None,
            local_name: None,
            is_type_only: false,
            decl_file_path: None,
            decl_pos: None,
            decl_end: None,
            symbol_handle: None,
        }
    }

    /// True when this entry re-exports from another module.
    pub fn is_reexport(&self) -> bool {
        self.source_module.is_some()
    }

    /// Strong uniqueness key: `(name, module|"local", type-only, kind, decl)`.
    pub fn strong_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}:{}",
            self.name,
            self.source_module.as_deref().unwrap_or("local"),
            self.is_type_only,
            self.kind,
            self.decl_file_path.as_deref().unwrap_or(""),
            self.decl_pos.unwrap_or(0),
        )
    }

    /// True when the export contributes to the runtime surface (as opposed
    /// to interfaces, type aliases and `export type` entries).
    pub fn is_runtime(&self) -> bool {
        !self.is_type_only && self.kind != "interface" && self.kind != "type"
    }

    /// Diff signature per the export-diff contract: re-exports compare by
    /// source coordinates, declarations by kind and export shape.
    pub fn diff_signature(&self) -> String {
        if let Some(module) = &self.source_module {
            format!(
                "reexport:{}:from:{}:name:{}",
                self.name,
                module,
                self.source_name.as_deref().unwrap_or(&self.name)
            )
        } else {
            format!(
                "decl:{}:{}:{}",
                self.name,
                self.kind,
                self.export_type.as_str()
            )
        }
    }
}

/// An import statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// Module specifier as written.
    pub module: String,
    /// Imported local names.
    pub symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_namespace: bool,
}

/// Diagnostic export statistics (spec-level self-checks for barrels).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub direct_exports: usize,
    pub re_exported_symbols: usize,
    pub type_only_exports: usize,
    pub exports_total: usize,
    pub exports_runtime: usize,
    pub exports_type: usize,
    pub exports_unique: usize,
    pub exports_with_declarations: usize,
    pub reexport_groups_unresolved: usize,
}

/// Condensed package.json surface carried by JS-mode snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The `"type"` field ("module" | "commonjs"), verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    /// Sorted keys of the `"exports"` map.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports_keys: Vec<String>,
}

/// An opaque package-level change passed through the diff engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageChange {
    /// Changed field ("type", "main", "exports").
    pub field: String,
    pub before: String,
    pub after: String,
}

/// Immutable per-file API surface snapshot.
///
/// Produced by the snapshot builder, consumed by the diff engine and the
/// report formatter, never mutated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    /// Absolute path of the analyzed file.
    pub file_path: String,
    /// Capture time (unix seconds); informational only, never diffed.
    pub timestamp: u64,
    pub functions: Vec<SymbolInfo>,
    pub classes: Vec<SymbolInfo>,
    pub interfaces: Vec<SymbolInfo>,
    pub types: Vec<SymbolInfo>,
    pub enums: Vec<SymbolInfo>,
    pub variables: Vec<SymbolInfo>,
    pub exports: Vec<ExportInfo>,
    pub imports: Vec<ImportInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_stats: Option<ExportStats>,
    #[serde(default, skip_serializing_if = "is_unknown_module_system")]
    pub module_system: ModuleSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageSummary>,
}

fn is_unknown_module_system(m: &ModuleSystem) -> bool {
    *m == ModuleSystem::Unknown
}

impl Default for SymbolInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            qualified_name: String::new(),
            line: 0,
            column: 0,
            signature: String::new(),
            kind: SymbolKind::Variable,
            is_exported: false,
            pos: 0,
            end: 0,
            parameters: None,
            return_type: None,
            overloads: None,
            detail: SymbolDetail::None,
        }
    }
}

impl SymbolSnapshot {
    pub fn new(file_path: String) -> Self {
        Self {
            file_path,
            ..Default::default()
        }
    }

    /// All symbol lists in a fixed kind order (source order within a list).
    pub fn all_symbols(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.functions
            .iter()
            .chain(self.classes.iter())
            .chain(self.interfaces.iter())
            .chain(self.types.iter())
            .chain(self.enums.iter())
            .chain(self.variables.iter())
    }

    /// True when the file only re-exports (zero local declarations but a
    /// non-empty export list).
    pub fn is_barrel(&self) -> bool {
        self.all_symbols().next().is_none() && !self.exports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_strong_key_distinguishes_reexports_from_locals() {
        let mut local = ExportInfo::new("foo".to_string(), ExportType::Named, "function", 3);
        local.decl_file_path = Some("src/a.ts".to_string());
        local.decl_pos = Some(10);

        let mut reexport = ExportInfo::new("foo".to_string(), ExportType::Named, "re-export", 4);
        reexport.source_module = Some("./b".to_string());
        reexport.source_name = Some("foo".to_string());

        assert_ne!(local.strong_key(), reexport.strong_key());
    }

    #[test]
    fn diff_signature_formats() {
        let mut re = ExportInfo::new("x".to_string(), ExportType::Named, "re-export", 1);
        re.source_module = Some("./m".to_string());
        re.source_name = Some("a".to_string());
        assert_eq!(re.diff_signature(), "reexport:x:from:./m:name:a");

        let decl = ExportInfo::new("f".to_string(), ExportType::Named, "function", 1);
        assert_eq!(decl.diff_signature(), "decl:f:function:named");
    }

    #[test]
    fn runtime_classification() {
        let iface = ExportInfo::new("Opts".to_string(), ExportType::Named, "interface", 1);
        assert!(!iface.is_runtime());

        let mut typed = ExportInfo::new("T".to_string(), ExportType::Named, "re-export", 1);
        typed.is_type_only = true;
        assert!(!typed.is_runtime());

        let func = ExportInfo::new("f".to_string(), ExportType::Named, "function", 1);
        assert!(func.is_runtime());
    }

    #[test]
    fn barrel_detection() {
        let mut snap = SymbolSnapshot::new("src/index.ts".to_string());
        let mut re = ExportInfo::new("x".to_string(), ExportType::Named, "re-export", 1);
        re.source_module = Some("./x".to_string());
        snap.exports.push(re);
        assert!(snap.is_barrel());

        snap.functions.push(SymbolInfo {
            name: "f".to_string(),
            qualified_name: "f".to_string(),
            kind: SymbolKind::Function,
            ..Default::default()
        });
        assert!(!snap.is_barrel());
    }
}
