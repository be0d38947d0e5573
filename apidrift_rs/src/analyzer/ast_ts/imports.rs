//! Import declaration handling.

use oxc_ast::ast::*;

use crate::types::{ImportInfo, SymbolSnapshot};

pub(super) fn collect_import(decl: &ImportDeclaration<'_>, snapshot: &mut SymbolSnapshot) {
    let mut info = ImportInfo {
        module: decl.source.value.to_string(),
        ..Default::default()
    };
    if let Some(specifiers) = &decl.specifiers {
        for spec in specifiers {
            match spec {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    info.is_default = true;
                    info.symbols.push(s.local.name.to_string());
                }
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    info.symbols.push(s.local.name.to_string());
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    info.is_namespace = true;
                    info.symbols.push(s.local.name.to_string());
                }
            }
        }
    }
    snapshot.imports.push(info);
}

#[cfg(test)]
mod tests {
    use crate::analyzer::ast_ts::build_snapshot_standalone;

    #[test]
    fn import_variants() {
        let snap = build_snapshot_standalone(
            "src/test.ts",
            r#"
            import { Foo } from "./bar";
            import Default, { Named } from "./baz";
            import * as NS from "./ns";
            import "./side-effect";
            "#,
        );

        assert_eq!(snap.imports.len(), 4);

        let bar = snap.imports.iter().find(|i| i.module == "./bar").unwrap();
        assert_eq!(bar.symbols, vec!["Foo".to_string()]);
        assert!(!bar.is_default);

        let baz = snap.imports.iter().find(|i| i.module == "./baz").unwrap();
        assert!(baz.is_default);
        assert_eq!(baz.symbols.len(), 2);

        let ns = snap.imports.iter().find(|i| i.module == "./ns").unwrap();
        assert!(ns.is_namespace);

        let side = snap
            .imports
            .iter()
            .find(|i| i.module == "./side-effect")
            .unwrap();
        assert!(side.symbols.is_empty());
    }
}
