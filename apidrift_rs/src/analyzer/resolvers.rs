//! Module specifier resolution.
//!
//! Maps a specifier + referrer file to a concrete source file on disk:
//! extension rewriting (`.js` -> `.ts`/`.tsx`/`.d.ts`), extensionless
//! specifiers, directory -> `index.*` probing, and tsconfig `paths` aliases.
//! Misses are normal and non-fatal; callers count them, never raise.

use std::path::{Path, PathBuf};

use crate::analyzer::tsconfig::TsconfigSummary;

const INDEX_CANDIDATES: &[&str] = &["index.ts", "index.tsx", "index.d.ts", "index.js", "index.jsx"];

/// Resolve `specifier` as written in the file at `referrer`.
///
/// Bare specifiers are tried against tsconfig path aliases only; package
/// imports from node_modules are out of scope and resolve to `None`.
pub fn resolve_specifier(
    specifier: &str,
    referrer: &Path,
    root: &Path,
    tsconfig: &TsconfigSummary,
) -> Option<PathBuf> {
    if specifier.starts_with('.') {
        let parent = referrer.parent()?;
        return resolve_from_base(parent, specifier);
    }
    if specifier.starts_with('/') {
        return resolve_from_base(Path::new("/"), specifier.trim_start_matches('/'));
    }
    // Bare specifier: tsconfig paths aliases, then baseUrl-relative.
    if let Some(mapped) = tsconfig.apply_alias(specifier) {
        let base = tsconfig.base_dir(root);
        if let Some(found) = resolve_from_base(&base, &mapped) {
            return Some(found);
        }
    }
    if tsconfig.found {
        let base = tsconfig.base_dir(root);
        if let Some(found) = resolve_from_base(&base, specifier) {
            return Some(found);
        }
    }
    None
}

fn resolve_from_base(base: &Path, specifier: &str) -> Option<PathBuf> {
    for candidate in candidate_specifiers(specifier) {
        let path = base.join(&candidate);
        if path.is_file() {
            return Some(path);
        }
        if path.is_dir() {
            for index in INDEX_CANDIDATES {
                let probed = path.join(index);
                if probed.is_file() {
                    return Some(probed);
                }
            }
        }
    }
    None
}

/// Ordered candidate list for a specifier, per the extension-rewriting rules.
pub(crate) fn candidate_specifiers(specifier: &str) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(stem) = specifier.strip_suffix(".js") {
        for ext in [".ts", ".tsx", ".d.ts"] {
            out.push(format!("{stem}{ext}"));
        }
        for index in ["/index.ts", "/index.tsx", "/index.d.ts"] {
            out.push(format!("{stem}{index}"));
        }
        out.push(specifier.to_string());
    } else if let Some(stem) = specifier.strip_suffix(".jsx") {
        for ext in [".tsx", ".ts", ".d.ts"] {
            out.push(format!("{stem}{ext}"));
        }
        for index in ["/index.tsx", "/index.ts", "/index.d.ts"] {
            out.push(format!("{stem}{index}"));
        }
        out.push(specifier.to_string());
    } else if let Some(stem) = specifier.strip_suffix(".mjs") {
        out.push(format!("{stem}.mts"));
        out.push(format!("{stem}.ts"));
        out.push(specifier.to_string());
    } else if let Some(stem) = specifier.strip_suffix(".cjs") {
        out.push(format!("{stem}.cts"));
        out.push(format!("{stem}.ts"));
        out.push(specifier.to_string());
    } else if has_source_extension(specifier) {
        out.push(specifier.to_string());
    } else {
        for ext in [".ts", ".tsx", ".d.ts", ".js", ".jsx"] {
            out.push(format!("{specifier}{ext}"));
        }
        for index in [
            "/index.ts",
            "/index.tsx",
            "/index.d.ts",
            "/index.js",
            "/index.jsx",
        ] {
            out.push(format!("{specifier}{index}"));
        }
        out.push(specifier.to_string());
    }
    out
}

fn has_source_extension(specifier: &str) -> bool {
    let last = specifier.rsplit('/').next().unwrap_or(specifier);
    matches!(
        last.rsplit('.').next(),
        Some("ts" | "tsx" | "mts" | "cts" | "json" | "css")
    ) && last.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn js_specifier_rewrites_to_ts_first() {
        let candidates = candidate_specifiers("./util.js");
        assert_eq!(candidates[0], "./util.ts");
        assert_eq!(candidates.last().unwrap(), "./util.js");
    }

    #[test]
    fn extensionless_specifier_expands() {
        let candidates = candidate_specifiers("./util");
        assert!(candidates.contains(&"./util.ts".to_string()));
        assert!(candidates.contains(&"./util/index.ts".to_string()));
    }

    #[test]
    fn explicit_ts_specifier_is_used_as_is() {
        assert_eq!(candidate_specifiers("./util.ts"), vec!["./util.ts"]);
    }

    #[test]
    fn js_and_ts_specifiers_resolve_to_same_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("util.ts"), "export const u = 1;\n").unwrap();
        let referrer = dir.path().join("main.ts");
        fs::write(&referrer, "").unwrap();
        let cfg = TsconfigSummary::default();

        let via_js = resolve_specifier("./util.js", &referrer, dir.path(), &cfg).unwrap();
        let via_ts = resolve_specifier("./util.ts", &referrer, dir.path(), &cfg).unwrap();
        assert_eq!(via_js, via_ts);
    }

    #[test]
    fn directory_specifier_probes_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/index.ts"), "export const x = 1;\n").unwrap();
        let referrer = dir.path().join("main.ts");
        fs::write(&referrer, "").unwrap();
        let cfg = TsconfigSummary::default();

        let found = resolve_specifier("./lib", &referrer, dir.path(), &cfg).unwrap();
        assert!(found.ends_with("lib/index.ts"));
    }

    #[test]
    fn bare_specifier_without_alias_misses() {
        let dir = tempfile::tempdir().unwrap();
        let referrer = dir.path().join("main.ts");
        fs::write(&referrer, "").unwrap();
        let cfg = TsconfigSummary::default();
        assert!(resolve_specifier("react", &referrer, dir.path(), &cfg).is_none());
    }
}
