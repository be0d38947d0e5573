//! tsconfig.json summary.
//!
//! The analyzer needs three things from tsconfig: whether `.js` files go
//! through the type-aware flavor (`allowJs`/`checkJs`), the `baseUrl`, and
//! the `paths` alias table. Include/exclude patterns are summarized for the
//! recursive scanner. The file is loaded verbatim; an unreadable or invalid
//! tsconfig degrades to the defaults and logs a warning.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

/// One `paths` alias: pattern and first target, both with `*` wildcards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathAlias {
    pub pattern: String,
    pub target: String,
}

/// Condensed view of a tsconfig.json.
#[derive(Clone, Debug, Default)]
pub struct TsconfigSummary {
    pub found: bool,
    pub allow_js: bool,
    pub check_js: bool,
    /// `compilerOptions.baseUrl`, as written.
    pub base_url: Option<String>,
    pub aliases: Vec<PathAlias>,
    pub include: Option<GlobSet>,
    pub exclude: Option<GlobSet>,
}

impl TsconfigSummary {
    /// Absolute directory that alias targets and baseUrl lookups resolve
    /// against.
    pub fn base_dir(&self, root: &Path) -> PathBuf {
        match &self.base_url {
            Some(base) => root.join(base),
            None => root.to_path_buf(),
        }
    }

    /// Map a bare specifier through the `paths` table. First match wins.
    pub fn apply_alias(&self, specifier: &str) -> Option<String> {
        for alias in &self.aliases {
            if let Some(prefix) = alias.pattern.strip_suffix('*') {
                if let Some(rest) = specifier.strip_prefix(prefix) {
                    return Some(alias.target.replace('*', rest));
                }
            } else if alias.pattern == specifier {
                return Some(alias.target.clone());
            }
        }
        None
    }

    /// `.js`/`.jsx` files participate in the type-aware flavor only when
    /// tsconfig opts them in.
    pub fn js_is_type_aware(&self) -> bool {
        self.allow_js || self.check_js
    }
}

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;
    for pat in patterns {
        if pat.trim().is_empty() {
            continue;
        }
        match Glob::new(pat) {
            Ok(glob) => {
                builder.add(glob);
                added = true;
            }
            Err(err) => crate::warn(&format!("invalid glob '{}': {}", pat, err)),
        }
    }
    if !added { None } else { builder.build().ok() }
}

fn string_array(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.replace('\\', "/")))
                .collect()
        })
        .unwrap_or_default()
}

/// Load the tsconfig at `explicit`, or `root/tsconfig.json` when absent.
pub fn load_tsconfig_summary(root: &Path, explicit: Option<&Path>) -> TsconfigSummary {
    let ts_path = match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => root.join("tsconfig.json"),
    };
    if !ts_path.exists() {
        if explicit.is_some() {
            crate::warn(&format!("tsconfig not found: {}", ts_path.display()));
        }
        return TsconfigSummary::default();
    }
    let content = match fs::read_to_string(&ts_path) {
        Ok(c) => c,
        Err(err) => {
            crate::warn(&format!("cannot read {}: {}", ts_path.display(), err));
            return TsconfigSummary::default();
        }
    };
    let parsed: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(err) => {
            crate::warn(&format!("invalid tsconfig {}: {}", ts_path.display(), err));
            return TsconfigSummary::default();
        }
    };

    let compiler = parsed
        .get("compilerOptions")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    let allow_js = compiler
        .get("allowJs")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let check_js = compiler
        .get("checkJs")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let base_url = compiler
        .get("baseUrl")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let mut aliases = Vec::new();
    if let Some(paths) = compiler.get("paths").and_then(|p| p.as_object()) {
        for (alias, targets) in paths.iter() {
            if let Some(first) = targets.as_array().and_then(|arr| arr.first()) {
                if let Some(target_str) = first.as_str() {
                    aliases.push(PathAlias {
                        pattern: alias.replace('\\', "/"),
                        target: target_str.replace('\\', "/"),
                    });
                }
            }
        }
    }

    let include = build_globset(&string_array(parsed.get("include")));
    let exclude = build_globset(&string_array(parsed.get("exclude")));

    TsconfigSummary {
        found: true,
        allow_js,
        check_js,
        base_url,
        aliases,
        include,
        exclude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tsconfig_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let summary = load_tsconfig_summary(dir.path(), None);
        assert!(!summary.found);
        assert!(!summary.js_is_type_aware());
    }

    #[test]
    fn loads_compiler_options_and_aliases() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{
              "compilerOptions": {
                "allowJs": true,
                "baseUrl": ".",
                "paths": { "@app/*": ["src/app/*"], "@lib": ["src/lib/index.ts"] }
              },
              "include": ["src/**/*"]
            }"#,
        )
        .unwrap();

        let summary = load_tsconfig_summary(dir.path(), None);
        assert!(summary.found);
        assert!(summary.allow_js);
        assert_eq!(
            summary.apply_alias("@app/util").as_deref(),
            Some("src/app/util")
        );
        assert_eq!(
            summary.apply_alias("@lib").as_deref(),
            Some("src/lib/index.ts")
        );
        assert!(summary.apply_alias("react").is_none());
        assert!(summary.include.is_some());
    }
}
