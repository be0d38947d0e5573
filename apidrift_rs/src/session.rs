//! Analysis session: the mutable project state shared across files.
//!
//! One [`AnalysisSession`] corresponds to one "program" of the analyzed
//! repository. It owns every cache the pipeline uses:
//! - the module registry (parsed snapshots keyed by canonical path),
//! - the module-resolution cache (append-only),
//! - the API-shape cache (append-only, keyed by export identity).
//!
//! Sessions are single-threaded; concurrent runs use separate sessions.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analyzer::ast_ts;
use crate::analyzer::resolvers;
use crate::analyzer::tsconfig::TsconfigSummary;
use crate::shape::ApiShape;
use crate::types::SymbolSnapshot;

/// Errors surfaced at session boundaries. Most failures inside the pipeline
/// are absorbed (logged and skipped); these are the ones callers can act on.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("entrypoint is not a file: {0}")]
    NotAFile(PathBuf),
}

/// A parsed module held by the session.
#[derive(Clone, Debug)]
pub struct ModuleRecord {
    pub path: PathBuf,
    pub source: String,
    pub snapshot: SymbolSnapshot,
}

/// One exported name of a module, as seen by re-export expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleExport {
    pub name: String,
    pub is_type_only: bool,
    pub kind: String,
}

/// Mutable project state for one analysis run.
pub struct AnalysisSession {
    root: PathBuf,
    tsconfig: TsconfigSummary,
    modules: HashMap<PathBuf, ModuleRecord>,
    /// Guards against re-entrant loads while a module is mid-build.
    loading: HashSet<PathBuf>,
    resolve_cache: HashMap<(String, PathBuf), Option<PathBuf>>,
    shape_cache: HashMap<String, Option<ApiShape>>,
}

impl AnalysisSession {
    pub fn new(root: &Path, tsconfig: TsconfigSummary) -> Self {
        Self {
            root: canonical(root),
            tsconfig,
            modules: HashMap::new(),
            loading: HashSet::new(),
            resolve_cache: HashMap::new(),
            shape_cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tsconfig(&self) -> &TsconfigSummary {
        &self.tsconfig
    }

    /// Resolve a module specifier relative to a referrer file. Memoized;
    /// `None` is a normal outcome and is cached too.
    pub fn resolve(&mut self, specifier: &str, referrer: &Path) -> Option<PathBuf> {
        let key = (specifier.to_string(), referrer.to_path_buf());
        if let Some(cached) = self.resolve_cache.get(&key) {
            return cached.clone();
        }
        let resolved =
            resolvers::resolve_specifier(specifier, referrer, &self.root, &self.tsconfig)
                .map(|p| canonical(&p));
        self.resolve_cache.insert(key, resolved.clone());
        resolved
    }

    /// Parse a file into the registry (if not present) and return its record.
    ///
    /// Returns `None` for unreadable files and for re-entrant loads of a
    /// module that is still being built (re-export cycles).
    pub fn load_module(&mut self, path: &Path) -> Option<&ModuleRecord> {
        let canon = canonical(path);
        if self.loading.contains(&canon) {
            return None;
        }
        if !self.modules.contains_key(&canon) {
            let source = match fs::read_to_string(&canon) {
                Ok(s) => s,
                Err(err) => {
                    crate::warn(&format!("cannot read {}: {}", canon.display(), err));
                    return None;
                }
            };
            self.loading.insert(canon.clone());
            let snapshot = ast_ts::build_snapshot(&canon, &source, self);
            self.loading.remove(&canon);
            self.modules.insert(
                canon.clone(),
                ModuleRecord {
                    path: canon.clone(),
                    source,
                    snapshot,
                },
            );
        }
        self.modules.get(&canon)
    }

    /// Register a module from supplied content, replacing any previous text.
    ///
    /// This is the "add or replace text of a file and rebuild" mutation: it
    /// lets callers snapshot a version of a file that differs from disk while
    /// peers still resolve from the filesystem.
    pub fn add_or_replace_module(&mut self, path: &Path, source: &str) -> &ModuleRecord {
        let canon = canonical(path);
        self.loading.insert(canon.clone());
        let snapshot = ast_ts::build_snapshot(&canon, source, self);
        self.loading.remove(&canon);
        self.modules.insert(
            canon.clone(),
            ModuleRecord {
                path: canon.clone(),
                source: source.to_string(),
                snapshot,
            },
        );
        self.modules.get(&canon).expect("just inserted")
    }

    pub fn get_module(&self, path: &Path) -> Option<&ModuleRecord> {
        self.modules.get(&canonical(path))
    }

    /// The analogue of `getExportsOfModule`: every exported name of the
    /// module at `path`, with star re-exports already expanded.
    ///
    /// Returns `None` when the module cannot be loaded, `Some(vec![])` when
    /// a cycle cuts the expansion short.
    pub fn exports_of_module(&mut self, path: &Path) -> Option<Vec<ModuleExport>> {
        let canon = canonical(path);
        if self.loading.contains(&canon) {
            return Some(Vec::new());
        }
        let record = self.load_module(&canon)?;
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for export in &record.snapshot.exports {
            // Dedup per side so a merged value+type pair survives.
            if seen.insert((export.name.clone(), export.is_runtime())) {
                out.push(ModuleExport {
                    name: export.name.clone(),
                    is_type_only: export.is_type_only,
                    kind: export.kind.clone(),
                });
            }
        }
        Some(out)
    }

    /// Look up a cached API shape by export identity.
    pub fn cached_shape(&self, identity: &str) -> Option<&Option<ApiShape>> {
        self.shape_cache.get(identity)
    }

    /// Store a shape result. The cache is append-only within a run.
    pub fn cache_shape(&mut self, identity: String, shape: Option<ApiShape>) {
        self.shape_cache.entry(identity).or_insert(shape);
    }
}

/// Canonicalize with a fallback for paths that do not exist (yet).
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
