//! The closed breaking-change rule catalog.
//!
//! Every finding the formatter emits carries an identifier from this table.
//! The table also declares per-rule priority (lower number wins inside a
//! `(file, symbol)` group), the heuristic subset that gets the JavaScript
//! disclaimer suffix, and baseline severities. TypeScript rules flip to
//! `info` when the affected symbol is not exported; that policy lives in the
//! diff engine, not here.

use crate::types::Severity;

/// Priority assigned to rules without an explicit table entry.
pub const DEFAULT_PRIORITY: u32 = 50;

/// Literal suffix appended to heuristic findings whose message does not
/// already hedge.
pub const HEURISTIC_DISCLAIMER: &str = " (JavaScript heuristic - may miss runtime changes)";

/// Messages containing one of these already hedge; no disclaimer appended.
pub const HEDGE_WORDS: &[&str] = &["likely", "potential", "may miss"];

/// Heuristic rules exempt from the disclaimer regardless of wording.
pub const DISCLAIMER_DENYLIST: &[&str] = &["JSAPI-MOD-003"];

/// One catalog entry.
#[derive(Clone, Copy, Debug)]
pub struct RuleInfo {
    pub id: &'static str,
    /// Descriptive alias used by the priority table and older reports.
    pub alias: &'static str,
    pub severity: Severity,
    pub priority: u32,
    pub heuristic: bool,
}

/// The catalog. Closed: the formatter never invents identifiers outside it.
pub static RULES: &[RuleInfo] = &[
    // Functions (TypeScript)
    RuleInfo { id: "TSAPI-FN-001", alias: "FN-OPTIONAL-TO-REQUIRED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-FN-002", alias: "FN-PARAM-REMOVED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-FN-003", alias: "FN-PARAM-TYPE-CHANGED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-FN-004", alias: "FN-RETURN-TYPE-CHANGED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-FN-007", alias: "FN-OVERLOADS-CHANGED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    // Classes (TypeScript)
    RuleInfo { id: "TSAPI-CLS-001", alias: "CLS_METHOD_REMOVED", severity: Severity::Breaking, priority: 10, heuristic: false },
    RuleInfo { id: "TSAPI-CLS-002", alias: "CLS_METHOD_SIGNATURE_CHANGED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-CLS-003", alias: "CLS_REMOVED", severity: Severity::Breaking, priority: 20, heuristic: false },
    RuleInfo { id: "TSAPI-CLS-004", alias: "CLS_PROPERTY_REMOVED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    // Interfaces (TypeScript)
    RuleInfo { id: "TSAPI-IF-001", alias: "IF-PROPERTY-REMOVED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-IF-002", alias: "IF-OPTIONAL-TO-REQUIRED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-IF-003", alias: "IF-PROPERTY-TYPE-CHANGED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    // Type aliases (TypeScript)
    RuleInfo { id: "TSAPI-TYPE-001", alias: "TYPE-PROPERTY-REMOVED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-TYPE-002", alias: "TYPE-TEXT-CHANGED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-TYPE-003", alias: "TYPE-OPTIONAL-TO-REQUIRED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "TSAPI-TYPE-004", alias: "TYPE-PROPERTY-TYPE-CHANGED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    // Enums
    RuleInfo { id: "ENUM_REMOVED", alias: "ENUM_REMOVED", severity: Severity::Breaking, priority: 20, heuristic: false },
    RuleInfo { id: "ENUM_MEMBER_REMOVED", alias: "ENUM_MEMBER_REMOVED", severity: Severity::Breaking, priority: DEFAULT_PRIORITY, heuristic: false },
    // Exports (TypeScript)
    RuleInfo { id: "TSAPI-EXP-001", alias: "EXPORT-REMOVED", severity: Severity::Breaking, priority: 101, heuristic: false },
    RuleInfo { id: "TSAPI-EXP-002", alias: "EXPORT-TYPE-CHANGED", severity: Severity::Breaking, priority: 7, heuristic: false },
    // Exports (JavaScript surface)
    RuleInfo { id: "JSAPI-EXP-001", alias: "JSAPI-EXPORT-REMOVED", severity: Severity::Breaking, priority: 100, heuristic: false },
    RuleInfo { id: "JSAPI-EXP-002", alias: "JSAPI-EXPORT-ADDED", severity: Severity::Info, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "JSAPI-EXP-003", alias: "JSAPI-DEFAULT-REMOVED", severity: Severity::Breaking, priority: 1, heuristic: false },
    RuleInfo { id: "JSAPI-EXP-004", alias: "JSAPI-EXPORT-STAR-REMOVED", severity: Severity::Breaking, priority: 2, heuristic: false },
    RuleInfo { id: "JSAPI-EXP-005", alias: "JSAPI-EXPORT-ALIAS-CHANGED", severity: Severity::Breaking, priority: 5, heuristic: false },
    RuleInfo { id: "JSAPI-EXP-006", alias: "JSAPI-NAMED-TO-DEFAULT-EXPORT", severity: Severity::Breaking, priority: 8, heuristic: false },
    RuleInfo { id: "JSAPI-EXP-007", alias: "JSAPI-DEFAULT-TO-NAMED-EXPORT", severity: Severity::Breaking, priority: 8, heuristic: false },
    RuleInfo { id: "JSAPI-EXP-008", alias: "JSAPI-BARREL-EXPORT-REMOVED", severity: Severity::Breaking, priority: 4, heuristic: false },
    // CommonJS
    RuleInfo { id: "JSAPI-CJS-001", alias: "JSAPI-CJS-EXPORT-REMOVED", severity: Severity::Breaking, priority: 3, heuristic: false },
    RuleInfo { id: "JSAPI-CJS-002", alias: "JSAPI-DEFAULT-KIND-CHANGED", severity: Severity::Breaking, priority: 6, heuristic: false },
    // Functions/classes (JavaScript, structural only)
    RuleInfo { id: "JSAPI-FN-001", alias: "JSAPI-FN-PARAM-COUNT-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: true },
    RuleInfo { id: "JSAPI-FN-002", alias: "JSAPI-FN-PARAMS-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: true },
    RuleInfo { id: "JSAPI-FN-003", alias: "JSAPI-FN-ASYNC-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: true },
    RuleInfo { id: "JSAPI-CLS-002", alias: "JSAPI-CLS-MEMBER-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: true },
    RuleInfo { id: "JSAPI-CLS-003", alias: "JSAPI-CLS-HIERARCHY-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: true },
    // Module system / manifest
    RuleInfo { id: "JSAPI-MOD-001", alias: "JSAPI-MODULE-SYSTEM-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: true },
    RuleInfo { id: "JSAPI-MOD-002", alias: "JSAPI-PACKAGE-CHANGED", severity: Severity::Breaking, priority: 20, heuristic: false },
    RuleInfo { id: "JSAPI-MOD-003", alias: "JSAPI-IMPORT-SPECIFIER-CHANGED", severity: Severity::Info, priority: 30, heuristic: true },
    // JSX
    RuleInfo { id: "JSAPI-JSX-001", alias: "JSAPI-COMPONENT-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: true },
    // Diff-level bookkeeping
    RuleInfo { id: "EXPORT-ADDED", alias: "EXPORT-ADDED", severity: Severity::Info, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "EXPORT-RENAMED", alias: "EXPORT-RENAMED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "SYMBOL-REMOVED", alias: "SYMBOL-REMOVED", severity: Severity::Info, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "SYMBOL-ADDED", alias: "SYMBOL-ADDED", severity: Severity::Info, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "SIGNATURE-CHANGED", alias: "SIGNATURE-CHANGED", severity: Severity::Warning, priority: DEFAULT_PRIORITY, heuristic: false },
    RuleInfo { id: "ANALYZER-INVARIANT", alias: "ANALYZER-INVARIANT-VIOLATED", severity: Severity::Info, priority: DEFAULT_PRIORITY, heuristic: false },
];

pub fn lookup(rule_id: &str) -> Option<&'static RuleInfo> {
    RULES.iter().find(|r| r.id == rule_id || r.alias == rule_id)
}

/// Priority for deduplication; unknown rules get [`DEFAULT_PRIORITY`].
pub fn priority(rule_id: &str) -> u32 {
    lookup(rule_id).map(|r| r.priority).unwrap_or(DEFAULT_PRIORITY)
}

/// Baseline severity for a rule.
pub fn base_severity(rule_id: &str) -> Severity {
    lookup(rule_id)
        .map(|r| r.severity)
        .unwrap_or(Severity::Warning)
}

/// Membership in the declared heuristic table (not derived from severity).
pub fn is_heuristic(rule_id: &str) -> bool {
    lookup(rule_id).map(|r| r.heuristic).unwrap_or(false)
}

/// Whether a heuristic finding's message should get the disclaimer suffix.
pub fn needs_disclaimer(rule_id: &str, message: &str) -> bool {
    if !is_heuristic(rule_id) {
        return false;
    }
    if DISCLAIMER_DENYLIST.contains(&rule_id) {
        return false;
    }
    let lower = message.to_lowercase();
    !HEDGE_WORDS.iter().any(|w| lower.contains(w))
}
