//! Momentum pattern registry.
//!
//! Each signal category owns an ordered list of case-insensitive rules. The
//! registry is compiled once per process and is read-only afterwards. Rule
//! source text is kept verbatim because confidence scoring is derived from
//! its length (see `scoring::confidence_for_source`).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Closed set of momentum event types, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Hiring,
    Spinout,
    FundLaunch,
    FundClose,
    Deal,
    Expansion,
    PersonnelChange,
    Partnership,
    Award,
}

impl SignalCategory {
    /// All categories in the order the detector evaluates them.
    pub const ALL: [SignalCategory; 9] = [
        SignalCategory::Hiring,
        SignalCategory::Spinout,
        SignalCategory::FundLaunch,
        SignalCategory::FundClose,
        SignalCategory::Deal,
        SignalCategory::Expansion,
        SignalCategory::PersonnelChange,
        SignalCategory::Partnership,
        SignalCategory::Award,
    ];

    /// String label for SQL storage and the query surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Hiring => "hiring",
            SignalCategory::Spinout => "spinout",
            SignalCategory::FundLaunch => "fund_launch",
            SignalCategory::FundClose => "fund_close",
            SignalCategory::Deal => "deal",
            SignalCategory::Expansion => "expansion",
            SignalCategory::PersonnelChange => "personnel_change",
            SignalCategory::Partnership => "partnership",
            SignalCategory::Award => "award",
        }
    }

    /// Rule sources for this category, in evaluation order.
    fn rule_sources(&self) -> &'static [&'static str] {
        match self {
            SignalCategory::Hiring => HIRING,
            SignalCategory::Spinout => SPINOUT,
            SignalCategory::FundLaunch => FUND_LAUNCH,
            SignalCategory::FundClose => FUND_CLOSE,
            SignalCategory::Deal => DEAL,
            SignalCategory::Expansion => EXPANSION,
            SignalCategory::PersonnelChange => PERSONNEL_CHANGE,
            SignalCategory::Partnership => PARTNERSHIP,
            SignalCategory::Award => AWARD,
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name one of the nine categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for SignalCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Rule sources
// ---------------------------------------------------------------------------

const HIRING: &[&str] = &[
    r"(?:hired?|hires?|appointe?d?|recruite?d?|joins?|joined|bringing on|welcomes?)\s+(?:as\s+)?(?:new\s+)?(?:senior|managing|executive|partner|director|head|chief|vp|president|ceo|cfo|coo|cio)",
    r"(?:senior|managing|executive|partner|director|head)\s+(?:from|formerly\s+(?:of|at|with))",
    r"(?:expands?\s+team|builds?\s+out|strengthens?\s+(?:team|leadership))",
    r"(?:new\s+(?:hire|hires|appointment|appointments))",
];

const SPINOUT: &[&str] = &[
    r"(?:launches?|launched|launching|spins?\s+out|spin-out|spinout|breaks?\s+away|leaves?\s+to\s+(?:form|start|launch))",
    r"(?:former\s+(?:partner|director|head|md))\s+(?:launches?|starts?|forms?)",
    r"(?:new\s+(?:firm|shop|boutique))\s+(?:launched|formed|started)",
];

const FUND_LAUNCH: &[&str] = &[
    r"(?:launches?|launched|launching|raising|raises?|debut|debuts?)\s+(?:new\s+)?(?:fund|vehicle|strategy|offering)",
    r"(?:fund\s+(?:I|II|III|IV|V|VI|VII|VIII|IX|X|\d+))",
    r"(?:first\s+(?:close|closing)|initial\s+close)",
    r"(?:opens?\s+for\s+(?:investment|subscriptions))",
];

const FUND_CLOSE: &[&str] = &[
    r"(?:closes?|closed|closing|final\s+close|hard\s+cap)",
    r"(?:above\s+target|exceeded\s+target|oversubscribed)",
    r"(?:raised\s+\$?\d+(?:\.\d+)?\s*(?:billion|million|bn|mm|m|b))",
];

const DEAL: &[&str] = &[
    r"(?:acquires?|acquired|acquisition|acquir)",
    r"(?:invests?\s+in|invested|investment\s+in|backing|backs?)",
    r"(?:exits?|exited|exit\s+from|sells?|sold|divestiture)",
    r"(?:merger|merges?\s+with)",
    r"(?:buyout|buy-out|lbo|mbo)",
];

const EXPANSION: &[&str] = &[
    r"(?:opens?\s+(?:new\s+)?(?:office|offices|branch|presence))",
    r"(?:expands?\s+(?:to|into|in)|expansion\s+(?:to|into|in))",
    r"(?:enters?\s+(?:new\s+)?(?:market|region|geography))",
];

const PERSONNEL_CHANGE: &[&str] = &[
    r"(?:departs?|departed|departure|leaves?|left|stepping\s+down|retires?|retired)",
    r"(?:promotes?|promoted|promotion|elevates?|elevated)",
    r"(?:transition|succession|new\s+leadership)",
];

const PARTNERSHIP: &[&str] = &[
    r"(?:partners?\s+with|partnership|teams?\s+up|collaborates?|collaboration|alliance)",
    r"(?:joint\s+venture|jv)",
    r"(?:strategic\s+(?:partnership|alliance|relationship))",
];

const AWARD: &[&str] = &[
    r"(?:wins?|won|awarded|receives?|received|named|recognized)",
    r"(?:best|top|leading|premier)\s+(?:in\s+class|performer|placement\s+agent)",
];

/// Words that mark a document as a high-strength signal source.
pub const HIGH_STRENGTH_INDICATORS: &[&str] = &[
    "major",
    "significant",
    "landmark",
    "record",
    "billion",
    "largest",
    "unprecedented",
    "exclusive",
];

/// Words that mark a document as a low-strength signal source.
pub const LOW_STRENGTH_INDICATORS: &[&str] = &["small", "minor", "modest"];

// ---------------------------------------------------------------------------
// Compiled registry
// ---------------------------------------------------------------------------

/// One compiled rule. `index` is its position within the category's list.
#[derive(Debug)]
pub struct PatternRule {
    pub category: SignalCategory,
    pub index: usize,
    pub source: &'static str,
    regex: Regex,
}

impl PatternRule {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// The process-wide rule table, grouped by category in registry order.
pub struct PatternRegistry {
    groups: Vec<(SignalCategory, Vec<PatternRule>)>,
}

impl PatternRegistry {
    fn compile() -> Self {
        let groups = SignalCategory::ALL
            .iter()
            .map(|&category| {
                let rules = category
                    .rule_sources()
                    .iter()
                    .enumerate()
                    .map(|(index, &source)| PatternRule {
                        category,
                        index,
                        source,
                        regex: RegexBuilder::new(&ascii_pattern(source))
                            .case_insensitive(true)
                            .unicode(false)
                            .build()
                            .expect("static momentum pattern must compile"),
                    })
                    .collect();
                (category, rules)
            })
            .collect();
        Self { groups }
    }

    /// Categories paired with their ordered rules.
    pub fn groups(&self) -> impl Iterator<Item = (SignalCategory, &[PatternRule])> {
        self.groups.iter().map(|(c, rules)| (*c, rules.as_slice()))
    }

    /// Ordered rules for a single category.
    pub fn rules_for(&self, category: SignalCategory) -> &[PatternRule] {
        self.groups
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|(_, rules)| rules.len()).sum()
    }
}

/// Rewrite a rule source for compilation with Unicode mode off.
///
/// Digit and word classes and case folding stay ASCII-only (`\d` is `[0-9]`,
/// `ſ` never folds to `s`). Whitespace still covers Unicode spaces such as
/// U+00A0. The unmodified source remains the input to confidence scoring.
fn ascii_pattern(source: &str) -> String {
    source.replace(r"\s", r"(?u:\s)")
}

/// Shared registry, compiled on first use.
pub fn registry() -> &'static PatternRegistry {
    static REGISTRY: OnceLock<PatternRegistry> = OnceLock::new();
    REGISTRY.get_or_init(PatternRegistry::compile)
}
