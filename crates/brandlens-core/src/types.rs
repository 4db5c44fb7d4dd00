use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

// ---------------------------------------------------------------------------
// Site input
// ---------------------------------------------------------------------------

/// The described web site an analysis runs against. Immutable input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: String,
}

impl SiteProfile {
    /// Render the site as the plain-text context block embedded in prompts.
    #[must_use]
    pub fn context_block(&self) -> String {
        format!(
            "Site:\n- Name: {}\n- URL: {}\n- Description: {}\n- Language: {}\n",
            self.name, self.url, self.description, self.language
        )
    }
}

/// A site as stored for an owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: i64,
    pub owner_id: i64,
    pub profile: SiteProfile,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Intent categories
// ---------------------------------------------------------------------------

/// Tier of search intent relative to brand awareness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentCategory {
    /// Brand-aware queries; must contain a brand token.
    Direct,
    /// Task/topic queries; must not contain a brand token.
    Intermediate,
    /// Upstream-intent queries a prospect runs before knowing the brand.
    Indirect,
}

impl IntentCategory {
    /// Fixed processing and reporting order.
    pub const ALL: [IntentCategory; 3] = [
        IntentCategory::Direct,
        IntentCategory::Intermediate,
        IntentCategory::Indirect,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IntentCategory::Direct => "direct",
            IntentCategory::Intermediate => "intermediate",
            IntentCategory::Indirect => "indirect",
        }
    }

    /// Weight of this category in the overall visibility score.
    #[must_use]
    pub fn visibility_weight(self) -> f64 {
        match self {
            IntentCategory::Direct => 0.5,
            IntentCategory::Intermediate => 0.3,
            IntentCategory::Indirect => 0.2,
        }
    }
}

impl std::fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(IntentCategory::Direct),
            "intermediate" => Ok(IntentCategory::Intermediate),
            "indirect" => Ok(IntentCategory::Indirect),
            other => Err(CoreError::InvalidCategory(other.to_string())),
        }
    }
}

/// Requested number of queries per category.
///
/// Values come straight from the caller and may be non-positive; use
/// [`CategoryCounts::normalized`] before starting a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub direct: i64,
    pub intermediate: i64,
    pub indirect: i64,
}

impl Default for CategoryCounts {
    fn default() -> Self {
        Self {
            direct: 1,
            intermediate: 1,
            indirect: 1,
        }
    }
}

impl CategoryCounts {
    /// Floors every count to a minimum of 1.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            direct: self.direct.max(1),
            intermediate: self.intermediate.max(1),
            indirect: self.indirect.max(1),
        }
    }

    #[must_use]
    pub fn get(&self, category: IntentCategory) -> i64 {
        match category {
            IntentCategory::Direct => self.direct,
            IntentCategory::Intermediate => self.intermediate,
            IntentCategory::Indirect => self.indirect,
        }
    }
}

// ---------------------------------------------------------------------------
// Multi-call artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub text: String,
    pub category: IntentCategory,
    pub language: String,
}

/// Free-text research findings for one query. Never persisted.
#[derive(Debug, Clone)]
pub struct ResearchNote {
    pub query: String,
    pub text: String,
}

/// A brand surfaced for a query, with the places it was cited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandCitation {
    pub name: String,
    pub url: Option<String>,
    /// Urls or domains citing the brand. Empty means none were found.
    #[serde(default)]
    pub citations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBrandResult {
    pub query: String,
    pub brands: Vec<BrandCitation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub queries: Vec<QueryBrandResult>,
}

impl CategoryGroup {
    /// Total brand entities across every query in the group.
    #[must_use]
    pub fn brand_count(&self) -> usize {
        self.queries.iter().map(|q| q.brands.len()).sum()
    }
}

/// Terminal artifact of the multi-call workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnalysis {
    pub direct: CategoryGroup,
    pub intermediate: CategoryGroup,
    pub indirect: CategoryGroup,
}

impl FinalAnalysis {
    #[must_use]
    pub fn group(&self, category: IntentCategory) -> &CategoryGroup {
        match category {
            IntentCategory::Direct => &self.direct,
            IntentCategory::Intermediate => &self.intermediate,
            IntentCategory::Indirect => &self.indirect,
        }
    }

    pub fn group_mut(&mut self, category: IntentCategory) -> &mut CategoryGroup {
        match category {
            IntentCategory::Direct => &mut self.direct,
            IntentCategory::Intermediate => &mut self.intermediate,
            IntentCategory::Indirect => &mut self.indirect,
        }
    }

    /// Every distinct trimmed query string, in category order, first-seen first.
    #[must_use]
    pub fn all_queries(&self) -> Vec<String> {
        let texts = IntentCategory::ALL
            .iter()
            .flat_map(|c| self.group(*c).queries.iter().map(|q| q.query.as_str()));
        dedupe_trimmed(texts)
    }

    /// Distinct citation references across all brands, capped at `limit`.
    #[must_use]
    pub fn citations(&self, limit: usize) -> Vec<String> {
        let refs = IntentCategory::ALL.iter().flat_map(|c| {
            self.group(*c)
                .queries
                .iter()
                .flat_map(|q| q.brands.iter())
                .flat_map(|b| b.citations.iter().map(String::as_str))
        });
        let mut out = dedupe_trimmed(refs);
        out.truncate(limit);
        out
    }
}

/// Trim each string, drop blanks, and keep the first occurrence of each value.
#[must_use]
pub fn dedupe_trimmed<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Single-call artifacts
// ---------------------------------------------------------------------------

/// Why a search hit counts as a mention of the target site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionReason {
    Domain,
    BrandInText,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSearchHit {
    /// 1-based position in the top-5 results.
    pub rank: u8,
    pub title: String,
    pub url: String,
    pub domain: String,
    /// At most 180 characters.
    pub snippet: String,
    pub is_mention: bool,
    pub mention_reason: MentionReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerQueryResult {
    pub category: IntentCategory,
    pub query: String,
    pub results: Vec<RankedSearchHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySet {
    pub direct: Vec<String>,
    pub intermediate: Vec<String>,
    pub indirect: Vec<String>,
}

/// Normalized result of the single-call strict-schema workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleCallReport {
    pub site: SiteProfile,
    pub queries: QuerySet,
    pub per_query_results: Vec<PerQueryResult>,
    pub scores: ScoreSet,
    pub citations: Vec<String>,
    pub keywords: Vec<String>,
    /// Queries in fixed order: direct, intermediate, indirect.
    pub all_queries: Vec<String>,
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Scores and persisted records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub direct: f64,
    pub intermediate: f64,
    pub indirect: f64,
    pub visibility: f64,
}

impl ScoreSet {
    #[must_use]
    pub fn category(&self, category: IntentCategory) -> f64 {
        match category {
            IntentCategory::Direct => self.direct,
            IntentCategory::Intermediate => self.intermediate,
            IntentCategory::Indirect => self.indirect,
        }
    }

    /// True when all three category scores are exactly zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn categories_all_zero(&self) -> bool {
        self.direct == 0.0 && self.intermediate == 0.0 && self.indirect == 0.0
    }
}

/// Which execution strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStrategy {
    MultiCall,
    SingleCall,
}

impl AnalysisStrategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStrategy::MultiCall => "multi_call",
            AnalysisStrategy::SingleCall => "single_call",
        }
    }

    /// Maximum number of suggestions kept for this strategy.
    #[must_use]
    pub fn suggestion_limit(self) -> usize {
        match self {
            AnalysisStrategy::MultiCall => 10,
            AnalysisStrategy::SingleCall => 8,
        }
    }
}

impl std::fmt::Display for AnalysisStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multi_call" | "multi" => Ok(AnalysisStrategy::MultiCall),
            "single_call" | "single" => Ok(AnalysisStrategy::SingleCall),
            other => Err(CoreError::InvalidStrategy(other.to_string())),
        }
    }
}

/// A fully computed analysis, ready for its single write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysisRecord {
    pub site_id: i64,
    pub owner_id: i64,
    pub strategy: AnalysisStrategy,
    pub scores: ScoreSet,
    pub queries: Vec<String>,
    pub suggestions: Vec<String>,
    pub keywords: Vec<String>,
    pub citations: Vec<String>,
    /// Serialized [`FinalAnalysis`] or [`SingleCallReport`], per `strategy`.
    pub analysis: serde_json::Value,
}

/// A persisted analysis. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub public_id: Uuid,
    pub site_id: i64,
    pub owner_id: i64,
    pub strategy: AnalysisStrategy,
    pub scores: ScoreSet,
    pub queries: Vec<String>,
    pub suggestions: Vec<String>,
    pub keywords: Vec<String>,
    pub citations: Vec<String>,
    pub analysis: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
