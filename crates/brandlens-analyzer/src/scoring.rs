//! Visibility scoring.
//!
//! Two strategies feed the same [`visibility_score`] formula:
//!
//! - [`count_based_scores`] measures how many brands compete for each query
//!   (multi-call workflow).
//! - [`rank_weighted_scores`] measures where the site itself shows up in the
//!   top-5 results (single-call workflow).

use brandlens_core::{CategoryCounts, FinalAnalysis, IntentCategory, PerQueryResult, ScoreSet};

/// Brands per query that saturate a category's count-based score.
pub const MAX_BRANDS_PER_QUERY: f64 = 10.0;

/// Weight of a mention at each 1-based rank in the top-5.
pub const RANK_WEIGHTS: [f64; 5] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Weighted overall score: `0.5·direct + 0.3·intermediate + 0.2·indirect`.
#[must_use]
pub fn visibility_score(direct: f64, intermediate: f64, indirect: f64) -> f64 {
    IntentCategory::Direct.visibility_weight() * direct
        + IntentCategory::Intermediate.visibility_weight() * intermediate
        + IntentCategory::Indirect.visibility_weight() * indirect
}

/// Assemble a [`ScoreSet`] from category scores, deriving the overall score.
#[must_use]
pub fn score_set(direct: f64, intermediate: f64, indirect: f64) -> ScoreSet {
    ScoreSet {
        direct,
        intermediate,
        indirect,
        visibility: visibility_score(direct, intermediate, indirect),
    }
}

/// Weight of a mention at `rank`. Ranks outside 1..=5 weigh nothing.
#[must_use]
pub fn rank_weight(rank: u8) -> f64 {
    match rank {
        1..=5 => RANK_WEIGHTS[usize::from(rank - 1)],
        _ => 0.0,
    }
}

/// Count-based scores: brands found per category against
/// `MAX_BRANDS_PER_QUERY × requested query count`.
///
/// Not clamped; more than ten brands per query scores above 100.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn count_based_scores(analysis: &FinalAnalysis, counts: &CategoryCounts) -> ScoreSet {
    let category = |c: IntentCategory| {
        let brands = analysis.group(c).brand_count() as f64;
        let denominator = (MAX_BRANDS_PER_QUERY * counts.get(c) as f64).max(1.0);
        brands / denominator * 100.0
    };

    score_set(
        category(IntentCategory::Direct),
        category(IntentCategory::Intermediate),
        category(IntentCategory::Indirect),
    )
}

/// Rank-weighted scores: average per-query mention weight in each category.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rank_weighted_scores(results: &[PerQueryResult]) -> ScoreSet {
    let category = |c: IntentCategory| {
        let (sum, queries) = results
            .iter()
            .filter(|r| r.category == c)
            .fold((0.0_f64, 0usize), |(sum, n), r| {
                let weight: f64 = r
                    .results
                    .iter()
                    .filter(|hit| hit.is_mention)
                    .map(|hit| rank_weight(hit.rank))
                    .sum();
                (sum + weight, n + 1)
            });
        sum / queries.max(1) as f64 * 100.0
    };

    score_set(
        category(IntentCategory::Direct),
        category(IntentCategory::Intermediate),
        category(IntentCategory::Indirect),
    )
}
