use super::*;
use serde_json::json;

fn site() -> SiteProfile {
    SiteProfile {
        name: "Acme Tools".to_string(),
        url: "https://www.acme-tools.io".to_string(),
        description: "Hand tools for makers".to_string(),
        language: "en".to_string(),
    }
}

fn hit(rank: i64, domain: &str, is_mention: bool, reason: Option<&str>) -> serde_json::Value {
    json!({
        "rank": rank,
        "title": format!("Result {rank}"),
        "url": format!("https://{domain}/page"),
        "domain": domain,
        "snippet": "A neutral snippet",
        "is_mention": is_mention,
        "mention_reason": reason,
    })
}

fn payload(scores: serde_json::Value, per_query: serde_json::Value) -> String {
    json!({
        "site": {"name": "ignored", "url": "ignored", "description": "", "language": "en"},
        "queries": {
            "direct": ["acme tools review", "acme tools pricing"],
            "intermediate": ["best chisel sets"],
            "indirect": ["how to start woodworking"]
        },
        "per_query_results": per_query,
        "scores": scores,
        "citations": [" https://g2.com/acme ", "https://g2.com/acme", ""],
        "keywords_from_the_queries": ["Chisel", "chisel", "woodworking"],
        "all_of_the_queries_used": [],
        "suggestions": ["Publish a chisel buying guide."]
    })
    .to_string()
}

fn zero_scores() -> serde_json::Value {
    json!({
        "direct_query_score": 0,
        "intermediate_context_query_score": 0,
        "indirect_query_score": 0,
        "visibility_score": 0
    })
}

#[test]
fn keeps_service_scores_when_any_category_is_non_zero() {
    let scores = json!({
        "direct_query_score": 60,
        "intermediate_context_query_score": 0,
        "indirect_query_score": 0,
        "visibility_score": 31.5
    });
    let per_query = json!([{
        "type": "direct",
        "query": "acme tools review",
        "results": [hit(1, "acme-tools.io", true, Some("domain"))]
    }]);
    let report = parse_report(&payload(scores, per_query), &site()).unwrap();
    assert!((report.scores.direct - 60.0).abs() < 1e-9);
    assert!((report.scores.visibility - 31.5).abs() < 1e-9);
}

#[test]
fn recomputes_when_service_scores_are_all_zero() {
    let per_query = json!([
        {
            "type": "direct",
            "query": "acme tools review",
            "results": [hit(1, "acme-tools.io", true, Some("domain")), hit(2, "g2.com", false, None)]
        },
        {"type": "intermediate", "query": "best chisel sets", "results": [hit(1, "g2.com", false, None)]},
        {"type": "indirect", "query": "how to start woodworking", "results": []}
    ]);
    let report = parse_report(&payload(zero_scores(), per_query), &site()).unwrap();
    assert!((report.scores.direct - 100.0).abs() < 1e-9);
    assert!(report.scores.intermediate.abs() < f64::EPSILON);
    assert!((report.scores.visibility - 50.0).abs() < 1e-9);
}

#[test]
fn zero_scores_without_results_stay_zero() {
    let report = parse_report(&payload(zero_scores(), json!([])), &site()).unwrap();
    assert!(report.scores.categories_all_zero());
    assert!(report.scores.visibility.abs() < f64::EPSILON);
}

#[test]
fn out_of_range_service_scores_are_clamped() {
    let scores = json!({
        "direct_query_score": 250,
        "intermediate_context_query_score": -40,
        "indirect_query_score": 0,
        "visibility_score": 12345.6
    });
    let per_query = json!([{
        "type": "direct",
        "query": "acme tools review",
        "results": [hit(1, "acme-tools.io", true, Some("domain"))]
    }]);
    let report = parse_report(&payload(scores, per_query), &site()).unwrap();
    assert!((report.scores.direct - 100.0).abs() < 1e-9);
    assert!(report.scores.intermediate.abs() < f64::EPSILON);
    assert!(report.scores.indirect.abs() < f64::EPSILON);
    assert!((report.scores.visibility - 50.0).abs() < 1e-9);
}

#[test]
fn out_of_range_visibility_alone_is_derived() {
    let scores = json!({
        "direct_query_score": 40,
        "intermediate_context_query_score": 20,
        "indirect_query_score": 0,
        "visibility_score": 180
    });
    let report = parse_report(&payload(scores, json!([])), &site()).unwrap();
    assert!((report.scores.direct - 40.0).abs() < 1e-9);
    assert!((report.scores.visibility - 26.0).abs() < 1e-9);
}

#[test]
fn missing_visibility_is_derived_from_categories() {
    let scores = json!({"direct_query_score": 40, "intermediate_context_query_score": 20});
    let report = parse_report(&payload(scores, json!([])), &site()).unwrap();
    assert!((report.scores.visibility - 26.0).abs() < 1e-9);
}

#[test]
fn clamps_lists_and_derives_all_queries() {
    let report = parse_report(&payload(zero_scores(), json!([])), &site()).unwrap();
    assert_eq!(report.queries.direct, vec!["acme tools review"]);
    assert_eq!(
        report.all_queries,
        vec!["acme tools review", "best chisel sets", "how to start woodworking"]
    );
    assert_eq!(report.citations, vec!["https://g2.com/acme"]);
    assert_eq!(report.keywords, vec!["chisel", "woodworking"]);
    assert_eq!(report.suggestions, vec!["Publish a chisel buying guide."]);
    assert_eq!(report.site, site());
}

#[test]
fn enforces_hard_caps() {
    let many = |prefix: &str, n: usize| -> Vec<String> {
        (0..n).map(|i| format!("{prefix} {i}")).collect()
    };
    let text = json!({
        "citations": many("https://c.com/", 14),
        "keywords_from_the_queries": many("kw", 20),
        "all_of_the_queries_used": many("query", 5),
        "suggestions": many("Suggestion", 12),
    })
    .to_string();
    let report = parse_report(&text, &site()).unwrap();
    assert_eq!(report.citations.len(), 10);
    assert_eq!(report.keywords.len(), 15);
    assert_eq!(report.all_queries.len(), 3);
    assert_eq!(report.suggestions.len(), 8);
}

#[test]
fn hits_are_sorted_capped_and_trimmed() {
    let long_snippet = "x".repeat(300);
    let mut results: Vec<serde_json::Value> = (1..=6)
        .rev()
        .map(|rank| hit(rank, "example.com", false, None))
        .collect();
    results[0]["snippet"] = json!(long_snippet);
    let per_query = json!([{"type": "intermediate", "query": " q ", "results": results}]);

    let report = parse_report(&payload(zero_scores(), per_query), &site()).unwrap();
    let pq = &report.per_query_results[0];
    assert_eq!(pq.query, "q");
    let ranks: Vec<u8> = pq.results.iter().map(|h| h.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    assert!(pq.results.iter().all(|h| h.snippet.chars().count() <= 180));
}

#[test]
fn unknown_types_are_dropped_and_null_reason_is_none() {
    let per_query = json!([
        {"type": "navigational", "query": "acme login", "results": []},
        {"type": "Direct", "query": "acme tools review", "results": [hit(3, "example.com", false, None)]}
    ]);
    let report = parse_report(&payload(zero_scores(), per_query), &site()).unwrap();
    assert_eq!(report.per_query_results.len(), 1);
    assert_eq!(report.per_query_results[0].category, IntentCategory::Direct);
    let only = &report.per_query_results[0].results[0];
    assert!(!only.is_mention);
    assert_eq!(only.mention_reason, MentionReason::None);
}

#[test]
fn own_domain_counts_as_mention_even_when_unflagged() {
    let per_query = json!([{
        "type": "indirect",
        "query": "how to start woodworking",
        "results": [hit(2, "www.acme-tools.io", false, None)]
    }]);
    let report = parse_report(&payload(zero_scores(), per_query), &site()).unwrap();
    let only = &report.per_query_results[0].results[0];
    assert!(only.is_mention);
    assert_eq!(only.mention_reason, MentionReason::Domain);
    assert!((report.scores.indirect - 80.0).abs() < 1e-9);
}

#[test]
fn fenced_output_is_accepted() {
    let text = format!("```json\n{}\n```", payload(zero_scores(), json!([])));
    assert!(parse_report(&text, &site()).is_ok());
}

#[test]
fn prose_is_malformed_analysis() {
    let err = parse_report("I was unable to search the web.", &site()).unwrap_err();
    match err {
        AnalysisError::MalformedAnalysis { raw, .. } => {
            assert_eq!(raw, "I was unable to search the web.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn user_content_carries_site_context() {
    let content = user_content(&site());
    assert!(content.starts_with("Site:\n- Name: Acme Tools"));
    assert!(content.contains("visibility analysis"));
}
