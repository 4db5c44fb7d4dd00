use brandlens_core::{dedupe_trimmed, IntentCategory, ScoreSet};

#[test]
fn dedupe_trimmed_is_reachable_from_crate_root() {
    let out = dedupe_trimmed(["  acme ", "", "acme", "globex", "   ", "globex "]);
    assert_eq!(out, vec!["acme", "globex"]);
}

#[test]
fn score_set_reads_each_category() {
    let scores = ScoreSet {
        direct: 80.0,
        intermediate: 40.0,
        indirect: 10.0,
        visibility: 52.0,
    };
    let by_category: Vec<f64> = IntentCategory::ALL
        .iter()
        .map(|c| scores.category(*c))
        .collect();
    assert_eq!(by_category, vec![80.0, 40.0, 10.0]);
}
