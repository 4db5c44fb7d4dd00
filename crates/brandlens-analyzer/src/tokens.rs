//! Brand tokens, registrable domains, and mention detection.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use brandlens_core::{IntentCategory, MentionReason, SiteProfile};
use regex::Regex;
use reqwest::Url;

/// Split fragments shorter than this are too generic to count as a token.
const MIN_SPLIT_TOKEN_CHARS: usize = 3;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid separator regex"));

/// Host of `url` with a leading `www.` or `m.` removed, lowercased.
///
/// Bare hosts without a scheme are accepted. Returns `None` when no host can
/// be recovered.
#[must_use]
pub fn registrable_domain(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    let parsed = Url::parse(url)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| Url::parse(&format!("https://{url}")).ok())?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Lowercase fragments that identify the site's brand in free text.
///
/// Includes the full name, its words, the words joined with nothing, a hyphen
/// and a space, and the same variants of the domain root. "Acme Tools" on
/// `acme-tools.io` yields `acme`, `tools`, `acmetools`, `acme-tools` and
/// `acme tools`.
#[must_use]
pub fn brand_tokens(site: &SiteProfile) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();

    let name = site.name.trim().to_lowercase();
    if !name.is_empty() {
        tokens.insert(name.clone());
        add_variants(&mut tokens, &name);
    }

    if let Some(domain) = registrable_domain(&site.url) {
        let root = domain.split('.').next().unwrap_or_default();
        if !root.is_empty() {
            tokens.insert(root.to_string());
            add_variants(&mut tokens, root);
        }
    }

    tokens
}

fn add_variants(tokens: &mut BTreeSet<String>, phrase: &str) {
    let words: Vec<&str> = NON_ALNUM.split(phrase).filter(|w| !w.is_empty()).collect();

    for word in &words {
        if word.chars().count() >= MIN_SPLIT_TOKEN_CHARS {
            tokens.insert((*word).to_string());
        }
    }

    if words.len() > 1 {
        tokens.insert(words.concat());
        tokens.insert(words.join("-"));
        tokens.insert(words.join(" "));
    }
}

/// Whether `text` contains any brand token, case-insensitively.
#[must_use]
pub fn contains_brand_token(text: &str, tokens: &BTreeSet<String>) -> bool {
    let haystack = text.to_lowercase();
    tokens.iter().any(|t| haystack.contains(t.as_str()))
}

/// Direct queries must name the brand; the other tiers must not.
#[must_use]
pub fn satisfies_category(query: &str, category: IntentCategory, tokens: &BTreeSet<String>) -> bool {
    let branded = contains_brand_token(query, tokens);
    match category {
        IntentCategory::Direct => branded,
        IntentCategory::Intermediate | IntentCategory::Indirect => !branded,
    }
}

/// Classify a search hit against the target site.
///
/// A hit on the site's own registrable domain wins over a brand token in
/// the title or snippet.
#[must_use]
pub fn detect_mention(
    hit_domain: &str,
    title: &str,
    snippet: &str,
    site_domain: Option<&str>,
    tokens: &BTreeSet<String>,
) -> MentionReason {
    if let Some(site_domain) = site_domain {
        if registrable_domain(hit_domain).as_deref() == Some(site_domain) {
            return MentionReason::Domain;
        }
    }
    if contains_brand_token(title, tokens) || contains_brand_token(snippet, tokens) {
        return MentionReason::BrandInText;
    }
    MentionReason::None
}
