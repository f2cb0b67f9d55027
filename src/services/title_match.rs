//! Fuzzy resolution of free-text queries to catalog titles.
//!
//! Both the query and every catalog title are normalized (lower-cased, trailing
//! `(YYYY)` stripped, punctuation removed, whitespace collapsed) and compared
//! with a longest-common-subsequence ratio. The catalog is scanned linearly;
//! at a few thousand titles no index is needed.

use crate::models::{Catalog, TitleMatch};

/// Normalizes a title for fuzzy comparison
///
/// `"Toy Story (1995)"` and `"toy-story"` both normalize to `"toy story"`.
pub fn normalize_title(title: &str) -> String {
    let stripped = strip_trailing_year(title.trim());
    let lowered = stripped.to_lowercase();

    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a trailing parenthesized four digit year such as `(1995)`
fn strip_trailing_year(title: &str) -> &str {
    let Some(head) = title.strip_suffix(')') else {
        return title;
    };
    let Some(open) = head.len().checked_sub(5) else {
        return title;
    };
    match head.get(open..) {
        Some(tail) if tail.starts_with('(') && tail[1..].chars().all(|c| c.is_ascii_digit()) => {
            head[..open].trim_end()
        }
        _ => title,
    }
}

/// Similarity ratio `2 * LCS / (len(a) + len(b))` over characters.
///
/// Symmetric, in `[0, 1]`, and `1.0` for identical strings (including two
/// empty strings).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Two-row dynamic programme over the shorter string
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];

    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            curr[j + 1] = if lc == sc {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Returns up to `k` catalog titles scoring at least `min_score` against `query`.
///
/// Results are sorted by score descending; equal scores keep catalog order.
pub fn resolve(catalog: &Catalog, query: &str, k: usize, min_score: f64) -> Vec<TitleMatch> {
    let normalized_query = normalize_title(query);
    if normalized_query.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<TitleMatch> = catalog
        .items()
        .iter()
        .filter_map(|item| {
            let score = similarity_ratio(&normalized_query, &normalize_title(&item.title));
            (score >= min_score).then(|| TitleMatch {
                item_id: item.item_id,
                title: item.title.clone(),
                score,
            })
        })
        .collect();

    // sort_by is stable, so ties stay in catalog order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);

    tracing::debug!(
        query = %query,
        matches = scored.len(),
        "Resolved title query"
    );

    scored
}
