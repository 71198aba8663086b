//! Fuzzy string similarity on a 0–100 scale.
//!
//! The scorers follow the fuzzywuzzy family: `ratio` is the indel
//! similarity, `token_sort_ratio` / `token_set_ratio` are insensitive to
//! word order and duplicated words, and `weighted_ratio` (WRatio) picks the
//! best of them with the usual length-dependent weights. All scorers work on
//! `char`s, so CJK text is compared character by character.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Weight applied to token-based scores inside `weighted_ratio`.
const UNBASE_SCALE: f64 = 0.95;

fn non_word_regex() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"\W").expect("non-word pattern is valid"))
}

/// Default processor: non-word characters become spaces, then lower-case and trim.
pub fn full_process(s: &str) -> String {
    non_word_regex()
        .replace_all(s, " ")
        .to_lowercase()
        .trim()
        .to_string()
}

/// Rounds half to even, matching Python's `round`.
fn intr(score: f64) -> u32 {
    score.round_ties_even() as u32
}

/// Length of the longest common subsequence.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Unrounded indel similarity in `[0, 1]`.
fn similarity(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (2 * lcs_len(a, b)) as f64 / total as f64
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Indel similarity, 0 when either side is empty.
pub fn ratio(s1: &str, s2: &str) -> u32 {
    let (a, b) = (chars(s1), chars(s2));
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    intr(100.0 * similarity(&a, &b))
}

/// Best `ratio` of the shorter string against every equal-length window of the longer.
pub fn partial_ratio(s1: &str, s2: &str) -> u32 {
    let (a, b) = (chars(s1), chars(s2));
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut best = 0.0f64;
    for window in longer.windows(shorter.len()) {
        let r = similarity(&shorter, window);
        if r > 0.995 {
            return 100;
        }
        best = best.max(r);
    }
    intr(100.0 * best)
}

fn sorted_tokens(processed: &str) -> String {
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort(s1: &str, s2: &str, partial: bool) -> u32 {
    let sorted1 = sorted_tokens(&full_process(s1));
    let sorted2 = sorted_tokens(&full_process(s2));
    if partial {
        partial_ratio(&sorted1, &sorted2)
    } else {
        ratio(&sorted1, &sorted2)
    }
}

/// `ratio` after sorting the words of both strings.
pub fn token_sort_ratio(s1: &str, s2: &str) -> u32 {
    token_sort(s1, s2, false)
}

fn token_set(s1: &str, s2: &str, partial: bool) -> u32 {
    let p1 = full_process(s1);
    let p2 = full_process(s2);
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let tokens1: BTreeSet<&str> = p1.split_whitespace().collect();
    let tokens2: BTreeSet<&str> = p2.split_whitespace().collect();

    let join = |set: Vec<&&str>| set.into_iter().copied().collect::<Vec<_>>().join(" ");
    let sect = join(tokens1.intersection(&tokens2).collect());
    let diff1to2 = join(tokens1.difference(&tokens2).collect());
    let diff2to1 = join(tokens2.difference(&tokens1).collect());

    let combined_1to2 = format!("{} {}", sect, diff1to2).trim().to_string();
    let combined_2to1 = format!("{} {}", sect, diff2to1).trim().to_string();

    let score = |x: &str, y: &str| {
        if partial {
            partial_ratio(x, y)
        } else {
            ratio(x, y)
        }
    };

    score(&sect, &combined_1to2)
        .max(score(&sect, &combined_2to1))
        .max(score(&combined_1to2, &combined_2to1))
}

/// Compares the shared words against each side's full word set.
pub fn token_set_ratio(s1: &str, s2: &str) -> u32 {
    token_set(s1, s2, false)
}

/// WRatio: the best of the plain, partial and token scores, weighted by how
/// different the two lengths are.
pub fn weighted_ratio(s1: &str, s2: &str) -> u32 {
    let p1 = full_process(s1);
    let p2 = full_process(s2);
    let (len1, len2) = (p1.chars().count(), p2.chars().count());
    if len1 == 0 || len2 == 0 {
        return 0;
    }

    let base = ratio(&p1, &p2) as f64;
    let len_ratio = len1.max(len2) as f64 / len1.min(len2) as f64;

    if len_ratio < 1.5 {
        let tsor = token_sort(&p1, &p2, false) as f64 * UNBASE_SCALE;
        let tser = token_set(&p1, &p2, false) as f64 * UNBASE_SCALE;
        return intr(base.max(tsor).max(tser));
    }

    let partial_scale = if len_ratio > 8.0 { 0.6 } else { 0.9 };
    let partial = partial_ratio(&p1, &p2) as f64 * partial_scale;
    let ptsor = token_sort(&p1, &p2, true) as f64 * UNBASE_SCALE * partial_scale;
    let ptser = token_set(&p1, &p2, true) as f64 * UNBASE_SCALE * partial_scale;
    intr(base.max(partial).max(ptsor).max(ptser))
}
