//! Fuzzy matching of spoken names against favorite titles.
//!
//! The score is the Ratcliff/Obershelp ratio: find the longest common
//! contiguous block, repeat on the pieces left and right of it, and compare
//! the matched length `M` with the total length, `2 * M / (len(a) + len(b))`.
//! Comparison is on Unicode scalar values, case-sensitive, without any
//! normalization.

/// Similarity of `a` and `b` in `0.0..=1.0`; two empty strings are identical
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(&a, &b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    2.0 * matched as f64 / total as f64
}

/// Longest block common to `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, size)`
///
/// Among equally long blocks the one starting earliest in `a` wins, then the
/// one starting earliest in `b`.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // lengths[x] is the length of the match ending at a[i - 1], b[blo + x - 1]
    let mut lengths = vec![0usize; bhi - blo + 1];
    for i in alo..ahi {
        let mut next = vec![0usize; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] != b[j] {
                continue;
            }
            let size = lengths[j - blo] + 1;
            next[j - blo + 1] = size;
            if size > best.2 {
                best = (i + 1 - size, j + 1 - size, size);
            }
        }
        lengths = next;
    }
    best
}

/// Index of the candidate most similar to `needle`
///
/// An equal score replaces the current best, so ties go to the latest
/// candidate. `None` when there are no candidates.
pub fn best_match<'a>(needle: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let score = ratio(needle, candidate);
        if best.map_or(true, |(_, best_score)| score >= best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}
