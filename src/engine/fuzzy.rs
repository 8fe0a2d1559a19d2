//! Free-text title resolution.
//!
//! Scores are the Ratcliff/Obershelp "gestalt" ratio `2 * M / (|a| + |b|)`,
//! where `M` is the number of characters covered by the recursively found
//! longest common blocks. Comparison is case-insensitive and works on
//! Unicode scalar values.

use std::collections::HashMap;

/// Default minimum score for a title to count as a match.
pub const DEFAULT_CUTOFF: f64 = 0.3;

/// Queries at least this long have their very frequent characters ignored
/// when seeding block matches.
const POPULAR_MIN_LEN: usize = 200;

/// A query prepared for repeated comparison against candidate titles.
pub struct TitleMatcher {
    query: Vec<char>,
    positions: HashMap<char, Vec<usize>>,
    counts: HashMap<char, usize>,
}

impl TitleMatcher {
    pub fn new(query: &str) -> Self {
        let query: Vec<char> = query.to_lowercase().chars().collect();

        let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
        let mut counts: HashMap<char, usize> = HashMap::new();
        for (j, &c) in query.iter().enumerate() {
            positions.entry(c).or_default().push(j);
            *counts.entry(c).or_insert(0) += 1;
        }

        if query.len() >= POPULAR_MIN_LEN {
            let limit = query.len() / 100 + 1;
            positions.retain(|_, js| js.len() <= limit);
        }

        Self {
            query,
            positions,
            counts,
        }
    }

    #[cfg(test)]
    pub fn ratio(&self, candidate: &str) -> f64 {
        let candidate: Vec<char> = candidate.to_lowercase().chars().collect();
        self.ratio_chars(&candidate)
    }

    fn ratio_chars(&self, candidate: &[char]) -> f64 {
        score(self.matching_chars(candidate), candidate.len() + self.query.len())
    }

    /// Upper bound on `ratio` from the lengths alone.
    fn length_bound(&self, candidate: &[char]) -> f64 {
        let total = candidate.len() + self.query.len();
        score(candidate.len().min(self.query.len()), total)
    }

    /// Upper bound on `ratio` from the character multisets.
    fn multiset_bound(&self, candidate: &[char]) -> f64 {
        let mut available: HashMap<char, isize> = HashMap::new();
        let mut matches = 0;
        for c in candidate {
            let left = available
                .entry(*c)
                .or_insert_with(|| self.counts.get(c).copied().unwrap_or(0) as isize);
            if *left > 0 {
                matches += 1;
            }
            *left -= 1;
        }
        score(matches, candidate.len() + self.query.len())
    }

    /// Longest block `candidate[i..i+k] == query[j..j+k]` inside the given
    /// ranges. Earliest in `candidate` wins, then earliest in `query`.
    fn longest_match(
        &self,
        candidate: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        let mut run: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_run: HashMap<usize, usize> = HashMap::new();
            if let Some(js) = self.positions.get(&candidate[i]) {
                for &j in js {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            run = next_run;
        }

        // Popular characters were left out of the seeds; grow the block over them.
        while best_i > alo && best_j > blo && candidate[best_i - 1] == self.query[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && candidate[best_i + best_k] == self.query[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }

    fn matching_chars(&self, candidate: &[char]) -> usize {
        let mut total = 0;
        let mut pending = vec![(0, candidate.len(), 0, self.query.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(candidate, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

fn score(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}

/// Case-insensitive similarity of two strings in `[0, 1]`.
#[cfg(test)]
pub fn ratio(a: &str, b: &str) -> f64 {
    TitleMatcher::new(b).ratio(a)
}

/// Index of the title closest to `query`, if its score reaches `cutoff`.
/// Equal best scores resolve to the lowest index.
pub fn resolve<S: AsRef<str>>(query: &str, titles: &[S], cutoff: f64) -> Option<usize> {
    let matcher = TitleMatcher::new(query);
    let mut best: Option<(usize, f64)> = None;

    for (index, title) in titles.iter().enumerate() {
        let candidate: Vec<char> = title.as_ref().to_lowercase().chars().collect();
        let floor = best.map_or(cutoff, |(_, s)| s.max(cutoff));

        // Skip candidates that cannot reach the current floor.
        if matcher.length_bound(&candidate) < floor || matcher.multiset_bound(&candidate) < floor {
            continue;
        }

        let s = matcher.ratio_chars(&candidate);
        if s >= cutoff && best.map_or(true, |(_, b)| s > b) {
            best = Some((index, s));
        }
    }

    best.map(|(index, _)| index)
}
