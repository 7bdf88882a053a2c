//! Fuzzy substring search (bitap).
//!
//! Finds the best occurrence of a pattern near an expected location, scoring
//! candidates by edit errors and by distance from that location.

use std::collections::HashMap;

use tracing::trace;

use crate::config::{Config, MAX_MATCH_BITS};
use crate::error::{Error, Result};
use crate::text::{chars, find, rfind};

/// Best match of `pattern` in `text` near `loc`, or `None`.
pub fn main(text: &str, pattern: &str, loc: usize, cfg: &Config) -> Result<Option<usize>> {
    main_chars(&chars(text), &chars(pattern), loc, cfg)
}

pub(crate) fn main_chars(
    text: &[char],
    pattern: &[char],
    loc: usize,
    cfg: &Config,
) -> Result<Option<usize>> {
    let loc = loc.min(text.len());
    if text == pattern {
        // Shortcut (potentially not guaranteed by the algorithm).
        return Ok(Some(0));
    }
    if text.is_empty() {
        return Ok(None);
    }
    if text.get(loc..loc + pattern.len()) == Some(pattern) {
        return Ok(Some(loc));
    }
    bitap_chars(text, pattern, loc, cfg)
}

/// Bitap search for `pattern` in `text` near `loc`. Fails when the pattern is
/// longer than `cfg.match_max_bits`.
pub fn bitap(text: &str, pattern: &str, loc: usize, cfg: &Config) -> Result<Option<usize>> {
    bitap_chars(&chars(text), &chars(pattern), loc, cfg)
}

/// Bit of each pattern position, keyed by char. The first char of the
/// pattern owns the most significant bit.
pub fn alphabet(pattern: &str) -> HashMap<char, u128> {
    alphabet_chars(&chars(pattern))
}

fn alphabet_chars(pattern: &[char]) -> HashMap<char, u128> {
    let mut masks: HashMap<char, u128> = HashMap::with_capacity(pattern.len());
    for (i, &c) in pattern.iter().enumerate() {
        *masks.entry(c).or_insert(0) |= 1u128 << (pattern.len() - i - 1);
    }
    masks
}

/// Scores a candidate: lower is better, `0.0` is an exact match at the
/// expected location.
struct Scorer {
    pattern_len: usize,
    loc: usize,
    distance: usize,
}

impl Scorer {
    fn score(&self, errors: usize, x: usize) -> f64 {
        let accuracy = errors as f64 / self.pattern_len as f64;
        let proximity = self.loc.abs_diff(x);
        if self.distance == 0 {
            // Dodge divide by zero.
            return if proximity == 0 { accuracy } else { 1.0 };
        }
        accuracy + proximity as f64 / self.distance as f64
    }
}

fn bitap_chars(text: &[char], pattern: &[char], loc: usize, cfg: &Config) -> Result<Option<usize>> {
    let max = cfg.match_max_bits.min(MAX_MATCH_BITS);
    if pattern.len() > max {
        return Err(Error::PatternTooLong {
            len: pattern.len(),
            max,
        });
    }
    let loc = loc.min(text.len());
    if pattern.is_empty() {
        return Ok(Some(loc));
    }

    let masks = alphabet_chars(pattern);
    let scorer = Scorer {
        pattern_len: pattern.len(),
        loc,
        distance: cfg.match_distance,
    };

    let mut threshold = cfg.match_threshold;
    // Nearby exact matches tighten the threshold up front.
    if let Some(best) = find(text, pattern, loc) {
        threshold = threshold.min(scorer.score(0, best));
        if let Some(best) = rfind(text, pattern, loc + pattern.len()) {
            threshold = threshold.min(scorer.score(0, best));
        }
    }

    let match_mask = 1u128 << (pattern.len() - 1);
    let mut best_loc = None;
    let mut bin_max = pattern.len() + text.len();
    let mut last_rd: Vec<u128> = Vec::new();
    for d in 0..pattern.len() {
        // Binary search for how far from `loc` a match with `d` errors can
        // still stay under the threshold.
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if scorer.score(d, loc + bin_mid) <= threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        // Use the result from this iteration as the maximum for the next.
        bin_max = bin_mid;
        let mut start = (loc + 1).saturating_sub(bin_mid).max(1);
        let finish = (loc + bin_mid).min(text.len()) + pattern.len();

        let mut rd = vec![0u128; finish + 2];
        rd[finish + 1] = (1u128 << d) - 1;
        let mut j = finish;
        while j >= start {
            let char_match = text
                .get(j - 1)
                .and_then(|c| masks.get(c))
                .copied()
                .unwrap_or(0);
            rd[j] = if d == 0 {
                // Exact match pass.
                ((rd[j + 1] << 1) | 1) & char_match
            } else {
                // Subsequent passes: fuzzy match.
                let prev = |i: usize| last_rd.get(i).copied().unwrap_or(0);
                (((rd[j + 1] << 1) | 1) & char_match)
                    | (((prev(j + 1) | prev(j)) << 1) | 1)
                    | prev(j + 1)
            };
            if rd[j] & match_mask != 0 {
                let score = scorer.score(d, j - 1);
                if score <= threshold {
                    threshold = score;
                    best_loc = Some(j - 1);
                    if j - 1 > loc {
                        // When passing loc, don't exceed our current distance.
                        start = (2 * loc).saturating_sub(j - 1).max(1);
                    } else {
                        // Already passed loc, downhill from here on in.
                        break;
                    }
                }
            }
            j -= 1;
        }
        if scorer.score(d + 1, loc) > threshold {
            // No hope for a better match at greater error levels.
            break;
        }
        last_rd = rd;
    }
    trace!(?best_loc, threshold, "bitap");
    Ok(best_loc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_bits() {
        let a = alphabet("abc");
        assert_eq!(a[&'a'], 4);
        assert_eq!(a[&'b'], 2);
        assert_eq!(a[&'c'], 1);
        let a = alphabet("abcaba");
        assert_eq!(a[&'a'], 37);
        assert_eq!(a[&'b'], 18);
        assert_eq!(a[&'c'], 8);
    }

    #[test]
    fn shortcuts() {
        let cfg = Config::default();
        assert_eq!(main("abcdef", "abcdef", 1000, &cfg), Ok(Some(0)));
        assert_eq!(main("", "abcdef", 1, &cfg), Ok(None));
        assert_eq!(main("abcdef", "", 3, &cfg), Ok(Some(3)));
        assert_eq!(main("abcdef", "de", 3, &cfg), Ok(Some(3)));
    }

    #[test]
    fn pattern_too_long() {
        let cfg = Config::default();
        let pattern = "x".repeat(33);
        assert_eq!(
            bitap("abc", &pattern, 0, &cfg),
            Err(Error::PatternTooLong { len: 33, max: 32 })
        );
        let wide = Config {
            match_max_bits: 128,
            ..Config::default()
        };
        assert_eq!(bitap("abc", &pattern, 0, &wide), Ok(None));
    }

    #[test]
    fn distance_zero_scores_only_at_loc() {
        let s = Scorer {
            pattern_len: 4,
            loc: 2,
            distance: 0,
        };
        assert_eq!(s.score(1, 2), 0.25);
        assert_eq!(s.score(0, 3), 1.0);
    }
}
