//! Text diff: Myers O(ND) bisection with containment, half-match and
//! line-mode speedups.
//!
//! All lengths and positions are in chars.

pub mod delta;
pub mod lines;
pub mod ops;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cleanup;
use crate::config::Config;
use crate::deadline::{Deadline, SystemClock};
use crate::error::{Error, Result};
use crate::text::{common_prefix_chars, common_suffix_chars, find, to_string};

pub use ops::{invert, levenshtein, pretty_html, text1, text2, x_index};

// ── Types ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum DiffOpType {
    Del = -1,
    Eql = 0,
    Ins = 1,
}

impl DiffOpType {
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

impl From<DiffOpType> for i8 {
    fn from(op: DiffOpType) -> Self {
        op.as_i8()
    }
}

impl TryFrom<i8> for DiffOpType {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            -1 => Ok(DiffOpType::Del),
            0 => Ok(DiffOpType::Eql),
            1 => Ok(DiffOpType::Ins),
            other => Err(format!("unknown diff operation {other}")),
        }
    }
}

pub type DiffOp = (DiffOpType, String);
pub type Diffs = Vec<DiffOp>;

// ── Entry points ──────────────────────────────────────────────────────────

/// Diff two texts with line mode enabled and a deadline derived from
/// `cfg.diff_timeout` on the system clock.
pub fn main(text1: &str, text2: &str, cfg: &Config) -> Diffs {
    let clock = SystemClock;
    let deadline = cfg.deadline(&clock);
    main_with(text1, text2, true, &deadline, cfg)
}

/// Diff two texts with an explicit line-mode flag and deadline.
pub fn main_with(
    text1: &str,
    text2: &str,
    check_lines: bool,
    deadline: &Deadline<'_>,
    cfg: &Config,
) -> Diffs {
    if text1 == text2 {
        return if text1.is_empty() {
            vec![]
        } else {
            vec![(DiffOpType::Eql, text1.to_string())]
        };
    }
    let c1: Vec<char> = text1.chars().collect();
    let c2: Vec<char> = text2.chars().collect();
    diff_chars(&c1, &c2, check_lines, deadline, cfg)
}

/// Like [`main`], but distinguishes an absent text from an empty one.
pub fn try_main(text1: Option<&str>, text2: Option<&str>, cfg: &Config) -> Result<Diffs> {
    match (text1, text2) {
        (Some(text1), Some(text2)) => Ok(main(text1, text2, cfg)),
        (None, _) => Err(Error::InvalidInput("text1")),
        (_, None) => Err(Error::InvalidInput("text2")),
    }
}

// ── Core algorithm ────────────────────────────────────────────────────────

pub(crate) fn diff_chars(
    c1: &[char],
    c2: &[char],
    check_lines: bool,
    deadline: &Deadline<'_>,
    cfg: &Config,
) -> Diffs {
    if c1 == c2 {
        return if c1.is_empty() {
            vec![]
        } else {
            vec![(DiffOpType::Eql, to_string(c1))]
        };
    }

    let prefix_len = common_prefix_chars(c1, c2);
    let prefix = &c1[..prefix_len];
    let c1 = &c1[prefix_len..];
    let c2 = &c2[prefix_len..];

    let suffix_len = common_suffix_chars(c1, c2);
    let suffix = &c1[c1.len() - suffix_len..];
    let c1 = &c1[..c1.len() - suffix_len];
    let c2 = &c2[..c2.len() - suffix_len];

    let mut diffs = compute(c1, c2, check_lines, deadline, cfg);
    if !prefix.is_empty() {
        diffs.insert(0, (DiffOpType::Eql, to_string(prefix)));
    }
    if !suffix.is_empty() {
        diffs.push((DiffOpType::Eql, to_string(suffix)));
    }
    cleanup::merge(&mut diffs);
    diffs
}

/// Diff two texts that share no common prefix or suffix.
fn compute(
    c1: &[char],
    c2: &[char],
    check_lines: bool,
    deadline: &Deadline<'_>,
    cfg: &Config,
) -> Diffs {
    if c1.is_empty() {
        return vec![(DiffOpType::Ins, to_string(c2))];
    }
    if c2.is_empty() {
        return vec![(DiffOpType::Del, to_string(c1))];
    }

    let c1_longer = c1.len() > c2.len();
    let (long, short) = if c1_longer { (c1, c2) } else { (c2, c1) };
    if let Some(i) = find(long, short, 0) {
        let op = if c1_longer {
            DiffOpType::Del
        } else {
            DiffOpType::Ins
        };
        return vec![
            (op, to_string(&long[..i])),
            (DiffOpType::Eql, to_string(short)),
            (op, to_string(&long[i + short.len()..])),
        ];
    }

    if short.len() == 1 {
        // Single char that is not contained: nothing in common.
        return vec![
            (DiffOpType::Del, to_string(c1)),
            (DiffOpType::Ins, to_string(c2)),
        ];
    }

    if let Some(hm) = half_match(c1, c2, cfg) {
        trace!(common = hm.common.len(), "half match");
        let mut diffs = diff_chars(hm.text1_a, hm.text2_a, check_lines, deadline, cfg);
        diffs.push((DiffOpType::Eql, to_string(hm.common)));
        diffs.extend(diff_chars(hm.text1_b, hm.text2_b, check_lines, deadline, cfg));
        return diffs;
    }

    if check_lines && c1.len() > 100 && c2.len() > 100 {
        return line_mode(c1, c2, deadline, cfg);
    }

    bisect(c1, c2, deadline, cfg)
}

// ── Half match ────────────────────────────────────────────────────────────

/// Shared substring at least half the length of the longer text, with the
/// flanks of both texts around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfMatch<'a> {
    pub text1_a: &'a [char],
    pub text1_b: &'a [char],
    pub text2_a: &'a [char],
    pub text2_b: &'a [char],
    pub common: &'a [char],
}

/// Half-match is only attempted when the diff runs under a time limit,
/// since it can yield a non-minimal diff.
pub fn half_match<'a>(c1: &'a [char], c2: &'a [char], cfg: &Config) -> Option<HalfMatch<'a>> {
    if cfg.diff_timeout <= 0.0 {
        return None;
    }
    let c1_longer = c1.len() > c2.len();
    let (long, short) = if c1_longer { (c1, c2) } else { (c2, c1) };
    if long.len() < 4 || short.len() * 2 < long.len() {
        return None;
    }

    let hm1 = half_match_at(long, short, long.len().div_ceil(4));
    let hm2 = half_match_at(long, short, long.len().div_ceil(2));
    let hm = match (hm1, hm2) {
        (None, None) => return None,
        (Some(hm), None) | (None, Some(hm)) => hm,
        (Some(hm1), Some(hm2)) => {
            if hm1.common.len() > hm2.common.len() {
                hm1
            } else {
                hm2
            }
        }
    };

    // `hm` is oriented long/short; flip it back when text2 was longer.
    Some(if c1_longer {
        hm
    } else {
        HalfMatch {
            text1_a: hm.text2_a,
            text1_b: hm.text2_b,
            text2_a: hm.text1_a,
            text2_b: hm.text1_b,
            common: hm.common,
        }
    })
}

/// Does a quarter-length substring of `long` starting at `i` seed a shared
/// block at least half as long as `long`?
fn half_match_at<'a>(long: &'a [char], short: &'a [char], i: usize) -> Option<HalfMatch<'a>> {
    let seed = &long[i..i + long.len() / 4];
    let mut best: Option<HalfMatch<'a>> = None;
    let mut best_len = 0usize;
    let mut j = find(short, seed, 0);
    while let Some(at) = j {
        let prefix_len = common_prefix_chars(&long[i..], &short[at..]);
        let suffix_len = common_suffix_chars(&long[..i], &short[..at]);
        if best_len < suffix_len + prefix_len {
            best_len = suffix_len + prefix_len;
            best = Some(HalfMatch {
                text1_a: &long[..i - suffix_len],
                text1_b: &long[i + prefix_len..],
                text2_a: &short[..at - suffix_len],
                text2_b: &short[at + prefix_len..],
                common: &short[at - suffix_len..at + prefix_len],
            });
        }
        j = find(short, seed, at + 1);
    }
    if best_len * 2 >= long.len() {
        best
    } else {
        None
    }
}

// ── Line mode ─────────────────────────────────────────────────────────────

/// Quick line-level diff, then re-diff each changed block char by char.
fn line_mode(c1: &[char], c2: &[char], deadline: &Deadline<'_>, cfg: &Config) -> Diffs {
    let encoded = lines::lines_to_chars_slices(c1, c2);
    debug!(lines = encoded.line_array.len(), "diffing in line mode");
    let mut diffs = diff_chars(&encoded.chars1, &encoded.chars2, false, deadline, cfg);
    lines::chars_to_lines(&mut diffs, &encoded.line_array);
    cleanup::semantic(&mut diffs);

    // Sentinel equality flushes the final block.
    diffs.push((DiffOpType::Eql, String::new()));
    let mut pointer = 0usize;
    let mut count_del = 0usize;
    let mut count_ins = 0usize;
    let mut text_del = String::new();
    let mut text_ins = String::new();
    while pointer < diffs.len() {
        match diffs[pointer].0 {
            DiffOpType::Ins => {
                count_ins += 1;
                text_ins.push_str(&diffs[pointer].1);
            }
            DiffOpType::Del => {
                count_del += 1;
                text_del.push_str(&diffs[pointer].1);
            }
            DiffOpType::Eql => {
                if count_del >= 1 && count_ins >= 1 {
                    let start = pointer - count_del - count_ins;
                    let sub = main_with(&text_del, &text_ins, false, deadline, cfg);
                    let sub_len = sub.len();
                    diffs.splice(start..pointer, sub);
                    pointer = start + sub_len;
                }
                count_del = 0;
                count_ins = 0;
                text_del.clear();
                text_ins.clear();
            }
        }
        pointer += 1;
    }
    diffs.pop();
    diffs
}

// ── Bisection ─────────────────────────────────────────────────────────────

/// Find the middle snake of the edit graph and split the problem there.
/// Degrades to delete-all/insert-all once `deadline` passes.
pub fn bisect(c1: &[char], c2: &[char], deadline: &Deadline<'_>, cfg: &Config) -> Diffs {
    let n1 = c1.len() as isize;
    let n2 = c2.len() as isize;
    let max_d = (n1 + n2 + 1) / 2;
    let v_offset = max_d;
    let v_length = 2 * max_d;
    // Two spare slots keep the `k + 1` reads in bounds for tiny inputs.
    let mut v1: Vec<isize> = vec![-1; v_length as usize + 2];
    let mut v2: Vec<isize> = vec![-1; v_length as usize + 2];
    v1[v_offset as usize + 1] = 0;
    v2[v_offset as usize + 1] = 0;

    let delta = n1 - n2;
    // Odd delta: the forward path collides with the reverse path.
    let front = delta % 2 != 0;

    let mut k1start = 0isize;
    let mut k1end = 0isize;
    let mut k2start = 0isize;
    let mut k2end = 0isize;

    for d in 0..max_d {
        if deadline.is_past() {
            debug!(d, len1 = n1, len2 = n2, "diff deadline reached");
            break;
        }

        // Forward path
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n1 && y1 < n2 && c1[x1 as usize] == c2[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > n1 {
                k1end += 2;
            } else if y1 > n2 {
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                    let x2 = n1 - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(c1, c2, x1 as usize, y1 as usize, deadline, cfg);
                    }
                }
            }
            k1 += 2;
        }

        // Reverse path
        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n1
                && y2 < n2
                && c1[(n1 - x2 - 1) as usize] == c2[(n2 - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > n1 {
                k2end += 2;
            } else if y2 > n2 {
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    if x1 >= n1 - x2 {
                        return bisect_split(c1, c2, x1 as usize, y1 as usize, deadline, cfg);
                    }
                }
            }
            k2 += 2;
        }
    }

    // Out of time, or no commonality at all.
    vec![
        (DiffOpType::Del, to_string(c1)),
        (DiffOpType::Ins, to_string(c2)),
    ]
}

fn bisect_split(
    c1: &[char],
    c2: &[char],
    x: usize,
    y: usize,
    deadline: &Deadline<'_>,
    cfg: &Config,
) -> Diffs {
    let mut diffs = diff_chars(&c1[..x], &c2[..y], false, deadline, cfg);
    diffs.extend(diff_chars(&c1[x..], &c2[y..], false, deadline, cfg));
    diffs
}
