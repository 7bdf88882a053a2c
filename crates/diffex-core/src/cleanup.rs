//! Post-processing passes over an edit script.
//!
//! Every pass mutates the caller's script in place and walks it with an
//! explicit cursor; the order in which equalities are eliminated matters for
//! the result, so the passes are not expressed as iterator chains.

use crate::config::Config;
use crate::diff::{DiffOpType, Diffs};
use crate::text::{
    char_len, chars, common_overlap_chars, common_prefix, common_suffix, common_suffix_chars,
    to_string,
};

// ── Semantic ──────────────────────────────────────────────────────────────

/// Trade minimality for readability: drop short equalities that are
/// sandwiched between larger edits, then align edits to word boundaries and
/// pull out overlaps between adjacent deletions and insertions.
pub fn semantic(diffs: &mut Diffs) {
    let mut changes = false;
    // Indices of candidate equalities.
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer: isize = 0;
    // Chars changed before (1) and after (2) the last equality.
    let mut ins1 = 0usize;
    let mut del1 = 0usize;
    let mut ins2 = 0usize;
    let mut del2 = 0usize;

    while (pointer as usize) < diffs.len() {
        let p = pointer as usize;
        if diffs[p].0 == DiffOpType::Eql {
            equalities.push(p);
            ins1 = ins2;
            del1 = del2;
            ins2 = 0;
            del2 = 0;
            last_equality = Some(diffs[p].1.clone());
        } else {
            if diffs[p].0 == DiffOpType::Ins {
                ins2 += char_len(&diffs[p].1);
            } else {
                del2 += char_len(&diffs[p].1);
            }
            let eliminate = last_equality.as_deref().is_some_and(|eq| {
                let len = char_len(eq);
                len > 0 && len <= ins1.max(del1) && len <= ins2.max(del2)
            });
            if let (true, Some(&at)) = (eliminate, equalities.last()) {
                let eq = last_equality.take().unwrap_or_default();
                diffs.insert(at, (DiffOpType::Del, eq));
                diffs[at + 1].0 = DiffOpType::Ins;
                // Drop this equality and the one before it; the previous
                // one may now be eliminable too.
                equalities.pop();
                equalities.pop();
                pointer = equalities.last().map_or(-1, |&e| e as isize);
                ins1 = 0;
                del1 = 0;
                ins2 = 0;
                del2 = 0;
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        merge(diffs);
    }
    semantic_lossless(diffs);

    // Overlaps between a deletion and a following insertion:
    //   <del>abcxxx</del><ins>xxxdef</ins> -> <del>abc</del>xxx<ins>def</ins>
    //   <del>xxxabc</del><ins>defxxx</ins> -> <ins>def</ins>xxx<del>abc</del>
    // Only extracted when the overlap is at least half of either edit.
    let mut pointer = 1usize;
    while pointer < diffs.len() {
        if diffs[pointer - 1].0 == DiffOpType::Del && diffs[pointer].0 == DiffOpType::Ins {
            let deletion = chars(&diffs[pointer - 1].1);
            let insertion = chars(&diffs[pointer].1);
            let overlap1 = common_overlap_chars(&deletion, &insertion);
            let overlap2 = common_overlap_chars(&insertion, &deletion);
            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    diffs.insert(pointer, (DiffOpType::Eql, to_string(&insertion[..overlap1])));
                    diffs[pointer - 1].1 = to_string(&deletion[..deletion.len() - overlap1]);
                    diffs[pointer + 1].1 = to_string(&insertion[overlap1..]);
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                diffs.insert(pointer, (DiffOpType::Eql, to_string(&deletion[..overlap2])));
                diffs[pointer - 1] = (
                    DiffOpType::Ins,
                    to_string(&insertion[..insertion.len() - overlap2]),
                );
                diffs[pointer + 1] = (DiffOpType::Del, to_string(&deletion[overlap2..]));
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

// ── Semantic lossless ─────────────────────────────────────────────────────

/// Slide single edits surrounded by equalities sideways so that their
/// boundaries fall on the most natural break:
/// `The c<ins>at c</ins>ame.` -> `The <ins>cat </ins>came.`
pub fn semantic_lossless(diffs: &mut Diffs) {
    // The first and last elements never need checking.
    let mut pointer: isize = 1;
    loop {
        pointer = pointer.max(1);
        let p = pointer as usize;
        if p + 1 >= diffs.len() {
            break;
        }
        if diffs[p - 1].0 == DiffOpType::Eql && diffs[p + 1].0 == DiffOpType::Eql {
            let mut equality1 = chars(&diffs[p - 1].1);
            let mut edit = chars(&diffs[p].1);
            let mut equality2 = chars(&diffs[p + 1].1);

            // Shift the edit as far left as possible.
            let common = common_suffix_chars(&equality1, &edit);
            if common > 0 {
                let shared = edit[edit.len() - common..].to_vec();
                equality1.truncate(equality1.len() - common);
                edit.truncate(edit.len() - common);
                edit.splice(0..0, shared.iter().copied());
                equality2.splice(0..0, shared);
            }

            // Step right one char at a time looking for the best fit.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                equality1.push(edit.remove(0));
                edit.push(equality2.remove(0));
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                // `>=` prefers the rightmost of equally good positions.
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            let best_equality1 = to_string(&best_equality1);
            if diffs[p - 1].1 != best_equality1 {
                let mut p = p;
                if best_equality1.is_empty() {
                    diffs.remove(p - 1);
                    p -= 1;
                    pointer -= 1;
                } else {
                    diffs[p - 1].1 = best_equality1;
                }
                diffs[p].1 = to_string(&best_edit);
                if best_equality2.is_empty() {
                    diffs.remove(p + 1);
                    pointer -= 1;
                } else {
                    diffs[p + 1].1 = to_string(&best_equality2);
                }
            }
        }
        pointer += 1;
    }
}

const BLANK_LINE_STARTS: [&[char]; 4] = [
    &['\n', '\n'],
    &['\n', '\r', '\n'],
    &['\r', '\n', '\n'],
    &['\r', '\n', '\r', '\n'],
];

/// Score how natural the boundary between `one` and `two` is, from 6 (edge
/// of the text) down to 0 (inside a word).
fn semantic_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&char1), Some(&char2)) = (one.last(), two.first()) else {
        return 6;
    };
    let non_alnum1 = !char1.is_ascii_alphanumeric();
    let non_alnum2 = !char2.is_ascii_alphanumeric();
    let whitespace1 = non_alnum1 && char1.is_whitespace();
    let whitespace2 = non_alnum2 && char2.is_whitespace();
    let line_break1 = whitespace1 && matches!(char1, '\r' | '\n');
    let line_break2 = whitespace2 && matches!(char2, '\r' | '\n');
    let blank_line1 = line_break1 && (one.ends_with(&['\n', '\n']) || one.ends_with(&['\n', '\r', '\n']));
    let blank_line2 = line_break2 && BLANK_LINE_STARTS.iter().any(|start| two.starts_with(start));

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        // End of sentence.
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

// ── Efficiency ────────────────────────────────────────────────────────────

/// Trade minimality for fewer, larger edits: an equality shorter than
/// `cfg.diff_edit_cost` is folded into its neighbours when it sits between
/// edits of both kinds on both sides, or between three edit kinds and is
/// shorter than half the edit cost.
pub fn efficiency(diffs: &mut Diffs, cfg: &Config) {
    let edit_cost = cfg.diff_edit_cost;
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer: isize = 0;
    // Is there an insertion/deletion before (pre) or after (post) the last
    // equality?
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while (pointer as usize) < diffs.len() {
        let p = pointer as usize;
        if diffs[p].0 == DiffOpType::Eql {
            if char_len(&diffs[p].1) < edit_cost && (post_ins || post_del) {
                equalities.push(p);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[p].1.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if diffs[p].0 == DiffOpType::Del {
                post_del = true;
            } else {
                post_ins = true;
            }
            let eliminate = last_equality.as_deref().is_some_and(|eq| {
                let flags = [pre_ins, pre_del, post_ins, post_del]
                    .iter()
                    .filter(|&&f| f)
                    .count();
                !eq.is_empty() && (flags == 4 || (char_len(eq) * 2 < edit_cost && flags == 3))
            });
            if let (true, Some(&at)) = (eliminate, equalities.last()) {
                let eq = last_equality.take().unwrap_or_default();
                diffs.insert(at, (DiffOpType::Del, eq));
                diffs[at + 1].0 = DiffOpType::Ins;
                equalities.pop();
                if pre_ins && pre_del {
                    // No changes made which could affect previous entry.
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                } else {
                    equalities.pop();
                    pointer = equalities.last().map_or(-1, |&e| e as isize);
                    post_ins = false;
                    post_del = false;
                }
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        merge(diffs);
    }
}

// ── Merge ─────────────────────────────────────────────────────────────────

/// Normalize a script: coalesce runs of edits, factor shared prefixes and
/// suffixes of deletion/insertion pairs into the surrounding equalities,
/// drop empty operations, then slide single edits over a neighbouring
/// equality when that removes it (`A<ins>BA</ins>C` -> `<ins>AB</ins>AC`).
/// Repeats until nothing moves.
pub fn merge(diffs: &mut Diffs) {
    // Sentinel equality flushes the final run.
    diffs.push((DiffOpType::Eql, String::new()));
    let mut pointer = 0usize;
    let mut count_del = 0usize;
    let mut count_ins = 0usize;
    let mut text_del = String::new();
    let mut text_ins = String::new();

    while pointer < diffs.len() {
        if pointer + 1 < diffs.len() && diffs[pointer].1.is_empty() {
            diffs.remove(pointer);
            continue;
        }
        match diffs[pointer].0 {
            DiffOpType::Ins => {
                count_ins += 1;
                text_ins.push_str(&diffs[pointer].1);
                pointer += 1;
            }
            DiffOpType::Del => {
                count_del += 1;
                text_del.push_str(&diffs[pointer].1);
                pointer += 1;
            }
            DiffOpType::Eql => {
                let n = count_del + count_ins;
                if n > 1 {
                    let run_start = pointer - n;
                    if count_del != 0 && count_ins != 0 {
                        let prefix = common_prefix(&text_ins, &text_del);
                        if prefix != 0 {
                            let head: String = text_ins.chars().take(prefix).collect();
                            let head_bytes = head.len();
                            if run_start > 0 && diffs[run_start - 1].0 == DiffOpType::Eql {
                                diffs[run_start - 1].1.push_str(&head);
                            } else {
                                diffs.insert(0, (DiffOpType::Eql, head));
                                pointer += 1;
                            }
                            text_ins.drain(..head_bytes);
                            text_del.drain(..head_bytes);
                        }
                        let suffix = common_suffix(&text_ins, &text_del);
                        if suffix != 0 {
                            let tail_at = text_ins.len()
                                - text_ins.chars().rev().take(suffix).map(char::len_utf8).sum::<usize>();
                            let tail = text_ins.split_off(tail_at);
                            text_del.truncate(text_del.len() - tail.len());
                            diffs[pointer].1.insert_str(0, &tail);
                        }
                    }
                    let run_start = pointer - n;
                    let mut replacement = Vec::with_capacity(2);
                    if !text_del.is_empty() {
                        replacement.push((DiffOpType::Del, text_del.clone()));
                    }
                    if !text_ins.is_empty() {
                        replacement.push((DiffOpType::Ins, text_ins.clone()));
                    }
                    let added = replacement.len();
                    diffs.splice(run_start..pointer, replacement);
                    pointer = run_start + added;
                }
                if pointer != 0 && diffs[pointer - 1].0 == DiffOpType::Eql {
                    // Merge this equality into the previous one.
                    let text = diffs.remove(pointer).1;
                    diffs[pointer - 1].1.push_str(&text);
                } else {
                    pointer += 1;
                }
                count_del = 0;
                count_ins = 0;
                text_del.clear();
                text_ins.clear();
            }
        }
    }
    if diffs.last().is_some_and(|(_, text)| text.is_empty()) {
        diffs.pop();
    }

    // Second pass: single edits surrounded by equalities that can be
    // shifted sideways to eliminate one of them.
    let mut changes = false;
    let mut pointer = 1usize;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].0 == DiffOpType::Eql && diffs[pointer + 1].0 == DiffOpType::Eql {
            let prev = diffs[pointer - 1].1.clone();
            let next = diffs[pointer + 1].1.clone();
            if diffs[pointer].1.ends_with(&prev) {
                // Shift the edit over the previous equality.
                let edit = &diffs[pointer].1;
                let shifted = format!("{prev}{}", &edit[..edit.len() - prev.len()]);
                diffs[pointer].1 = shifted;
                diffs[pointer + 1].1 = format!("{prev}{next}");
                diffs.remove(pointer - 1);
                changes = true;
            } else if diffs[pointer].1.starts_with(&next) {
                // Shift the edit over the next equality.
                diffs[pointer - 1].1.push_str(&next);
                let edit = &diffs[pointer].1;
                let shifted = format!("{}{next}", &edit[next.len()..]);
                diffs[pointer].1 = shifted;
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    if changes {
        merge(diffs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DiffOpType::{Del, Eql, Ins};

    fn d(op: DiffOpType, s: &str) -> (DiffOpType, String) {
        (op, s.to_string())
    }

    fn merged(mut diffs: Diffs) -> Diffs {
        merge(&mut diffs);
        diffs
    }

    #[test]
    fn merge_coalesces_runs() {
        assert_eq!(merged(vec![]), vec![]);
        assert_eq!(
            merged(vec![d(Eql, "a"), d(Del, "b"), d(Ins, "c")]),
            vec![d(Eql, "a"), d(Del, "b"), d(Ins, "c")]
        );
        assert_eq!(merged(vec![d(Eql, "a"), d(Eql, "b"), d(Eql, "c")]), vec![d(Eql, "abc")]);
        assert_eq!(merged(vec![d(Del, "a"), d(Del, "b"), d(Del, "c")]), vec![d(Del, "abc")]);
        assert_eq!(merged(vec![d(Ins, "a"), d(Ins, "b"), d(Ins, "c")]), vec![d(Ins, "abc")]);
        assert_eq!(
            merged(vec![d(Del, "a"), d(Ins, "b"), d(Del, "c"), d(Ins, "d"), d(Eql, "e"), d(Eql, "f")]),
            vec![d(Del, "ac"), d(Ins, "bd"), d(Eql, "ef")]
        );
    }

    #[test]
    fn merge_factors_affixes() {
        assert_eq!(
            merged(vec![d(Del, "a"), d(Ins, "abc"), d(Del, "dc")]),
            vec![d(Eql, "a"), d(Del, "d"), d(Ins, "b"), d(Eql, "c")]
        );
        assert_eq!(
            merged(vec![d(Eql, "x"), d(Del, "a"), d(Ins, "abc"), d(Del, "dc"), d(Eql, "y")]),
            vec![d(Eql, "xa"), d(Del, "d"), d(Ins, "b"), d(Eql, "cy")]
        );
    }

    #[test]
    fn merge_slides_edits() {
        assert_eq!(
            merged(vec![d(Eql, "a"), d(Ins, "ba"), d(Eql, "c")]),
            vec![d(Ins, "ab"), d(Eql, "ac")]
        );
        assert_eq!(
            merged(vec![d(Eql, "c"), d(Ins, "ab"), d(Eql, "a")]),
            vec![d(Eql, "ca"), d(Ins, "ba")]
        );
        assert_eq!(
            merged(vec![d(Eql, "a"), d(Del, "b"), d(Eql, "c"), d(Del, "ac"), d(Eql, "x")]),
            vec![d(Del, "abc"), d(Eql, "acx")]
        );
        assert_eq!(
            merged(vec![d(Eql, "x"), d(Del, "ca"), d(Eql, "c"), d(Del, "b"), d(Eql, "a")]),
            vec![d(Eql, "xca"), d(Del, "cba")]
        );
    }

    #[test]
    fn merge_drops_empties() {
        assert_eq!(
            merged(vec![d(Del, "b"), d(Ins, "ab"), d(Eql, "c")]),
            vec![d(Ins, "a"), d(Eql, "bc")]
        );
        assert_eq!(
            merged(vec![d(Eql, ""), d(Ins, "a"), d(Eql, "b")]),
            vec![d(Ins, "a"), d(Eql, "b")]
        );
    }

    #[test]
    fn score_ranks_boundaries() {
        let s = |a: &str, b: &str| semantic_score(&chars(a), &chars(b));
        assert_eq!(s("", "x"), 6);
        assert_eq!(s("a\n\n", "b"), 5);
        assert_eq!(s("a\n", "b"), 4);
        assert_eq!(s("end.", " next"), 3);
        assert_eq!(s("a ", "b"), 2);
        assert_eq!(s("a-", "b"), 1);
        assert_eq!(s("a", "b"), 0);
    }
}
