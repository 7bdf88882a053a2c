//! Patches: edit scripts bundled with enough context to be applied to a text
//! that has drifted from the one they were made against.

mod text;

pub use text::{from_text, to_text};

use std::borrow::Cow;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cleanup;
use crate::config::Config;
use crate::deadline::SystemClock;
use crate::diff::{self, DiffOp, DiffOpType, Diffs};
use crate::matcher;
use crate::text::{char_len, chars, find, rfind, substring, to_string};

// ── Types ─────────────────────────────────────────────────────────────────

/// One hunk. Starts are 0-based char offsets into the source (`start1`) and
/// destination (`start2`) texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub diffs: Diffs,
    pub start1: usize,
    pub start2: usize,
    pub length1: usize,
    pub length2: usize,
}

/// The accepted ways of describing the change a patch list should capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchInput<'a> {
    /// Source and destination; the script is computed and cleaned up.
    Texts(&'a str, &'a str),
    /// A script alone; the source is reconstructed from it.
    Diffs(&'a [DiffOp]),
    /// Source plus a script that transforms it.
    TextDiffs(&'a str, &'a [DiffOp]),
}

impl<'a> PatchInput<'a> {
    /// Pick the input shape from loosely supplied parts. A source, destination
    /// and script together are accepted and the destination is ignored.
    pub fn from_parts(
        text1: Option<&'a str>,
        text2: Option<&'a str>,
        diffs: Option<&'a [DiffOp]>,
    ) -> crate::Result<Self> {
        match (text1, text2, diffs) {
            (Some(text1), Some(text2), None) => Ok(PatchInput::Texts(text1, text2)),
            (None, None, Some(diffs)) => Ok(PatchInput::Diffs(diffs)),
            (Some(text1), None, Some(diffs)) => Ok(PatchInput::TextDiffs(text1, diffs)),
            (Some(text1), Some(_), Some(diffs)) => Ok(PatchInput::TextDiffs(text1, diffs)),
            _ => Err(crate::Error::UnknownCallFormat),
        }
    }
}

// ── Make ──────────────────────────────────────────────────────────────────

pub fn make(input: PatchInput<'_>, cfg: &Config) -> Vec<Patch> {
    let (text1, diffs): (Cow<'_, str>, Cow<'_, [DiffOp]>) = match input {
        PatchInput::Texts(text1, text2) => {
            let mut diffs = diff::main(text1, text2, cfg);
            if diffs.len() > 2 {
                cleanup::semantic(&mut diffs);
                cleanup::efficiency(&mut diffs, cfg);
            }
            (Cow::Borrowed(text1), Cow::Owned(diffs))
        }
        PatchInput::Diffs(diffs) => (Cow::Owned(diff::text1(diffs)), Cow::Borrowed(diffs)),
        PatchInput::TextDiffs(text1, diffs) => (Cow::Borrowed(text1), Cow::Borrowed(diffs)),
    };
    make_from(&text1, &diffs, cfg)
}

fn make_from(text1: &str, diffs: &[DiffOp], cfg: &Config) -> Vec<Patch> {
    let mut patches = Vec::new();
    if diffs.is_empty() {
        return patches;
    }
    let margin = cfg.patch_margin;
    let mut patch = Patch::default();
    let mut char_count1 = 0usize;
    let mut char_count2 = 0usize;
    // `prepatch` is the text the current patch applies to; `postpatch` has
    // every edit so far applied. Context comes from `prepatch`, which rolls
    // forward whenever a patch is closed.
    let mut prepatch = chars(text1);
    let mut postpatch = prepatch.clone();

    for (x, (op, text)) in diffs.iter().enumerate() {
        let len = char_len(text);
        if patch.diffs.is_empty() && *op != DiffOpType::Eql {
            patch.start1 = char_count1;
            patch.start2 = char_count2;
        }
        match op {
            DiffOpType::Ins => {
                patch.diffs.push((*op, text.clone()));
                patch.length2 += len;
                let at = char_count2.min(postpatch.len());
                postpatch.splice(at..at, text.chars());
            }
            DiffOpType::Del => {
                patch.length1 += len;
                patch.diffs.push((*op, text.clone()));
                let at = char_count2.min(postpatch.len());
                let end = (char_count2 + len).min(postpatch.len());
                postpatch.drain(at..end);
            }
            DiffOpType::Eql => {
                if len <= 2 * margin && !patch.diffs.is_empty() && x + 1 != diffs.len() {
                    // Small equality inside a patch.
                    patch.diffs.push((*op, text.clone()));
                    patch.length1 += len;
                    patch.length2 += len;
                } else if len >= 2 * margin && !patch.diffs.is_empty() {
                    // Time for a new patch.
                    add_context_chars(&mut patch, &prepatch, cfg);
                    patches.push(std::mem::take(&mut patch));
                    prepatch = postpatch.clone();
                    char_count1 = char_count2;
                }
            }
        }
        if *op != DiffOpType::Ins {
            char_count1 += len;
        }
        if *op != DiffOpType::Del {
            char_count2 += len;
        }
    }
    if !patch.diffs.is_empty() {
        add_context_chars(&mut patch, &prepatch, cfg);
        patches.push(patch);
    }
    patches
}

/// Grow the context around `patch` until its source text is unique within
/// `text` (or as long as a match pattern may be), then add one more margin.
pub fn add_context(patch: &mut Patch, text: &str, cfg: &Config) {
    add_context_chars(patch, &chars(text), cfg);
}

fn add_context_chars(patch: &mut Patch, text: &[char], cfg: &Config) {
    if text.is_empty() {
        return;
    }
    let margin = cfg.patch_margin;
    let limit = cfg.match_max_bits.saturating_sub(2 * margin);
    let mut pattern = substring(text, patch.start2, patch.start2 + patch.length1);
    let mut padding = 0usize;
    while margin > 0
        && find(text, pattern, 0) != rfind(text, pattern, text.len())
        && pattern.len() < limit
    {
        padding += margin;
        pattern = substring(
            text,
            patch.start2.saturating_sub(padding),
            patch.start2 + patch.length1 + padding,
        );
    }
    // One more chunk for good luck.
    padding += margin;

    let prefix = substring(text, patch.start2.saturating_sub(padding), patch.start2);
    if !prefix.is_empty() {
        patch.diffs.insert(0, (DiffOpType::Eql, to_string(prefix)));
    }
    let suffix_start = patch.start2 + patch.length1;
    let suffix = substring(text, suffix_start, suffix_start + padding);
    if !suffix.is_empty() {
        patch.diffs.push((DiffOpType::Eql, to_string(suffix)));
    }

    patch.start1 = patch.start1.saturating_sub(prefix.len());
    patch.start2 = patch.start2.saturating_sub(prefix.len());
    patch.length1 += prefix.len() + suffix.len();
    patch.length2 += prefix.len() + suffix.len();
}

pub fn deep_copy(patches: &[Patch]) -> Vec<Patch> {
    patches.to_vec()
}

// ── Apply ─────────────────────────────────────────────────────────────────

/// Apply `patches` to `text`, relocating each one by fuzzy matching.
/// Returns the new text and, per patch, whether it applied.
pub fn apply(patches: &[Patch], text: &str, cfg: &Config) -> (String, Vec<bool>) {
    if patches.is_empty() {
        return (text.to_string(), Vec::new());
    }

    // Work on a copy; padding and splitting must not leak to the caller.
    let mut patches = deep_copy(patches);
    let null_padding = chars(&add_padding(&mut patches, cfg));
    let mut text: Vec<char> = null_padding
        .iter()
        .copied()
        .chain(text.chars())
        .chain(null_padding.iter().copied())
        .collect();
    split_max(&mut patches, cfg);

    let max_bits = cfg.match_max_bits;
    // Drift between where patches were expected and where they landed.
    let mut delta: isize = 0;
    let mut results = vec![false; patches.len()];
    for (x, patch) in patches.iter().enumerate() {
        let expected_loc = patch.start2 as isize + delta;
        let text1 = chars(&diff::text1(&patch.diffs));
        let mut start_loc;
        let mut end_loc = None;
        if text1.len() > max_bits {
            // Too long for one match: locate its head and tail separately.
            start_loc = locate(&text, &text1[..max_bits], expected_loc, cfg);
            if let Some(start) = start_loc {
                let tail_loc = expected_loc + (text1.len() - max_bits) as isize;
                end_loc = locate(&text, &text1[text1.len() - max_bits..], tail_loc, cfg);
                if !matches!(end_loc, Some(end) if start < end) {
                    // Can't find valid trailing context. Drop this patch.
                    start_loc = None;
                }
            }
        } else {
            start_loc = locate(&text, &text1, expected_loc, cfg);
        }

        let Some(start_loc) = start_loc else {
            debug!(patch = x, expected_loc, "no match found for patch");
            // Subtract the delta for this failed patch from subsequent ones.
            delta -= patch.length2 as isize - patch.length1 as isize;
            continue;
        };
        results[x] = true;
        delta = start_loc as isize - expected_loc;

        let text2 = match end_loc {
            None => substring(&text, start_loc, start_loc + text1.len()).to_vec(),
            Some(end_loc) => substring(&text, start_loc, end_loc + max_bits).to_vec(),
        };
        if text1 == text2 {
            // Perfect match, just shove the replacement text in.
            let replacement = diff::text2(&patch.diffs);
            splice_chars(&mut text, start_loc, start_loc + text1.len(), replacement.chars());
            continue;
        }

        // Imperfect match: reconcile the expected and found texts, then
        // project each edit of the patch onto the found text.
        let clock = SystemClock;
        let deadline = cfg.deadline(&clock);
        let mut diffs = diff::diff_chars(&text1, &text2, false, &deadline, cfg);
        if text1.len() > max_bits
            && diff::levenshtein(&diffs) as f64 / text1.len() as f64 > cfg.patch_delete_threshold
        {
            // The end points match, but the content is unacceptably bad.
            debug!(patch = x, "rejected by delete threshold");
            results[x] = false;
            continue;
        }
        cleanup::semantic_lossless(&mut diffs);
        let mut index1 = 0usize;
        for (op, data) in &patch.diffs {
            let len = char_len(data);
            if *op != DiffOpType::Eql {
                let index2 = diff::x_index(&diffs, index1);
                match op {
                    DiffOpType::Ins => {
                        let at = start_loc + index2;
                        splice_chars(&mut text, at, at, data.chars());
                    }
                    DiffOpType::Del => {
                        let end = diff::x_index(&diffs, index1 + len);
                        splice_chars(
                            &mut text,
                            start_loc + index2,
                            start_loc + end,
                            std::iter::empty(),
                        );
                    }
                    DiffOpType::Eql => {}
                }
            }
            if *op != DiffOpType::Del {
                index1 += len;
            }
        }
    }

    // Strip the padding off.
    let end = text.len().saturating_sub(null_padding.len());
    let text = to_string(substring(&text, null_padding.len(), end));
    (text, results)
}

fn locate(text: &[char], pattern: &[char], loc: isize, cfg: &Config) -> Option<usize> {
    let loc = usize::try_from(loc).unwrap_or(0);
    match matcher::main_chars(text, pattern, loc, cfg) {
        Ok(found) => found,
        Err(err) => {
            debug!(%err, "match failed");
            None
        }
    }
}

fn splice_chars<I>(text: &mut Vec<char>, from: usize, to: usize, with: I)
where
    I: IntoIterator<Item = char>,
{
    let from = from.min(text.len());
    let to = to.clamp(from, text.len());
    text.splice(from..to, with);
}

// ── Padding and splitting ─────────────────────────────────────────────────

/// Surround the patch list with `patch_margin` chars of padding
/// (U+0001, U+0002, ...) so that edits at the very start or end of a text
/// still have context. Returns the padding string.
pub fn add_padding(patches: &mut [Patch], cfg: &Config) -> String {
    let padding_len = cfg.patch_margin;
    let null_padding: String = (1..=padding_len)
        .filter_map(|code| u32::try_from(code).ok().and_then(char::from_u32))
        .collect();
    let padding: Vec<char> = chars(&null_padding);

    // Bump all the patches forward.
    for patch in patches.iter_mut() {
        patch.start1 += padding_len;
        patch.start2 += padding_len;
    }

    // Add some padding on the start of the first diff.
    if let Some(patch) = patches.first_mut() {
        let first_eql = match patch.diffs.first() {
            Some((DiffOpType::Eql, text)) => Some(char_len(text)),
            _ => None,
        };
        match first_eql {
            None => {
                patch.diffs.insert(0, (DiffOpType::Eql, null_padding.clone()));
                patch.start1 -= padding_len;
                patch.start2 -= padding_len;
                patch.length1 += padding_len;
                patch.length2 += padding_len;
            }
            Some(len) if len < padding_len => {
                let extra = padding_len - len;
                let head = to_string(&padding[len..]);
                patch.diffs[0].1.insert_str(0, &head);
                patch.start1 -= extra;
                patch.start2 -= extra;
                patch.length1 += extra;
                patch.length2 += extra;
            }
            Some(_) => {}
        }
    }

    // Add some padding on the end of the last diff.
    if let Some(patch) = patches.last_mut() {
        let last_eql = match patch.diffs.last() {
            Some((DiffOpType::Eql, text)) => Some(char_len(text)),
            _ => None,
        };
        match last_eql {
            None => {
                patch.diffs.push((DiffOpType::Eql, null_padding.clone()));
                patch.length1 += padding_len;
                patch.length2 += padding_len;
            }
            Some(len) if len < padding_len => {
                let extra = padding_len - len;
                let tail = to_string(&padding[..extra]);
                if let Some(last) = patch.diffs.last_mut() {
                    last.1.push_str(&tail);
                }
                patch.length1 += extra;
                patch.length2 += extra;
            }
            Some(_) => {}
        }
    }

    null_padding
}

/// Break up patches whose source span is longer than the match engine can
/// locate. A single deletion too large to split travels in its own chunk.
pub fn split_max(patches: &mut Vec<Patch>, cfg: &Config) {
    let patch_size = cfg.match_max_bits;
    let margin = cfg.patch_margin;
    if patch_size <= 2 * margin {
        // No room for content between the two contexts; chunks would never
        // advance. Leave oversized patches to head/tail matching in `apply`.
        debug!(patch_size, margin, "margin too wide to split patches");
        return;
    }
    let mut x = 0usize;
    while x < patches.len() {
        if patches[x].length1 <= patch_size {
            x += 1;
            continue;
        }
        let big = patches.remove(x);
        debug!(length1 = big.length1, "splitting oversized patch");
        let mut start1 = big.start1;
        let mut start2 = big.start2;
        let mut remaining: VecDeque<DiffOp> = big.diffs.into();
        let mut precontext: Vec<char> = Vec::new();
        while !remaining.is_empty() {
            // Create one of several smaller patches.
            let mut patch = Patch {
                start1: start1.saturating_sub(precontext.len()),
                start2: start2.saturating_sub(precontext.len()),
                ..Patch::default()
            };
            let mut empty = true;
            if !precontext.is_empty() {
                patch.length1 = precontext.len();
                patch.length2 = precontext.len();
                patch.diffs.push((DiffOpType::Eql, to_string(&precontext)));
            }
            while patch.length1 < patch_size.saturating_sub(margin) {
                let Some((op, text)) = remaining.front().cloned() else {
                    break;
                };
                let len = char_len(&text);
                if op == DiffOpType::Ins {
                    // Insertions are harmless.
                    patch.length2 += len;
                    start2 += len;
                    patch.diffs.push((op, text));
                    remaining.pop_front();
                    empty = false;
                } else if op == DiffOpType::Del
                    && patch.diffs.len() == 1
                    && patch.diffs[0].0 == DiffOpType::Eql
                    && len > 2 * patch_size
                {
                    // This is a large deletion. Let it pass in one chunk.
                    patch.length1 += len;
                    start1 += len;
                    empty = false;
                    patch.diffs.push((op, text));
                    remaining.pop_front();
                } else {
                    // Deletion or equality. Only take as much as we can stomach.
                    let take = patch_size - patch.length1 - margin;
                    let piece: String = text.chars().take(take).collect();
                    let piece_len = char_len(&piece);
                    patch.length1 += piece_len;
                    start1 += piece_len;
                    if op == DiffOpType::Eql {
                        patch.length2 += piece_len;
                        start2 += piece_len;
                    } else {
                        empty = false;
                    }
                    patch.diffs.push((op, piece));
                    if piece_len == len {
                        remaining.pop_front();
                    } else if let Some(front) = remaining.front_mut() {
                        front.1 = text.chars().skip(piece_len).collect();
                    }
                }
            }

            // Compute the head context for the next patch.
            let patch_text2 = chars(&diff::text2(&patch.diffs));
            precontext = patch_text2[patch_text2.len().saturating_sub(margin)..].to_vec();
            // Append the end context for this patch.
            let postcontext: String = remaining
                .iter()
                .filter(|(op, _)| *op != DiffOpType::Ins)
                .flat_map(|(_, text)| text.chars())
                .take(margin)
                .collect();
            if !postcontext.is_empty() {
                let len = char_len(&postcontext);
                patch.length1 += len;
                patch.length2 += len;
                match patch.diffs.last_mut() {
                    Some((DiffOpType::Eql, text)) => text.push_str(&postcontext),
                    _ => patch.diffs.push((DiffOpType::Eql, postcontext)),
                }
            }
            if !empty {
                patches.insert(x, patch);
                x += 1;
            }
        }
    }
}
