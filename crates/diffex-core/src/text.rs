//! Primitive char-indexed string operations.
//!
//! All positions and lengths are counted in Unicode scalar values (Rust
//! `char`s), never bytes. The `*_chars` variants work on pre-split slices and
//! are what the engines use internally.

pub fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn to_string(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Number of chars in the common prefix of `txt1` and `txt2`.
pub fn common_prefix(txt1: &str, txt2: &str) -> usize {
    common_prefix_chars(&chars(txt1), &chars(txt2))
}

/// Number of chars in the common suffix of `txt1` and `txt2`.
pub fn common_suffix(txt1: &str, txt2: &str) -> usize {
    common_suffix_chars(&chars(txt1), &chars(txt2))
}

/// Length of the longest suffix of `str1` that is a prefix of `str2`.
pub fn common_overlap(str1: &str, str2: &str) -> usize {
    common_overlap_chars(&chars(str1), &chars(str2))
}

pub fn common_prefix_chars(c1: &[char], c2: &[char]) -> usize {
    if c1.is_empty() || c2.is_empty() || c1[0] != c2[0] {
        return 0;
    }
    let mut min = 0usize;
    let mut max = c1.len().min(c2.len());
    let mut mid = max;
    let mut start = 0;
    while min < mid {
        if c1[start..mid] == c2[start..mid] {
            min = mid;
            start = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

pub fn common_suffix_chars(c1: &[char], c2: &[char]) -> usize {
    let n1 = c1.len();
    let n2 = c2.len();
    if n1 == 0 || n2 == 0 || c1[n1 - 1] != c2[n2 - 1] {
        return 0;
    }
    let mut min = 0usize;
    let mut max = n1.min(n2);
    let mut mid = max;
    let mut end = 0;
    while min < mid {
        if c1[n1 - mid..n1 - end] == c2[n2 - mid..n2 - end] {
            min = mid;
            end = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

pub fn common_overlap_chars(c1: &[char], c2: &[char]) -> usize {
    let n1 = c1.len();
    let n2 = c2.len();
    if n1 == 0 || n2 == 0 {
        return 0;
    }

    let min_len = n1.min(n2);
    let c1 = if n1 > n2 { &c1[n1 - n2..] } else { c1 };
    let c2 = if n1 < n2 { &c2[..n1] } else { c2 };
    if c1 == c2 {
        return min_len;
    }

    // Grow a candidate suffix of `c1` and look for it in `c2`.
    let mut best = 0usize;
    let mut length = 1usize;
    loop {
        let pattern = &c1[min_len - length..];
        match find(c2, pattern, 0) {
            None => return best,
            Some(found) => {
                length += found;
                if found == 0 || c1[min_len - length..] == c2[..length] {
                    best = length;
                    length += 1;
                }
            }
        }
        if length > min_len {
            return best;
        }
    }
}

/// First occurrence of `needle` in `haystack` starting at or after `from`.
pub fn find(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    if needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Last occurrence of `needle` in `haystack` starting at or before `from`.
pub fn rfind(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last = from.min(haystack.len() - needle.len());
    (0..=last)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Char-indexed slice with clamped bounds; a reversed range is swapped.
pub fn substring(chars: &[char], start: usize, end: usize) -> &[char] {
    let start = start.min(chars.len());
    let end = end.min(chars.len());
    if start <= end {
        &chars[start..end]
    } else {
        &chars[end..start]
    }
}
