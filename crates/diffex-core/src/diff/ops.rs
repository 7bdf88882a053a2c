//! Read-only utilities over an edit script.

use super::{DiffOp, DiffOpType};
use crate::text::char_len;

/// Reconstruct the source text.
pub fn text1(diffs: &[DiffOp]) -> String {
    diffs
        .iter()
        .filter(|(op, _)| *op != DiffOpType::Ins)
        .map(|(_, text)| text.as_str())
        .collect()
}

/// Reconstruct the destination text.
pub fn text2(diffs: &[DiffOp]) -> String {
    diffs
        .iter()
        .filter(|(op, _)| *op != DiffOpType::Del)
        .map(|(_, text)| text.as_str())
        .collect()
}

/// Number of inserted, deleted or substituted chars. A deletion next to an
/// insertion counts as substitutions for the longer of the two.
pub fn levenshtein(diffs: &[DiffOp]) -> usize {
    let mut distance = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for (op, text) in diffs {
        match op {
            DiffOpType::Ins => insertions += char_len(text),
            DiffOpType::Del => deletions += char_len(text),
            DiffOpType::Eql => {
                distance += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    distance + insertions.max(deletions)
}

/// Translate a location in the source text into the destination text.
/// A location inside a deletion maps to the start of that deletion.
pub fn x_index(diffs: &[DiffOp], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut overshot = None;
    for (op, text) in diffs {
        let len = char_len(text);
        if *op != DiffOpType::Ins {
            chars1 += len;
        }
        if *op != DiffOpType::Del {
            chars2 += len;
        }
        if chars1 > loc {
            overshot = Some(*op);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }
    if overshot == Some(DiffOpType::Del) {
        return last_chars2;
    }
    last_chars2 + (loc - last_chars1)
}

/// Render the script as HTML with inline styles.
pub fn pretty_html(diffs: &[DiffOp]) -> String {
    let mut html = String::new();
    for (op, text) in diffs {
        let body = text
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('\n', "&para;<br>");
        match op {
            DiffOpType::Ins => {
                html.push_str("<ins style=\"background:#e6ffe6;\">");
                html.push_str(&body);
                html.push_str("</ins>");
            }
            DiffOpType::Del => {
                html.push_str("<del style=\"background:#ffe6e6;\">");
                html.push_str(&body);
                html.push_str("</del>");
            }
            DiffOpType::Eql => {
                html.push_str("<span>");
                html.push_str(&body);
                html.push_str("</span>");
            }
        }
    }
    html
}

/// Swap insertions and deletions so the script transforms text2 into text1.
pub fn invert(diffs: Vec<DiffOp>) -> Vec<DiffOp> {
    diffs
        .into_iter()
        .map(|(op, text)| {
            let inverted = match op {
                DiffOpType::Eql => DiffOpType::Eql,
                DiffOpType::Ins => DiffOpType::Del,
                DiffOpType::Del => DiffOpType::Ins,
            };
            (inverted, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use DiffOpType::{Del, Eql, Ins};

    fn d(op: DiffOpType, s: &str) -> DiffOp {
        (op, s.to_string())
    }

    #[test]
    fn reconstructs_both_sides() {
        let diffs = vec![
            d(Eql, "jump"),
            d(Del, "s"),
            d(Ins, "ed"),
            d(Eql, " over "),
            d(Del, "the"),
            d(Ins, "a"),
            d(Eql, " lazy"),
        ];
        assert_eq!(text1(&diffs), "jumps over the lazy");
        assert_eq!(text2(&diffs), "jumped over a lazy");
    }

    #[test]
    fn levenshtein_counts() {
        assert_eq!(levenshtein(&[d(Del, "abc"), d(Ins, "1234"), d(Eql, "xyz")]), 4);
        assert_eq!(levenshtein(&[d(Eql, "xyz"), d(Del, "abc"), d(Ins, "1234")]), 4);
        assert_eq!(levenshtein(&[d(Del, "abc"), d(Eql, "xyz"), d(Ins, "1234")]), 7);
    }

    #[test]
    fn x_index_translation() {
        assert_eq!(x_index(&[d(Del, "a"), d(Ins, "1234"), d(Eql, "xyz")], 2), 5);
        assert_eq!(x_index(&[d(Eql, "a"), d(Del, "1234"), d(Eql, "xyz")], 3), 1);
    }

    #[test]
    fn pretty_html_escapes() {
        let diffs = vec![d(Eql, "a\n"), d(Del, "<B>b</B>"), d(Ins, "c&d")];
        assert_eq!(
            pretty_html(&diffs),
            "<span>a&para;<br></span><del style=\"background:#ffe6e6;\">&lt;B&gt;b&lt;/B&gt;</del><ins style=\"background:#e6ffe6;\">c&amp;d</ins>"
        );
    }

    #[test]
    fn invert_swaps_sides() {
        let diffs = vec![d(Eql, "a"), d(Del, "b"), d(Ins, "X"), d(Eql, "c")];
        let inv = invert(diffs.clone());
        assert_eq!(text1(&inv), text2(&diffs));
        assert_eq!(text2(&inv), text1(&diffs));
    }
}
