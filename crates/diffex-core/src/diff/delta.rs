//! Compact delta encoding of an edit script.
//!
//! Tab-separated tokens: `=N` keeps N source chars, `-N` drops N source chars,
//! `+text` inserts URI-escaped text. Given the source text, a delta fully
//! reconstructs the script.

use super::{DiffOp, DiffOpType, Diffs};
use crate::error::{Error, Result};
use crate::escape::{decode_uri, encode_uri};
use crate::text::{char_len, chars, to_string};

pub fn to_delta(diffs: &[DiffOp]) -> String {
    let tokens: Vec<String> = diffs
        .iter()
        .map(|(op, text)| match op {
            DiffOpType::Ins => format!("+{}", encode_uri(text)),
            DiffOpType::Del => format!("-{}", char_len(text)),
            DiffOpType::Eql => format!("={}", char_len(text)),
        })
        .collect();
    tokens.join("\t").replace("%20", " ")
}

pub fn from_delta(text1: &str, delta: &str) -> Result<Diffs> {
    let source = chars(text1);
    let mut diffs = Diffs::new();
    let mut pointer = 0usize;
    for token in delta.split('\t') {
        let mut rest = token.chars();
        let Some(op) = rest.next() else {
            // Blank tokens are fine.
            continue;
        };
        let param = rest.as_str();
        match op {
            '+' => {
                let text = decode_uri(param)
                    .ok_or_else(|| Error::InvalidDelta(format!("illegal escape in {param}")))?;
                diffs.push((DiffOpType::Ins, text));
            }
            '-' | '=' => {
                let n: usize = param
                    .parse()
                    .map_err(|_| Error::InvalidDelta(format!("invalid number in {token}")))?;
                let end = pointer + n;
                if end > source.len() {
                    return Err(Error::InvalidDelta(format!(
                        "delta length ({end}) larger than source text length ({})",
                        source.len()
                    )));
                }
                let text = to_string(&source[pointer..end]);
                pointer = end;
                let op = if op == '=' {
                    DiffOpType::Eql
                } else {
                    DiffOpType::Del
                };
                diffs.push((op, text));
            }
            _ => {
                return Err(Error::InvalidDelta(format!(
                    "invalid diff operation in {token}"
                )))
            }
        }
    }
    if pointer != source.len() {
        return Err(Error::InvalidDelta(format!(
            "delta length ({pointer}) does not equal source text length ({})",
            source.len()
        )));
    }
    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::text1;
    use DiffOpType::{Del, Eql, Ins};

    fn d(op: DiffOpType, s: &str) -> DiffOp {
        (op, s.to_string())
    }

    #[test]
    fn delta_basic() {
        let diffs = vec![
            d(Eql, "jump"),
            d(Del, "s"),
            d(Ins, "ed"),
            d(Eql, " over "),
            d(Del, "the"),
            d(Ins, "a"),
            d(Eql, " lazy"),
            d(Ins, "old dog"),
        ];
        let source = text1(&diffs);
        assert_eq!(source, "jumps over the lazy");
        let delta = to_delta(&diffs);
        assert_eq!(delta, "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog");
        assert_eq!(from_delta(&source, &delta), Ok(diffs));
    }

    #[test]
    fn delta_rejects_length_mismatch() {
        assert!(matches!(
            from_delta("jumps over the lazyx", "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog"),
            Err(Error::InvalidDelta(_))
        ));
        assert!(matches!(
            from_delta("umps over the lazy", "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog"),
            Err(Error::InvalidDelta(_))
        ));
    }

    #[test]
    fn delta_rejects_bad_tokens() {
        assert!(matches!(from_delta("", "+%c3%xy"), Err(Error::InvalidDelta(_))));
        assert!(matches!(from_delta("abc", "=-3"), Err(Error::InvalidDelta(_))));
        assert!(matches!(from_delta("abc", "=x"), Err(Error::InvalidDelta(_))));
        assert!(matches!(from_delta("abc", "*3"), Err(Error::InvalidDelta(_))));
    }

    #[test]
    fn delta_skips_blank_tokens() {
        assert_eq!(
            from_delta("ab", "=1\t\t+x\t=1"),
            Ok(vec![d(Eql, "a"), d(Ins, "x"), d(Eql, "b")])
        );
    }

    #[test]
    fn delta_unicode() {
        let diffs = vec![
            d(Eql, "\u{0680} \x00 \t %"),
            d(Del, "\u{0681} \x01 \n ^"),
            d(Ins, "\u{0682} \x02 \\ |"),
        ];
        let delta = to_delta(&diffs);
        assert_eq!(delta, "=7\t-7\t+%DA%82 %02 %5C %7C");
        assert_eq!(from_delta(&text1(&diffs), &delta), Ok(diffs));
    }

    #[test]
    fn delta_unescaped_chars() {
        let diffs = vec![d(Ins, "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ")];
        let delta = to_delta(&diffs);
        assert_eq!(delta, "+A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ");
        assert_eq!(from_delta("", &delta), Ok(diffs));
    }
}
