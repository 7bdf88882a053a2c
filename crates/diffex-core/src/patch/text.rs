//! GNU-diff-like text form of a patch list.
//!
//! ```text
//! @@ -21,18 +22,17 @@
//!  jump
//! -s
//! +ed
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::Patch;
use crate::diff::DiffOpType;
use crate::error::{Error, Result};
use crate::escape::{decode_uri, encode_uri};

impl Patch {
    /// The `@@ -a,b +c,d @@` line heading this hunk.
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            coords(self.start1, self.length1),
            coords(self.start2, self.length2)
        )
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        for (op, text) in &self.diffs {
            let sign = match op {
                DiffOpType::Ins => '+',
                DiffOpType::Del => '-',
                DiffOpType::Eql => ' ',
            };
            writeln!(f, "{sign}{}", encode_uri(text).replace("%20", " "))?;
        }
        Ok(())
    }
}

/// 1-based `start,length`; a length of 1 is implied and an empty span keeps
/// its 0-based start.
fn coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{length}", start + 1),
    }
}

pub fn to_text(patches: &[Patch]) -> String {
    patches.iter().map(Patch::to_string).collect()
}

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@@ -(\d+),?(\d*) \+(\d+),?(\d*) @@$").expect("static patch header regex")
    })
}

pub fn from_text(text: &str) -> Result<Vec<Patch>> {
    let mut patches = Vec::new();
    if text.is_empty() {
        return Ok(patches);
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let mut i = 0;
    while i < lines.len() {
        let caps = header_regex()
            .captures(lines[i])
            .ok_or_else(|| Error::InvalidPatch(format!("invalid patch string: {}", lines[i])))?;
        let mut patch = Patch::default();
        (patch.start1, patch.length1) = span(&caps[1], &caps[2], lines[i])?;
        (patch.start2, patch.length2) = span(&caps[3], &caps[4], lines[i])?;
        i += 1;

        while i < lines.len() {
            let line = lines[i];
            let Some(sign) = line.chars().next() else {
                // Blank line? Whatever.
                i += 1;
                continue;
            };
            let op = match sign {
                '@' => break,
                '-' => DiffOpType::Del,
                '+' => DiffOpType::Ins,
                ' ' => DiffOpType::Eql,
                _ => {
                    return Err(Error::InvalidPatch(format!(
                        "invalid patch mode '{sign}' in: {line}"
                    )))
                }
            };
            let body = decode_uri(&line[sign.len_utf8()..])
                .ok_or_else(|| Error::InvalidPatch(format!("illegal escape in: {line}")))?;
            patch.diffs.push((op, body));
            i += 1;
        }
        patches.push(patch);
    }
    Ok(patches)
}

/// Decode one `start[,length]` header field into a 0-based start and length.
fn span(start: &str, length: &str, header: &str) -> Result<(usize, usize)> {
    let invalid = || Error::InvalidPatch(format!("invalid patch header: {header}"));
    let start: usize = start.parse().map_err(|_| invalid())?;
    match length {
        "" => Ok((start.checked_sub(1).ok_or_else(invalid)?, 1)),
        "0" => Ok((start, 0)),
        _ => {
            let length = length.parse().map_err(|_| invalid())?;
            Ok((start.checked_sub(1).ok_or_else(invalid)?, length))
        }
    }
}
