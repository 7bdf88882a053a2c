//! Line-level encoding for the line-mode speedup.
//!
//! Every distinct line (trailing `\n` included) is assigned an id and replaced
//! by one synthetic char, so a line diff becomes an ordinary char diff. Id 0
//! is reserved and maps to the empty line.

use std::collections::HashMap;

use super::Diffs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEncoding {
    pub chars1: Vec<char>,
    pub chars2: Vec<char>,
    /// Line text by id.
    pub line_array: Vec<String>,
}

pub fn lines_to_chars(text1: &str, text2: &str) -> LineEncoding {
    let c1: Vec<char> = text1.chars().collect();
    let c2: Vec<char> = text2.chars().collect();
    lines_to_chars_slices(&c1, &c2)
}

pub(crate) fn lines_to_chars_slices(text1: &[char], text2: &[char]) -> LineEncoding {
    let mut table = LineTable {
        line_array: vec![String::new()],
        line_hash: HashMap::new(),
    };
    let chars1 = table.encode(text1);
    let chars2 = table.encode(text2);
    LineEncoding {
        chars1,
        chars2,
        line_array: table.line_array,
    }
}

/// Expand every encoded span back into its lines.
pub fn chars_to_lines(diffs: &mut Diffs, line_array: &[String]) {
    for (_, text) in diffs.iter_mut() {
        let mut decoded = String::new();
        for c in text.chars() {
            if let Some(line) = line_array.get(char_to_id(c)) {
                decoded.push_str(line);
            }
        }
        *text = decoded;
    }
}

struct LineTable {
    line_array: Vec<String>,
    line_hash: HashMap<String, usize>,
}

impl LineTable {
    fn encode(&mut self, text: &[char]) -> Vec<char> {
        let mut encoded = Vec::new();
        let mut line_start = 0usize;
        while line_start < text.len() {
            let next_id = self.line_array.len();
            // Once ids run out the rest of the text becomes one line.
            let line_end = if id_to_char(next_id).is_none() {
                text.len()
            } else {
                text[line_start..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(text.len(), |i| line_start + i + 1)
            };
            let line: String = text[line_start..line_end].iter().collect();
            let id = match self.line_hash.get(&line) {
                Some(&id) => id,
                None => {
                    self.line_array.push(line.clone());
                    self.line_hash.insert(line, next_id);
                    next_id
                }
            };
            if let Some(c) = id_to_char(id) {
                encoded.push(c);
            }
            line_start = line_end;
        }
        encoded
    }
}

// Ids skip the surrogate block so that every id is a valid char.
const SURROGATES: usize = 0x800;

fn id_to_char(id: usize) -> Option<char> {
    let code = if id < 0xD800 { id } else { id + SURROGATES };
    u32::try_from(code).ok().and_then(char::from_u32)
}

fn char_to_id(c: char) -> usize {
    let code = c as usize;
    if code < 0xD800 {
        code
    } else {
        code - SURROGATES
    }
}
