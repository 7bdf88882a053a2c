//! URI-style escaping used by the delta and patch text formats.
//!
//! Encoding leaves `A-Z a-z 0-9 ; , / ? : @ & = + $ - _ . ! ~ * ' ( ) #`
//! untouched and writes every other char as uppercase `%XX` UTF-8 bytes.
//! Decoding is the inverse, except that escapes of the reserved set
//! `; / ? : @ & = + $ , #` are kept verbatim.

const UNESCAPED: &str = ";,/?:@&=+$-_.!~*'()#";
const RESERVED: &str = ";/?:@&=+$,#";

pub fn encode_uri(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || UNESCAPED.contains(c) {
            out.push(c);
            continue;
        }
        for byte in c.encode_utf8(&mut buf).bytes() {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Returns `None` on a malformed escape or an invalid UTF-8 sequence.
pub fn decode_uri(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            // Copy the run up to the next escape as is.
            let next = text[i..].find('%').map_or(bytes.len(), |n| i + n);
            out.push_str(&text[i..next]);
            i = next;
            continue;
        }
        let lead = hex_byte(bytes, i)?;
        if lead < 0x80 {
            let c = char::from(lead);
            if RESERVED.contains(c) {
                out.push_str(&text[i..i + 3]);
            } else {
                out.push(c);
            }
            i += 3;
            continue;
        }
        let width = match lead {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return None,
        };
        let mut seq = [0u8; 4];
        seq[0] = lead;
        for (k, slot) in seq.iter_mut().enumerate().take(width).skip(1) {
            let byte = hex_byte(bytes, i + 3 * k)?;
            if byte & 0xC0 != 0x80 {
                return None;
            }
            *slot = byte;
        }
        let decoded = std::str::from_utf8(&seq[..width]).ok()?;
        out.push_str(decoded);
        i += 3 * width;
    }
    Some(out)
}

fn hex_byte(bytes: &[u8], at: usize) -> Option<u8> {
    if bytes.get(at) != Some(&b'%') {
        return None;
    }
    let hi = char::from(*bytes.get(at + 1)?).to_digit(16)?;
    let lo = char::from(*bytes.get(at + 2)?).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}
