//! Identifier character sets and string encodings
//!
//! ISO 9660 restricts descriptor identifiers to small ASCII character
//! sets (a-characters, d-characters) and pads fixed-width fields with
//! fillers. Supplementary and Enhanced descriptors re-encode names as
//! UCS-2 big-endian (Joliet) or UTF-8.

use alloc::string::String;
use alloc::vec::Vec;

/// Filler code point for padded string fields
pub const FILLER: char = ' ';

/// a-characters: uppercase letters, digits, underscore, a small set of
/// punctuation, and space (ECMA-119 7.4.1)
pub fn is_a_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '0'..='9' | '_' | ' '
        | '!' | '"' | '%' | '&' | '\'' | '(' | ')' | '*' | '+' | ','
        | '-' | '.' | '/' | ':' | ';' | '<' | '=' | '>' | '?')
}

/// d-characters: uppercase letters, digits, underscore (ECMA-119 7.4.1)
pub fn is_d_char(c: char) -> bool {
    matches!(c, 'A'..='Z' | '0'..='9' | '_')
}

/// Separators used inside file identifiers
pub fn is_separator(c: char) -> bool {
    matches!(c, '.' | ';')
}

/// Test every code point against the a-character set; empty strings pass
pub fn is_a_string(s: &str) -> bool {
    s.chars().all(is_a_char)
}

/// Test every code point against the d-character set; empty strings pass
pub fn is_d_string(s: &str) -> bool {
    s.chars().all(is_d_char)
}

/// d-characters plus separators, used for file-identifier fields
pub fn is_d_or_separator_string(s: &str) -> bool {
    s.chars().all(|c| is_d_char(c) || is_separator(c))
}

/// Strip a version suffix from a file identifier (`"FILE.TXT;1"` ->
/// `"FILE.TXT"`), and a trailing dot left by an empty extension
pub fn strip_version(name: &str) -> &str {
    let base = name.split(';').next().unwrap_or(name);
    base.strip_suffix('.').unwrap_or(base)
}

/// String encoding of identifier fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Plain ASCII (Primary descriptors)
    #[default]
    Ascii,
    /// UCS-2 big-endian (Joliet)
    Ucs2Be,
    /// UTF-8 (some Enhanced descriptors)
    Utf8,
}

impl TextEncoding {
    /// Encoded form of one filler code point
    pub fn filler_unit(&self) -> &'static [u8] {
        match self {
            Self::Ascii | Self::Utf8 => b" ",
            Self::Ucs2Be => &[0x00, 0x20],
        }
    }

    /// Encode a string; code points the encoding cannot carry become `_`
    pub fn encode(&self, s: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for c in s.chars() {
            self.encode_char(c, &mut out);
        }
        out
    }

    fn encode_char(&self, c: char, out: &mut Vec<u8>) {
        match self {
            Self::Ascii => out.push(if c.is_ascii() { c as u8 } else { b'_' }),
            Self::Utf8 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            Self::Ucs2Be => {
                let code = c as u32;
                if code <= 0xFFFF {
                    out.extend_from_slice(&(code as u16).to_be_bytes());
                } else {
                    out.extend_from_slice(&(b'_' as u16).to_be_bytes());
                }
            }
        }
    }

    /// Decode bytes, substituting the replacement character where the
    /// input is not valid in this encoding
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii => bytes
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        b as char
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ucs2Be => bytes
                .chunks(2)
                .map(|pair| {
                    if pair.len() < 2 {
                        return char::REPLACEMENT_CHARACTER;
                    }
                    let code = u16::from_be_bytes([pair[0], pair[1]]);
                    char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
                })
                .collect(),
        }
    }

    /// Encode at most `max_bytes` bytes, truncating at a whole code
    /// unit
    pub fn encode_truncated(&self, s: &str, max_bytes: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for c in s.chars() {
            let mut unit = Vec::new();
            self.encode_char(c, &mut unit);
            if out.len() + unit.len() > max_bytes {
                break;
            }
            out.extend_from_slice(&unit);
        }
        out
    }

    /// Serialize into exactly `width` bytes
    ///
    /// Code points are encoded greedily; the first one that would
    /// overflow the field is dropped along with the rest (a multi-byte
    /// code unit is never split). The remainder is filled with encoded
    /// fillers, and any tail too short for a whole filler unit is
    /// zero-filled.
    pub fn encode_padded(&self, s: &str, width: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(width);
        for c in s.chars() {
            let mut unit = Vec::new();
            self.encode_char(c, &mut unit);
            if out.len() + unit.len() > width {
                break;
            }
            out.extend_from_slice(&unit);
        }
        let filler = self.filler_unit();
        while out.len() + filler.len() <= width {
            out.extend_from_slice(filler);
        }
        while out.len() < width {
            out.push(0);
        }
        out
    }

    /// Deserialize a fixed-width field, stripping trailing filler
    pub fn decode_padded(&self, bytes: &[u8]) -> String {
        let filler = self.filler_unit();
        let mut end = bytes.len();
        // Drop a zero-filled tail shorter than one filler unit first.
        while end > 0 && bytes[end - 1] == 0 && !end.is_multiple_of(filler.len()) {
            end -= 1;
        }
        while end >= filler.len() && &bytes[end - filler.len()..end] == filler {
            end -= filler.len();
        }
        self.decode(&bytes[..end])
    }
}

/// A descriptor field holding either a plain identifier or a reference
/// to a file in the root directory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentifierOrFile {
    /// Field is unused
    #[default]
    Empty,
    /// Identifier recorded directly in the descriptor
    Identifier(String),
    /// Identifier of a file holding the actual value, tagged by a
    /// leading `_` (0x5F) byte
    File(String),
}

impl IdentifierOrFile {
    /// Serialize into exactly `width` bytes
    pub fn serialize(&self, encoding: TextEncoding, width: usize) -> Vec<u8> {
        match self {
            Self::Empty => encoding.encode_padded("", width),
            Self::Identifier(s) => encoding.encode_padded(s, width),
            Self::File(s) => {
                let mut tagged = String::with_capacity(s.len() + 1);
                tagged.push('_');
                tagged.push_str(s);
                encoding.encode_padded(&tagged, width)
            }
        }
    }

    /// Deserialize a fixed-width field
    pub fn deserialize(encoding: TextEncoding, bytes: &[u8]) -> Self {
        let text = encoding.decode_padded(bytes);
        if text.is_empty() {
            Self::Empty
        } else if let Some(rest) = text.strip_prefix('_') {
            Self::File(String::from(rest))
        } else {
            Self::Identifier(text)
        }
    }
}
