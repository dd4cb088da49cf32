//! WinAnsiEncoding (Windows-1252) for simple-font text strings.

/// Code points for bytes 0x80..=0x9F; `None` marks undefined slots.
#[rustfmt::skip]
const HIGH_CONTROL: [Option<char>; 32] = [
    Some('\u{20AC}'), None,             Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None,             Some('\u{017D}'), None,
    None,             Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None,             Some('\u{017E}'), Some('\u{0178}'),
];

pub const UNMAPPABLE: u8 = b'?';

pub fn encode_char(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => HIGH_CONTROL
            .iter()
            .position(|m| *m == Some(c))
            .map(|i| 0x80 + i as u8),
    }
}

pub fn decode_byte(b: u8) -> Option<char> {
    match b {
        0x20..=0x7E | 0xA0..=0xFF => Some(b as char),
        0x80..=0x9F => HIGH_CONTROL[(b - 0x80) as usize],
        _ => None,
    }
}

/// Encodes text to WinAnsi bytes. Tabs become spaces, anything else outside the
/// code page becomes `?`.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            c => encode_char(c).unwrap_or(UNMAPPABLE),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_and_latin1_pass_through() {
        assert_eq!(encode("Zoë"), vec![b'Z', b'o', 0xEB]);
    }

    #[test]
    fn test_typographic_punctuation_maps_to_high_control_range() {
        assert_eq!(encode("\u{2013}\u{2019}\u{20AC}"), vec![0x96, 0x92, 0x80]);
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        assert_eq!(encode("日本"), vec![UNMAPPABLE, UNMAPPABLE]);
    }

    #[test]
    fn test_decode_inverts_encode() {
        for b in (0x20u8..=0xFF).filter(|b| decode_byte(*b).is_some()) {
            let c = decode_byte(b).unwrap();
            assert_eq!(encode_char(c), Some(b), "byte {b:#x}");
        }
    }
}
