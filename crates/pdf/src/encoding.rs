//! WinAnsiEncoding for the standard-14 fonts.

/// Code points in 0x80..=0x9F that WinAnsi assigns, as (byte, char).
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// WinAnsi byte for `c`, if it has one.
pub(crate) fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(_, mapped)| *mapped == c)
            .map(|(byte, _)| *byte),
    }
}

/// Encode `text` for a standard-14 font, or return the first character
/// WinAnsi cannot represent.
pub(crate) fn encode_win_ansi(text: &str) -> Result<Vec<u8>, char> {
    text.chars()
        .map(|c| match c {
            '\t' => Ok(b' '),
            _ => win_ansi_byte(c).ok_or(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_ansi_mapping() {
        assert_eq!(win_ansi_byte('A'), Some(0x41));
        assert_eq!(win_ansi_byte('\u{2022}'), Some(0x95));
        assert_eq!(win_ansi_byte('\u{2014}'), Some(0x97));
        assert_eq!(win_ansi_byte('\u{20AC}'), Some(0x80));
        assert_eq!(win_ansi_byte('\u{00E9}'), Some(0xE9));
        assert_eq!(win_ansi_byte('\u{0081}'), None);
        assert_eq!(win_ansi_byte('\u{0928}'), None);
    }

    #[test]
    fn test_first_unmappable_reported() {
        assert_eq!(encode_win_ansi("a\t\u{2022}"), Ok(vec![b'a', b' ', 0x95]));
        assert_eq!(encode_win_ansi("a\u{0928}\u{092E}"), Err('\u{0928}'));
    }
}
