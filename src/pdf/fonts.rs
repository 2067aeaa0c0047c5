/// The three faces the payslip uses, all PDF standard Type1 fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic];

    pub fn base_font(self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Italic => "Helvetica-Oblique",
        }
    }

    /// Name of the font in each page's resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Italic => "F3",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontStyle::Regular | FontStyle::Italic => &HELVETICA,
            FontStyle::Bold => &HELVETICA_BOLD,
        }
    }

    /// Advance width of `text` in points at `size` points.
    pub fn text_width(self, text: &[u8], size: f32) -> f32 {
        let widths = self.widths();
        let units: u32 = text
            .iter()
            .map(|&b| match b {
                32..=126 => u32::from(widths[usize::from(b - 32)]),
                _ => FALLBACK_WIDTH,
            })
            .sum();
        units as f32 * size / 1000.0
    }
}

const FALLBACK_WIDTH: u32 = 556;

// Glyph widths for ' ' through '~', in 1/1000 em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Map text onto WinAnsi bytes; anything outside Latin-1 prints as `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            cp @ 0x20..=0x7e | cp @ 0xa0..=0xff => cp as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_tables_cover_printable_ascii() {
        assert_eq!(HELVETICA.len(), usize::from(b'~' - b' ') + 1);
        // spot checks against the AFM files
        assert_eq!(HELVETICA[usize::from(b'A' - 32)], 667);
        assert_eq!(HELVETICA[usize::from(b'i' - 32)], 222);
        assert_eq!(HELVETICA_BOLD[usize::from(b'i' - 32)], 278);
        assert_eq!(HELVETICA_BOLD[usize::from(b'@' - 32)], 975);
    }

    #[test]
    fn digits_are_fixed_width() {
        let a = FontStyle::Regular.text_width(b"10000.00", 10.0);
        let b = FontStyle::Regular.text_width(b"99999.99", 10.0);
        assert_eq!(a, b);
        assert!((FontStyle::Regular.text_width(b"0", 10.0) - 5.56).abs() < 1e-4);
    }

    #[test]
    fn bold_runs_wider_than_regular() {
        let text = b"SALARY STATEMENT";
        assert!(FontStyle::Bold.text_width(text, 12.0) > FontStyle::Regular.text_width(text, 12.0));
    }

    #[test]
    fn non_latin_text_degrades_to_question_marks() {
        assert_eq!(encode_win_ansi("Zoë"), b"Zo\xeb".to_vec());
        assert_eq!(encode_win_ansi("₹ 5"), b"? 5".to_vec());
    }
}
