//! Helvetica / Helvetica-Bold（PDF 標準 14 フォント）の文字幅と WinAnsi 符号化。
//!
//! ページ分割と PDF 出力は同じ表を参照する。幅は 1000 単位/em。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    pub fn base_name(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// 0x20..=0x7E
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

const DEFAULT_WIDTH: u16 = 556;

/// 文字を WinAnsiEncoding の 1 バイトに変換する。表現できない文字は '?' になる。
pub fn encode_char(ch: char) -> u8 {
    match ch {
        '\u{20}'..='\u{7E}' => ch as u8,
        '\u{A0}'..='\u{FF}' => ch as u8,
        '€' => 0x80,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        '\t' => b' ',
        _ => b'?',
    }
}

pub fn encode(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// WinAnsi の 1 バイトに対する字幅。
pub fn byte_width(font: Font, code: u8) -> u16 {
    if (0x20..=0x7E).contains(&code) {
        let table = match font {
            Font::Helvetica => &HELVETICA_ASCII,
            Font::HelveticaBold => &HELVETICA_BOLD_ASCII,
        };
        return table[(code - 0x20) as usize];
    }
    let bold = font == Font::HelveticaBold;
    match code {
        0x80 => 556,
        0x85 | 0x97 | 0x99 => 1000,
        0x91 | 0x92 => {
            if bold {
                278
            } else {
                222
            }
        }
        0x93 | 0x94 => {
            if bold {
                500
            } else {
                333
            }
        }
        0x95 => 350,
        0xA0 => 278,
        0xA7 => 556,
        0xAA => 370,
        0xB0 => 400,
        0xBA => 365,
        0xAB | 0xBB => 556,
        0xB7 => 278,
        _ => base_letter(code).map_or(DEFAULT_WIDTH, |b| byte_width(font, b)),
    }
}

/// Latin-1 のアクセント付き文字を基本字に対応付ける。
fn base_letter(code: u8) -> Option<u8> {
    let base = match code {
        0xC0..=0xC5 => b'A',
        0xC7 => b'C',
        0xC8..=0xCB => b'E',
        0xCC..=0xCF => b'I',
        0xD1 => b'N',
        0xD2..=0xD6 | 0xD8 => b'O',
        0xD9..=0xDC => b'U',
        0xDD => b'Y',
        0xE0..=0xE5 => b'a',
        0xE7 => b'c',
        0xE8..=0xEB => b'e',
        0xEC..=0xEF => b'i',
        0xF1 => b'n',
        0xF2..=0xF6 | 0xF8 => b'o',
        0xF9..=0xFC => b'u',
        0xFD | 0xFF => b'y',
        _ => return None,
    };
    Some(base)
}

/// フォントサイズ size で text を描画したときの幅（pt）。
pub fn text_width(font: Font, text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|ch| u32::from(byte_width(font, encode_char(ch))))
        .sum();
    units as f32 * size / 1000.0
}
