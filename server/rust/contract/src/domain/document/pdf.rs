//! PDF 1.4 の最小限のオブジェクト書き出しと JPEG ヘッダーの解析。
//!
//! 生成されるバイト列は入力だけで決まる（作成日時・ID を含めない）。

use std::fmt::Write as _;

use super::font_metrics::encode;

/// JpegInfo は DCTDecode でそのまま埋め込むために必要な JPEG の属性。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub bits_per_component: u8,
}

impl JpegInfo {
    pub fn color_space(&self) -> &'static str {
        match self.components {
            1 => "/DeviceGray",
            4 => "/DeviceCMYK",
            _ => "/DeviceRGB",
        }
    }
}

/// SOF マーカーを探して寸法と色成分数を読み取る。JPEG でなければ None。
pub fn parse_jpeg(bytes: &[u8]) -> Option<JpegInfo> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // フィルバイト
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == 0xD8 || (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        if marker == 0xD9 || marker == 0xDA {
            return None;
        }
        let length = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        if length < 2 {
            return None;
        }
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let seg = bytes.get(pos + 4..pos + 2 + length)?;
            if seg.len() < 6 {
                return None;
            }
            let info = JpegInfo {
                bits_per_component: seg[0],
                height: u32::from(u16::from_be_bytes([seg[1], seg[2]])),
                width: u32::from(u16::from_be_bytes([seg[3], seg[4]])),
                components: seg[5],
            };
            if info.width == 0 || info.height == 0 || !matches!(info.components, 1 | 3 | 4) {
                return None;
            }
            return Some(info);
        }
        pos += 2 + length;
    }
    None
}

/// PdfWriter は番号付きオブジェクトを順に追記し、最後に xref と trailer を付ける。
/// オブジェクト番号は 1 から予約順に割り当てられ、書き込みは番号順でなければならない。
pub struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(16 * 1024);
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// 次に書き込むオブジェクトの番号。
    pub fn next_id(&self) -> usize {
        self.offsets.len() + 1
    }

    pub fn object(&mut self, body: &str) -> usize {
        let id = self.begin();
        self.buf.extend_from_slice(body.as_bytes());
        self.end();
        id
    }

    /// dict は `<<` と `>>` を含まない辞書の中身。/Length は自動で付く。
    pub fn stream(&mut self, dict: &str, data: &[u8]) -> usize {
        let id = self.begin();
        let header = if dict.is_empty() {
            format!("<< /Length {} >>\nstream\n", data.len())
        } else {
            format!("<< {} /Length {} >>\nstream\n", dict, data.len())
        };
        self.buf.extend_from_slice(header.as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream");
        self.end();
        id
    }

    fn begin(&mut self) -> usize {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        id
    }

    fn end(&mut self) {
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    pub fn finish(mut self, root: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let mut xref = String::new();
        let _ = writeln!(xref, "xref\n0 {}", self.offsets.len() + 1);
        xref.push_str("0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.offsets.len() + 1,
            root,
            xref_offset
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// テキストを WinAnsi に符号化し、PDF のリテラル文字列 `( ... )` にする。
pub fn literal_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for byte in encode(text) {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(char::from(byte));
            }
            0x20..=0x7E => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\{byte:03o}");
            }
        }
    }
    out.push(')');
    out
}

/// 座標値を固定小数 2 桁で書く。-0.00 は 0.00 に正規化する。
pub fn num(value: f32) -> String {
    let s = format!("{value:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_jpeg;

    #[test]
    fn parses_sof0_dimensions() {
        let info = parse_jpeg(&sample_jpeg(640, 480, 3)).unwrap();
        assert_eq!(info.width, 640);
        assert_eq!(info.height, 480);
        assert_eq!(info.components, 3);
        assert_eq!(info.color_space(), "/DeviceRGB");
    }

    #[test]
    fn rejects_non_jpeg_payloads() {
        assert!(parse_jpeg(b"\x89PNG\r\n\x1a\n0000").is_none());
        assert!(parse_jpeg(b"<html>not found</html>").is_none());
        assert!(parse_jpeg(&[0xFF, 0xD8, 0xFF]).is_none());
    }

    #[test]
    fn literal_string_escapes_delimiters_and_non_ascii() {
        assert_eq!(literal_string("a(b)\\"), "(a\\(b\\)\\\\)");
        assert_eq!(literal_string("ção"), "(\\347\\343o)");
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut writer = PdfWriter::new();
        let first = writer.object("<< /Type /Catalog >>");
        let second = writer.stream("", b"BT ET");
        assert_eq!((first, second), (1, 2));
        let bytes = writer.finish(first);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));

        let xref_at = text.find("xref\n").unwrap();
        let entries: Vec<usize> = text[xref_at..]
            .lines()
            .skip(3)
            .take(2)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert!(bytes[entries[0]..].starts_with(b"1 0 obj"));
        assert!(bytes[entries[1]..].starts_with(b"2 0 obj"));
    }

    #[test]
    fn numbers_have_fixed_precision() {
        assert_eq!(num(1.0), "1.00");
        assert_eq!(num(-0.001), "0.00");
        assert_eq!(num(595.28), "595.28");
    }
}
