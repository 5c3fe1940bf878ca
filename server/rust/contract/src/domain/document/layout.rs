use serde::{Deserialize, Serialize};

use super::font_metrics::Font;

/// PageGeometry はページの絶対寸法（pt）と行送りの設定。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// 上余白の直下に置かれるヘッダー帯の高さ
    pub header_height: f32,
    pub font_size: f32,
    pub line_height: f32,
    /// 番号付き条項の前に追加する余白
    pub clause_spacing: f32,
}

impl PageGeometry {
    /// A4 縦（595.28 x 841.89 pt）。
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 50.0,
            header_height: 40.0,
            font_size: 10.5,
            line_height: 15.0,
            clause_spacing: 7.5,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// 本文の開始位置（ページ上端からの距離）。全ページ共通。
    pub fn content_top(&self) -> f32 {
        self.margin + self.header_height
    }

    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin
    }

    pub fn usable_height(&self) -> f32 {
        self.content_bottom() - self.content_top()
    }

    pub fn lines_per_page(&self) -> usize {
        (self.usable_height() / self.line_height).floor().max(0.0) as usize
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextStyle {
    Regular,
    /// 条項見出し・署名欄ラベル
    Emphasized,
}

impl TextStyle {
    pub fn font(self) -> Font {
        match self {
            TextStyle::Regular => Font::Helvetica,
            TextStyle::Emphasized => Font::HelveticaBold,
        }
    }
}

/// Block はページ上に配置された描画要素。y はページ上端から行ボックス上端までの距離。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    TextLine {
        x: f32,
        y: f32,
        content: String,
        style: TextStyle,
    },
    Image {
        x: f32,
        y: f32,
        source_url: String,
        max_width: f32,
        max_height: f32,
    },
}

impl Block {
    pub fn top(&self) -> f32 {
        match self {
            Block::TextLine { y, .. } | Block::Image { y, .. } => *y,
        }
    }

    /// ブロック下端。テキスト行は行送り 1 行分の高さを持つ。
    pub fn bottom(&self, geometry: &PageGeometry) -> f32 {
        match self {
            Block::TextLine { y, .. } => y + geometry.line_height,
            Block::Image { y, max_height, .. } => y + max_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBand {
    pub title: String,
    pub height: f32,
}

/// Watermark は本文の配置とは無関係に全ページへ斜めに重ねる薄い文字列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    pub text: String,
    pub font_size: f32,
    pub opacity: f32,
    pub angle_degrees: f32,
}

impl Watermark {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 60.0,
            opacity: 0.08,
            angle_degrees: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Text,
    /// パスポート画像 1 枚だけを載せる追加ページ
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub kind: PageKind,
    pub header: HeaderBand,
    pub watermark: Watermark,
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn text_lines(&self) -> impl Iterator<Item = (&str, TextStyle)> {
        self.blocks.iter().filter_map(|b| match b {
            Block::TextLine { content, style, .. } => Some((content.as_str(), *style)),
            Block::Image { .. } => None,
        })
    }

    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Image { source_url, .. } => Some(source_url.as_str()),
            Block::TextLine { .. } => None,
        })
    }
}

/// PaginatedDocument は生成中のみ存在するレイアウト結果。永続化しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl PaginatedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn text_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.kind == PageKind::Text)
    }

    pub fn image_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.kind == PageKind::Image)
    }
}

/// Signatory は署名欄 1 名分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signatory {
    pub label: String,
    pub name: String,
    pub identifiers: Vec<String>,
}

/// SignatureBlock は本文末尾に置く 2 名分の署名欄。ページをまたいで分割しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureBlock {
    pub partner: Signatory,
    pub counterparty: Signatory,
}

/// LayoutOptions はページ分割時に本文以外で必要となる固定要素。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub geometry: PageGeometry,
    pub header_title: String,
    pub watermark: Watermark,
    pub signatures: SignatureBlock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_content_area() {
        let g = PageGeometry::a4();
        assert!((g.content_width() - 495.28).abs() < 0.01);
        assert!((g.content_top() - 90.0).abs() < f32::EPSILON);
        assert!((g.content_bottom() - 791.89).abs() < 0.01);
        assert_eq!(g.lines_per_page(), 46);
    }

    #[test]
    fn block_bottom_uses_line_height() {
        let g = PageGeometry::a4();
        let line = Block::TextLine {
            x: g.margin,
            y: 100.0,
            content: "x".to_string(),
            style: TextStyle::Regular,
        };
        assert!((line.bottom(&g) - 115.0).abs() < f32::EPSILON);
    }
}
