//! 置換済みテキストを固定サイズのページ列に分割する。
//!
//! 入力（テキストとレイアウト設定）だけから決まる純粋関数で、I/O もレンダラーへの依存も持たない。
//! 行幅の計測には PDF 出力と同じフォントメトリクスを使う。

use std::sync::LazyLock;

use regex::Regex;

use super::font_metrics::{text_width, Font};
use super::layout::{
    Block, HeaderBand, LayoutOptions, Page, PageGeometry, PageKind, PaginatedDocument, Signatory,
    TextStyle,
};
use super::substitution::ImageRole;

const EPSILON: f32 = 0.001;
const SIGNATURE_RULE: &str = "______________________________________________";

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid img regex"));
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z][\w-]*)\s*=\s*"([^"]*)""#).expect("valid attribute regex"));
static LINE_BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|h[1-6]|li)\s*>").expect("valid line break regex")
});
/// 除去対象は置換結果とテンプレートに現れる既知の HTML 要素だけ。それ以外の `<` `>` は本文として残す。
static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:img|span|br|p|div|h[1-6]|li|ul|ol|b|strong|i|em|u|center|font|table|tr|td|th|tbody|thead)\b[^<>]*>",
    )
    .expect("valid markup tag regex")
});
static NUMBERED_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\. ").expect("valid clause regex"));

/// 本文から取り出した画像参照。画像は本文末尾の専用ページに配置する。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub role: Option<ImageRole>,
    pub source_url: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub images: Vec<ImageRef>,
}

/// マークアップを除去してプレーンテキストと画像参照に分ける。
/// 「画像なし」の代替表示はタグだけが外れ、本文中の文字列として残る。
pub fn strip_markup(rendered: &str) -> ExtractedText {
    let mut images = Vec::new();
    for tag in IMG_TAG.find_iter(rendered) {
        let mut src = None;
        let mut role = None;
        let mut alt = None;
        for cap in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = decode_entities(&cap[2]);
            match cap[1].to_ascii_lowercase().as_str() {
                "src" => src = Some(value),
                "data-role" => role = ImageRole::parse(&value),
                "alt" => alt = Some(value),
                _ => {}
            }
        }
        if let Some(source_url) = src.filter(|s| !s.trim().is_empty()) {
            let caption = alt
                .or_else(|| role.map(|r| r.caption().to_string()))
                .unwrap_or_default();
            images.push(ImageRef {
                role,
                source_url,
                caption,
            });
        }
    }

    let text = IMG_TAG.replace_all(rendered, "");
    let text = LINE_BREAK_TAG.replace_all(&text, "\n");
    let text = MARKUP_TAG.replace_all(&text, "");
    let text = decode_entities(&text).replace("\r\n", "\n").replace('\r', "\n");

    ExtractedText { text, images }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// 番号付き条項（先頭が「整数 + ピリオド + 空白」）かどうか。
pub fn is_numbered_clause(line: &str) -> bool {
    NUMBERED_CLAUSE.is_match(line)
}

/// 1 論理行を max_width に収まる物理行へ折り返す。
/// 1 語で max_width を超える場合は文字単位で強制改行する。
pub fn wrap_line(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let fits = |s: &str| text_width(font, s, size) <= max_width + EPSILON;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !fits(word) {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate_len = current.len();
        current.push(' ');
        current.push_str(word);
        if !fits(&current) {
            current.truncate(candidate_len);
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// 配置中のページ群と縦カーソル。
struct PageCursor<'a> {
    options: &'a LayoutOptions,
    pages: Vec<Page>,
    blocks: Vec<Block>,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(options: &'a LayoutOptions) -> Self {
        Self {
            options,
            pages: Vec::new(),
            blocks: Vec::new(),
            y: options.geometry.content_top(),
        }
    }

    fn geometry(&self) -> &PageGeometry {
        &self.options.geometry
    }

    fn at_top(&self) -> bool {
        self.y <= self.geometry().content_top() + EPSILON
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry().content_bottom() + EPSILON
    }

    fn close_page(&mut self, kind: PageKind) {
        let page = Page {
            number: self.pages.len() + 1,
            kind,
            header: HeaderBand {
                title: self.options.header_title.clone(),
                height: self.geometry().header_height,
            },
            watermark: self.options.watermark.clone(),
            blocks: std::mem::take(&mut self.blocks),
        };
        self.pages.push(page);
        self.y = self.geometry().content_top();
    }

    /// height が収まらなければ改ページする。ページ先頭では改ページしない。
    fn ensure_room(&mut self, height: f32) {
        if !self.fits(height) && !self.at_top() {
            self.close_page(PageKind::Text);
        }
    }

    fn place_line(&mut self, content: String, style: TextStyle) {
        let line_height = self.geometry().line_height;
        self.ensure_room(line_height);
        self.blocks.push(Block::TextLine {
            x: self.geometry().margin,
            y: self.y,
            content,
            style,
        });
        self.y += line_height;
    }

    fn place_blank(&mut self) {
        if self.at_top() {
            return;
        }
        let line_height = self.geometry().line_height;
        if self.fits(line_height) {
            self.y += line_height;
        } else {
            self.close_page(PageKind::Text);
        }
    }

    /// 条項前の余白。先頭行と合わせて収まらない場合は余白を入れずに改ページする。
    fn place_clause_spacing(&mut self) {
        if self.at_top() {
            return;
        }
        let spacing = self.geometry().clause_spacing;
        if self.fits(spacing + self.geometry().line_height) {
            self.y += spacing;
        } else {
            self.close_page(PageKind::Text);
        }
    }

    fn place_signature_block(&mut self, lines: Vec<(String, TextStyle)>, gap: f32) {
        let line_height = self.geometry().line_height;
        let gap = if self.at_top() { 0.0 } else { gap };
        let height = gap + lines.len() as f32 * line_height;
        if self.fits(height) {
            self.y += gap;
        } else if !self.at_top() {
            self.close_page(PageKind::Text);
        }
        for (content, style) in lines {
            self.place_line(content, style);
        }
    }

    fn place_image_page(&mut self, image: &ImageRef) {
        let geometry = *self.geometry();
        let caption_height = geometry.line_height;
        let caption = if image.caption.is_empty() {
            image.source_url.clone()
        } else {
            image.caption.clone()
        };
        let caption_line = wrap_line(
            &caption,
            TextStyle::Emphasized.font(),
            geometry.font_size,
            geometry.content_width(),
        )
        .into_iter()
        .next()
        .unwrap_or_default();

        self.blocks.push(Block::TextLine {
            x: geometry.margin,
            y: geometry.content_top(),
            content: caption_line,
            style: TextStyle::Emphasized,
        });
        self.blocks.push(Block::Image {
            x: geometry.margin,
            y: geometry.content_top() + caption_height,
            source_url: image.source_url.clone(),
            max_width: geometry.content_width(),
            max_height: (geometry.usable_height() - caption_height).max(0.0),
        });
        self.close_page(PageKind::Image);
    }

    fn finish(mut self, images: &[ImageRef]) -> PaginatedDocument {
        self.close_page(PageKind::Text);
        for image in images {
            self.place_image_page(image);
        }
        PaginatedDocument {
            geometry: self.options.geometry,
            pages: self.pages,
        }
    }
}

fn signature_lines(signatory: &Signatory, geometry: &PageGeometry) -> Vec<(String, TextStyle)> {
    let width = geometry.content_width();
    let size = geometry.font_size;
    let mut lines = vec![(SIGNATURE_RULE.to_string(), TextStyle::Regular)];
    let heading = format!("{}: {}", signatory.label, signatory.name);
    lines.extend(
        wrap_line(&heading, Font::HelveticaBold, size, width)
            .into_iter()
            .map(|l| (l, TextStyle::Emphasized)),
    );
    for identifier in &signatory.identifiers {
        lines.extend(
            wrap_line(identifier, Font::Helvetica, size, width)
                .into_iter()
                .map(|l| (l, TextStyle::Regular)),
        );
    }
    lines
}

/// 置換済みテキストをページに分割する。
///
/// - 全ページに同じヘッダー帯と透かしを持たせる。
/// - 本文の後に署名欄を置き、収まらなければ次ページから始める。
/// - `<img>` で埋め込まれた画像は本文から外し、1 枚につき 1 ページを末尾に追加する。
pub fn paginate(rendered_text: &str, options: &LayoutOptions) -> PaginatedDocument {
    let geometry = options.geometry;
    let extracted = strip_markup(rendered_text);
    let mut cursor = PageCursor::new(options);

    let body = extracted.text.trim_matches(|c: char| c.is_whitespace());
    if !body.is_empty() {
        for logical in body.split('\n') {
            if logical.trim().is_empty() {
                cursor.place_blank();
                continue;
            }
            let style = if is_numbered_clause(logical) {
                cursor.place_clause_spacing();
                TextStyle::Emphasized
            } else {
                TextStyle::Regular
            };
            for physical in wrap_line(logical, style.font(), geometry.font_size, geometry.content_width()) {
                cursor.place_line(physical, style);
            }
        }
    }

    let mut lines = signature_lines(&options.signatures.partner, &geometry);
    lines.push((String::new(), TextStyle::Regular));
    lines.extend(signature_lines(&options.signatures.counterparty, &geometry));
    cursor.place_signature_block(lines, 2.0 * geometry.line_height);

    cursor.finish(&extracted.images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::layout::{SignatureBlock, Watermark};

    fn signatures() -> SignatureBlock {
        SignatureBlock {
            partner: Signatory {
                label: "PARCEIRO".to_string(),
                name: "Ana Silva".to_string(),
                identifiers: vec!["CPF: 123.456.789-01".to_string()],
            },
            counterparty: Signatory {
                label: "AGRO".to_string(),
                name: "Agro Trading Ltda".to_string(),
                identifiers: vec!["CNPJ: 00.000.000/0001-00".to_string()],
            },
        }
    }

    /// 本文領域がちょうど 40 行分になる設定（上端 90pt、下端 690pt、行送り 15pt）。
    fn forty_line_geometry() -> PageGeometry {
        PageGeometry {
            width: 595.0,
            height: 740.0,
            margin: 50.0,
            header_height: 40.0,
            font_size: 10.0,
            line_height: 15.0,
            clause_spacing: 7.5,
        }
    }

    fn options(geometry: PageGeometry) -> LayoutOptions {
        LayoutOptions {
            geometry,
            header_title: "NCNDA".to_string(),
            watermark: Watermark::new("CONFIDENCIAL"),
            signatures: signatures(),
        }
    }

    fn body_line_count(page: &Page) -> usize {
        page.text_lines()
            .filter(|(content, _)| content.starts_with("palavra"))
            .count()
    }

    #[test]
    fn empty_text_produces_single_page_with_signatures() {
        let doc = paginate("", &options(PageGeometry::a4()));
        assert_eq!(doc.page_count(), 1);
        let page = &doc.pages[0];
        assert_eq!(page.header.title, "NCNDA");
        assert_eq!(page.watermark.text, "CONFIDENCIAL");
        let lines: Vec<_> = page.text_lines().map(|(c, _)| c.to_string()).collect();
        assert!(lines.iter().any(|l| l == "PARCEIRO: Ana Silva"));
        assert!(lines.iter().any(|l| l == "AGRO: Agro Trading Ltda"));
        assert_eq!(page.blocks[0].top(), PageGeometry::a4().content_top());
    }

    #[test]
    fn long_paragraph_fills_forty_lines_per_page() {
        let geometry = forty_line_geometry();
        assert_eq!(geometry.lines_per_page(), 40);

        let mut text = String::new();
        while text.len() < 10_000 {
            text.push_str("palavra ");
        }
        let wrapped = wrap_line(&text, Font::Helvetica, geometry.font_size, geometry.content_width());
        let expected_pages = wrapped.len().div_ceil(40);

        let doc = paginate(&text, &options(geometry));
        let pages_with_body: Vec<_> = doc.pages.iter().filter(|p| body_line_count(p) > 0).collect();
        assert_eq!(pages_with_body.len(), expected_pages);
        for page in &pages_with_body[..pages_with_body.len() - 1] {
            assert_eq!(body_line_count(page), 40);
        }
        assert_eq!(doc.image_pages().count(), 0);
    }

    #[test]
    fn image_pages_are_appended_after_text() {
        let text = concat!(
            "Termo.\n",
            r#"<img class="passport-image" data-role="partner" src="https://img.example.com/a.jpg" alt="Passaporte do parceiro"/>"#,
            "\n",
            r#"<img class="passport-image" data-role="administrator" src="https://img.example.com/b.jpg" alt="Passaporte do administrador"/>"#,
        );
        let doc = paginate(text, &options(PageGeometry::a4()));
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.pages[0].kind, PageKind::Text);
        assert_eq!(doc.pages[1].kind, PageKind::Image);
        assert_eq!(doc.pages[2].kind, PageKind::Image);
        assert_eq!(
            doc.pages[1].image_sources().collect::<Vec<_>>(),
            vec!["https://img.example.com/a.jpg"]
        );
        assert_eq!(
            doc.pages[2].image_sources().collect::<Vec<_>>(),
            vec!["https://img.example.com/b.jpg"]
        );
        assert!(doc.pages[0].text_lines().all(|(c, _)| !c.contains("<img")));
    }

    #[test]
    fn unavailable_placeholder_stays_inline() {
        let text = r#"Anexo: <span class="image-unavailable" data-role="partner">*** IMAGEM INDISPONÍVEL: Passaporte do parceiro ***</span>"#;
        let doc = paginate(text, &options(PageGeometry::a4()));
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages[0]
            .text_lines()
            .any(|(c, _)| c.contains("IMAGEM INDISPONÍVEL")));
        assert_eq!(doc.image_pages().count(), 0);
    }

    #[test]
    fn overlong_word_is_hard_broken() {
        let geometry = PageGeometry::a4();
        let word = "X".repeat(400);
        let lines = wrap_line(&word, Font::Helvetica, geometry.font_size, geometry.content_width());
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(Font::Helvetica, line, geometry.font_size) <= geometry.content_width() + EPSILON);
        }
    }

    #[test]
    fn no_line_exceeds_width_and_no_page_overflows() {
        let geometry = PageGeometry::a4();
        let mut text = String::new();
        for i in 1..=30 {
            text.push_str(&format!("{i}. CLÁUSULA {i}\n"));
            text.push_str(&"As partes concordam com a confidencialidade das informações trocadas. ".repeat(6));
            text.push_str("\n\n");
        }
        text.push_str(&"Z".repeat(900));

        let doc = paginate(&text, &options(geometry));
        for page in &doc.pages {
            for block in &page.blocks {
                assert!(block.top() >= geometry.content_top() - EPSILON);
                assert!(block.bottom(&geometry) <= geometry.content_bottom() + EPSILON);
                if let Block::TextLine { content, style, .. } = block {
                    let w = text_width(style.font(), content, geometry.font_size);
                    assert!(w <= geometry.content_width() + EPSILON, "line too wide: {content}");
                }
            }
        }
    }

    #[test]
    fn numbered_clauses_are_emphasized_and_spaced() {
        let geometry = PageGeometry::a4();
        let doc = paginate("Preâmbulo.\n1. OBJETO\nTexto.", &options(geometry));
        let blocks = &doc.pages[0].blocks;
        let Block::TextLine { y: y0, .. } = &blocks[0] else { panic!("expected text") };
        let Block::TextLine { y: y1, style, content, .. } = &blocks[1] else { panic!("expected text") };
        assert_eq!(content, "1. OBJETO");
        assert_eq!(*style, TextStyle::Emphasized);
        assert!((y1 - y0 - geometry.line_height - geometry.clause_spacing).abs() < EPSILON);
        assert!(is_numbered_clause("12. PRAZO"));
        assert!(!is_numbered_clause("1.5 milhão"));
        assert!(!is_numbered_clause("Cláusula 1. Objeto"));
    }

    #[test]
    fn signature_block_is_never_split() {
        let geometry = forty_line_geometry();
        // 38 行で本文を埋め、署名欄（ギャップ + 7 行）が残り 2 行に収まらない状況を作る。
        let text = (0..38).map(|i| format!("palavra {i}")).collect::<Vec<_>>().join("\n");
        let doc = paginate(&text, &options(geometry));
        assert_eq!(doc.page_count(), 2);
        let last: Vec<_> = doc.pages[1].text_lines().map(|(c, _)| c.to_string()).collect();
        assert_eq!(last[0], SIGNATURE_RULE);
        assert!(last.iter().any(|l| l == "PARCEIRO: Ana Silva"));
        assert!(last.iter().any(|l| l == "AGRO: Agro Trading Ltda"));
        assert!(doc.pages[0].text_lines().all(|(c, _)| c != SIGNATURE_RULE));
    }

    #[test]
    fn pagination_is_deterministic() {
        let text = "1. OBJETO\n".to_string() + &"Lorem ipsum dolor sit amet. ".repeat(400);
        let a = paginate(&text, &options(PageGeometry::a4()));
        let b = paginate(&text, &options(PageGeometry::a4()));
        assert_eq!(a, b);
    }

    #[test]
    fn entities_are_decoded_after_stripping() {
        let extracted = strip_markup("<p>Ana &lt;Silva&gt; &amp; Cia</p><br/>fim");
        assert_eq!(extracted.text, "Ana <Silva> & Cia\n\nfim");
        assert!(extracted.images.is_empty());
    }

    #[test]
    fn plain_angle_brackets_survive_stripping() {
        let extracted = strip_markup("<b>3. PRAZO</b>\nvalor < 5 e > 3<br>nota <bem> fim");
        assert_eq!(extracted.text, "3. PRAZO\nvalor < 5 e > 3\nnota <bem> fim");
    }
}
