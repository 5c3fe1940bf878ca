//! ページレイアウトを PDF に変換する。
//!
//! 画像の取得はここでのみ行う。取得に失敗した画像・JPEG でない画像は枠付きの
//! 「画像なし」ボックスに置き換え、文書全体の生成は継続する。

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use super::font_metrics::{text_width, Font};
use super::layout::{Block, Page, PageGeometry, PaginatedDocument, TextStyle};
use super::pdf::{literal_string, num, parse_jpeg, JpegInfo, PdfWriter};
use crate::domain::service::{ImageFetchError, ImageFetcher};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const UNAVAILABLE_BOX_TEXT: &str = "Imagem indisponível";
const UNAVAILABLE_BOX_HEIGHT: f32 = 160.0;
const HEADER_TITLE_SIZE: f32 = 12.0;

/// RenderedArtifact はレンダリング結果の PDF と、代替表示になった画像の URL。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub unavailable_images: Vec<String>,
}

/// LoadedImage は取得済みで埋め込み可能な JPEG。
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub info: JpegInfo,
    pub data: Vec<u8>,
}

/// 画像 URL ごとの取得結果。None は代替表示。
pub type ImageSet = BTreeMap<String, Option<LoadedImage>>;

pub struct PdfRenderer {
    fetcher: Arc<dyn ImageFetcher>,
}

impl PdfRenderer {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    /// 同じページ構造と同じ画像バイト列からは常に同じバイト列を返す。
    pub async fn render(&self, document: &PaginatedDocument) -> RenderedArtifact {
        let images = self.load_images(document).await;
        let unavailable_images = images
            .iter()
            .filter(|(_, loaded)| loaded.is_none())
            .map(|(url, _)| url.clone())
            .collect::<Vec<_>>();
        let bytes = encode_pdf(document, &images);

        tracing::info!(
            pages = document.page_count(),
            bytes = bytes.len(),
            unavailable_images = unavailable_images.len(),
            "contract document rendered"
        );

        RenderedArtifact {
            bytes,
            page_count: document.page_count(),
            unavailable_images,
        }
    }

    async fn load_images(&self, document: &PaginatedDocument) -> ImageSet {
        let mut images = ImageSet::new();
        for page in &document.pages {
            for url in page.image_sources() {
                if images.contains_key(url) {
                    continue;
                }
                let loaded = match self.load_image(url).await {
                    Ok(image) => Some(image),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "passport image replaced by placeholder");
                        None
                    }
                };
                images.insert(url.to_string(), loaded);
            }
        }
        images
    }

    async fn load_image(&self, url: &str) -> Result<LoadedImage, ImageFetchError> {
        let data = self.fetcher.fetch(url).await?;
        let info = parse_jpeg(&data)
            .ok_or_else(|| ImageFetchError::unavailable(url, "payload is not a baseline JPEG"))?;
        Ok(LoadedImage { info, data })
    }
}

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const REGULAR_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
const FIRST_IMAGE_ID: usize = 5;

/// ページ列と取得済み画像から PDF バイト列を組み立てる（I/O なし）。
pub fn encode_pdf(document: &PaginatedDocument, images: &ImageSet) -> Vec<u8> {
    let embedded: Vec<(&str, &LoadedImage)> = images
        .iter()
        .filter_map(|(url, loaded)| loaded.as_ref().map(|img| (url.as_str(), img)))
        .collect();
    let image_ids: BTreeMap<&str, (usize, &LoadedImage)> = embedded
        .iter()
        .enumerate()
        .map(|(i, (url, img))| (*url, (FIRST_IMAGE_ID + i, *img)))
        .collect();
    let first_page_id = FIRST_IMAGE_ID + embedded.len();
    let page_ids: Vec<usize> = (0..document.pages.len())
        .map(|i| first_page_id + 2 * i)
        .collect();

    let mut writer = PdfWriter::new();

    writer.object(&format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>"));
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    writer.object(&format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids,
        page_ids.len()
    ));
    for font in [Font::Helvetica, Font::HelveticaBold] {
        writer.object(&format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
            font.base_name()
        ));
    }
    for (_, image) in &embedded {
        let mut dict = format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent {} /Filter /DCTDecode",
            image.info.width,
            image.info.height,
            image.info.color_space(),
            image.info.bits_per_component
        );
        if image.info.components == 4 {
            dict.push_str(" /Decode [1 0 1 0 1 0 1 0]");
        }
        writer.stream(&dict, &image.data);
    }

    let geometry = &document.geometry;
    for page in &document.pages {
        let page_id = writer.next_id();
        let content_id = page_id + 1;
        let (content, used_images) = page_content(page, geometry, &image_ids);

        let mut xobjects = String::new();
        for (name, id) in &used_images {
            let _ = write!(xobjects, " /{name} {id} 0 R");
        }
        let xobject_entry = if xobjects.is_empty() {
            String::new()
        } else {
            format!(" /XObject <<{xobjects} >>")
        };
        let opacity = num(page.watermark.opacity.clamp(0.0, 1.0));
        writer.object(&format!(
            "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 {REGULAR_FONT_ID} 0 R /F2 {BOLD_FONT_ID} 0 R >> \
             /ExtGState << /GS1 << /Type /ExtGState /ca {opacity} /CA {opacity} >> >>{xobject_entry} >> \
             /Contents {content_id} 0 R >>",
            num(geometry.width),
            num(geometry.height)
        ));
        writer.stream("", content.as_bytes());
    }

    writer.finish(CATALOG_ID)
}

fn font_resource(font: Font) -> &'static str {
    match font {
        Font::Helvetica => "F1",
        Font::HelveticaBold => "F2",
    }
}

/// 1 ページ分のコンテンツストリームと、参照した画像リソース（名前, オブジェクト番号）。
fn page_content(
    page: &Page,
    geometry: &PageGeometry,
    image_ids: &BTreeMap<&str, (usize, &LoadedImage)>,
) -> (String, Vec<(String, usize)>) {
    let mut out = String::new();
    let mut used = Vec::new();

    draw_watermark(&mut out, page, geometry);
    draw_header(&mut out, page, geometry);

    for block in &page.blocks {
        match block {
            Block::TextLine {
                x,
                y,
                content,
                style,
            } => draw_text(&mut out, geometry, *x, *y, content, *style),
            Block::Image {
                x,
                y,
                source_url,
                max_width,
                max_height,
            } => match image_ids.get(source_url.as_str()) {
                Some((id, image)) => {
                    let name = format!("Im{id}");
                    draw_image(&mut out, geometry, &name, &image.info, *x, *y, *max_width, *max_height);
                    if !used.iter().any(|(n, _)| *n == name) {
                        used.push((name, *id));
                    }
                }
                None => draw_unavailable_box(&mut out, geometry, *x, *y, *max_width, *max_height),
            },
        }
    }
    (out, used)
}

fn draw_watermark(out: &mut String, page: &Page, geometry: &PageGeometry) {
    let mark = &page.watermark;
    if mark.text.trim().is_empty() {
        return;
    }
    let width = text_width(Font::HelveticaBold, &mark.text, mark.font_size);
    let (sin, cos) = mark.angle_degrees.to_radians().sin_cos();
    let cx = geometry.width / 2.0;
    let cy = geometry.height / 2.0;
    // 文字列の中心がページ中心に来るよう、回転後の基線方向に半分戻す
    let tx = cx - cos * width / 2.0 + sin * mark.font_size / 3.0;
    let ty = cy - sin * width / 2.0 - cos * mark.font_size / 3.0;
    let _ = writeln!(
        out,
        "q /GS1 gs 0.50 g BT /F2 {} Tf {} {} {} {} {} {} Tm {} Tj ET Q",
        num(mark.font_size),
        num(cos),
        num(sin),
        num(-sin),
        num(cos),
        num(tx),
        num(ty),
        literal_string(&mark.text)
    );
}

fn draw_header(out: &mut String, page: &Page, geometry: &PageGeometry) {
    let band_height = (page.header.height - 10.0).max(0.0);
    if band_height <= 0.0 {
        return;
    }
    let band_bottom = geometry.height - geometry.margin - band_height;
    let _ = writeln!(
        out,
        "q 0.93 g {} {} {} {} re f Q",
        num(geometry.margin),
        num(band_bottom),
        num(geometry.content_width()),
        num(band_height)
    );
    if page.header.title.is_empty() {
        return;
    }
    let baseline = band_bottom + (band_height - HEADER_TITLE_SIZE) / 2.0 + 2.0;
    let _ = writeln!(
        out,
        "BT /F2 {} Tf {} {} Td {} Tj ET",
        num(HEADER_TITLE_SIZE),
        num(geometry.margin + 8.0),
        num(baseline),
        literal_string(&page.header.title)
    );
}

fn draw_text(out: &mut String, geometry: &PageGeometry, x: f32, y: f32, content: &str, style: TextStyle) {
    if content.is_empty() {
        return;
    }
    let baseline = geometry.height - (y + geometry.font_size);
    let _ = writeln!(
        out,
        "BT /{} {} Tf {} {} Td {} Tj ET",
        font_resource(style.font()),
        num(geometry.font_size),
        num(x),
        num(baseline),
        literal_string(content)
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_image(
    out: &mut String,
    geometry: &PageGeometry,
    name: &str,
    info: &JpegInfo,
    x: f32,
    y: f32,
    max_width: f32,
    max_height: f32,
) {
    let (w, h) = (info.width as f32, info.height as f32);
    let scale = (max_width / w).min(max_height / h).min(1.0);
    let draw_w = w * scale;
    let draw_h = h * scale;
    let left = x + (max_width - draw_w) / 2.0;
    let bottom = geometry.height - (y + draw_h);
    let _ = writeln!(
        out,
        "q {} 0 0 {} {} {} cm /{} Do Q",
        num(draw_w),
        num(draw_h),
        num(left),
        num(bottom),
        name
    );
}

fn draw_unavailable_box(out: &mut String, geometry: &PageGeometry, x: f32, y: f32, max_width: f32, max_height: f32) {
    let box_h = max_height.min(UNAVAILABLE_BOX_HEIGHT);
    let bottom = geometry.height - (y + box_h);
    let _ = writeln!(
        out,
        "q 0.40 G 1.00 w {} {} {} {} re S Q",
        num(x),
        num(bottom),
        num(max_width),
        num(box_h)
    );
    let label_w = text_width(Font::HelveticaBold, UNAVAILABLE_BOX_TEXT, geometry.font_size);
    let _ = writeln!(
        out,
        "BT /F2 {} Tf {} {} Td {} Tj ET",
        num(geometry.font_size),
        num(x + (max_width - label_w) / 2.0),
        num(bottom + box_h / 2.0 - geometry.font_size / 3.0),
        literal_string(UNAVAILABLE_BOX_TEXT)
    );
}
