//! プレースホルダートークンの置換。
//!
//! テンプレート本文を 1 回だけ走査し、トークン表に一致した箇所を値（または画像マークアップ）に
//! 置き換える。置換後の値は再走査しないため、値にトークン文字列が含まれていても二重展開されない。
//! 表に無い角括弧トークンはそのまま残す（テンプレートの段階的な編集を許容するため）。

use chrono::{Datelike, NaiveDate};

use crate::domain::entity::party::Party;

pub const FULL_NAME_TOKEN: &str = "[NOME_COMPLETO]";
pub const TAX_ID_TOKEN: &str = "[CPF]";
pub const PASSPORT_TOKEN: &str = "[PASSAPORTE]";
pub const EMAIL_TOKEN: &str = "[EMAIL]";
pub const CURRENT_DATE_TOKEN: &str = "[DATA_ATUAL]";
pub const PARTNER_IMAGE_TOKEN: &str = "[ESPAÇO PARA IMAGEM DO PASSAPORTE_PARCEIRO]";
pub const ADMIN_IMAGE_TOKEN: &str = "[ESPAÇO PARA IMAGEM DO PASSAPORTE_AGRO]";

/// 画像が無い場合に本文へ埋め込まれる目印。
pub const IMAGE_UNAVAILABLE_MARKER: &str = "IMAGEM INDISPONÍVEL";

const MONTHS_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// ImageRole は画像領域トークンがどの当事者のものかを表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImageRole {
    Partner,
    Administrator,
}

impl ImageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageRole::Partner => "partner",
            ImageRole::Administrator => "administrator",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "partner" => Some(ImageRole::Partner),
            "administrator" => Some(ImageRole::Administrator),
            _ => None,
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            ImageRole::Partner => "Passaporte do parceiro",
            ImageRole::Administrator => "Passaporte do administrador",
        }
    }
}

/// SubstitutionContext は置換に必要な当事者データと描画時点の日付。
#[derive(Debug, Clone, Copy)]
pub struct SubstitutionContext<'a> {
    pub partner: &'a Party,
    pub administrator: Option<&'a Party>,
    pub today: NaiveDate,
}

type Resolver = fn(&SubstitutionContext<'_>) -> String;

const TOKEN_TABLE: [(&str, Resolver); 7] = [
    (FULL_NAME_TOKEN, resolve_full_name),
    (TAX_ID_TOKEN, resolve_tax_id),
    (PASSPORT_TOKEN, resolve_passport),
    (EMAIL_TOKEN, resolve_email),
    (CURRENT_DATE_TOKEN, resolve_current_date),
    (PARTNER_IMAGE_TOKEN, resolve_partner_image),
    (ADMIN_IMAGE_TOKEN, resolve_admin_image),
];

fn resolve_full_name(ctx: &SubstitutionContext<'_>) -> String {
    escape_markup(ctx.partner.full_name.trim())
}

fn resolve_tax_id(ctx: &SubstitutionContext<'_>) -> String {
    escape_markup(&format_tax_id(&ctx.partner.tax_id))
}

fn resolve_passport(ctx: &SubstitutionContext<'_>) -> String {
    escape_markup(&format_passport(&ctx.partner.passport_number))
}

fn resolve_email(ctx: &SubstitutionContext<'_>) -> String {
    escape_markup(ctx.partner.email.trim())
}

fn resolve_current_date(ctx: &SubstitutionContext<'_>) -> String {
    format_long_date(ctx.today)
}

fn resolve_partner_image(ctx: &SubstitutionContext<'_>) -> String {
    image_markup(ImageRole::Partner, Some(ctx.partner))
}

fn resolve_admin_image(ctx: &SubstitutionContext<'_>) -> String {
    image_markup(ImageRole::Administrator, ctx.administrator)
}

/// テンプレートを置換済みテキストに変換する。
pub fn substitute(template: &str, ctx: &SubstitutionContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];

        let matched = candidate.find(']').and_then(|close| {
            let token = &candidate[..=close];
            TOKEN_TABLE
                .iter()
                .find(|(name, _)| *name == token)
                .map(|(_, resolve)| (token.len(), resolve(ctx)))
        });

        match matched {
            Some((consumed, value)) => {
                out.push_str(&value);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('[');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// 置換エンジンが認識するトークン一覧。
pub fn known_tokens() -> impl Iterator<Item = &'static str> {
    TOKEN_TABLE.iter().map(|(name, _)| *name)
}

/// CPF を NNN.NNN.NNN-NN 形式に整形する。11 桁でなければ入力をそのまま返す。
pub fn format_tax_id(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 11 {
        return raw.trim().to_string();
    }
    let part = |range: std::ops::Range<usize>| digits[range].iter().collect::<String>();
    format!("{}.{}.{}-{}", part(0..3), part(3..6), part(6..9), part(9..11))
}

pub fn format_passport(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// ポルトガル語の長い日付表記（例: 18 de outubro de 2026）。
pub fn format_long_date(date: NaiveDate) -> String {
    let month = MONTHS_PT[date.month0() as usize];
    format!("{} de {} de {}", date.day(), month, date.year())
}

fn image_markup(role: ImageRole, party: Option<&Party>) -> String {
    match party.and_then(|p| p.passport_image_url.as_deref()).map(str::trim) {
        Some(url) if !url.is_empty() => format!(
            r#"<img class="passport-image" data-role="{}" src="{}" alt="{}"/>"#,
            role.as_str(),
            escape_markup(url),
            role.caption()
        ),
        _ => format!(
            r#"<span class="image-unavailable" data-role="{}">*** {}: {} ***</span>"#,
            role.as_str(),
            IMAGE_UNAVAILABLE_MARKER,
            role.caption()
        ),
    }
}

pub fn escape_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
