use crate::error::ParseError;
use crate::models::ParsedDocument;
use crate::parser::blocks::split_visit_blocks;
use crate::parser::visit::parse_visit;
use regex::Regex;
use std::sync::LazyLock;

static PATIENT_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*For\s+(?P<name>[^\n(]+?)\s*\((?P<id>[^)\n]+)\)").unwrap()
});
static OWNER_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*Owner\s+(?P<name>[^\n(]+?)\s*\((?P<id>[^)\n]+)\)").unwrap()
});
/// 形似电话号码的片段 (允许 +、空格、横杠、括号)
static PHONE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d \-()]{6,}\d").unwrap());

/// 解析参数
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Owner 行之后扫描手机号的行数
    pub phone_scan_lines: usize,
    /// 可选的国家区号前缀
    pub country_code: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            phone_scan_lines: 5,
            country_code: "65".to_string(),
        }
    }
}

/// 规范化手机号: 去掉非数字字符和国家区号, 仅接受 8 或 9 开头的 8 位号码, 否则返回空串
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let local = match digits.strip_prefix(country_code) {
        Some(rest) if !country_code.is_empty() && rest.len() == 8 => rest,
        _ => digits.as_str(),
    };

    if local.len() == 8 && (local.starts_with('8') || local.starts_with('9')) {
        local.to_string()
    } else {
        String::new()
    }
}

/// 在 Owner 行之后的有限窗口内查找第一个合法手机号
fn find_owner_phone(text: &str, owner_line_start: usize, options: &ParseOptions) -> String {
    text[owner_line_start..]
        .lines()
        .take(options.phone_scan_lines + 1)
        .flat_map(|line| PHONE_TOKEN_RE.find_iter(line))
        .map(|m| normalize_phone(m.as_str(), &options.country_code))
        .find(|phone| !phone.is_empty())
        .unwrap_or_default()
}

pub fn parse_document(text: &str) -> Result<ParsedDocument, ParseError> {
    parse_document_with(text, &ParseOptions::default())
}

/// 解析整份文档
///
/// 缺少患者行或 Owner 行、或找不到任何就诊块时整份文档失败;
/// 手机号无法识别只会留空, 不影响解析。
pub fn parse_document_with(text: &str, options: &ParseOptions) -> Result<ParsedDocument, ParseError> {
    let patient = PATIENT_HEADER_RE
        .captures(text)
        .ok_or(ParseError::MissingPatientHeader)?;
    let owner = OWNER_HEADER_RE
        .captures(text)
        .ok_or(ParseError::MissingOwnerHeader)?;

    let owner_line_start = owner.get(0).map(|m| m.start()).unwrap_or(0);
    let owner_phone = find_owner_phone(text, owner_line_start, options);
    if owner_phone.is_empty() {
        tracing::warn!("No owner phone found within {} lines of owner header", options.phone_scan_lines);
    }

    let visits: Vec<_> = split_visit_blocks(text)
        .into_iter()
        .filter_map(parse_visit)
        .collect();
    if visits.is_empty() {
        return Err(ParseError::NoVisits);
    }

    Ok(ParsedDocument {
        patient_name: patient["name"].trim().to_string(),
        patient_legacy_id: patient["id"].trim().to_string(),
        owner_name: owner["name"].trim().to_string(),
        owner_legacy_id: owner["id"].trim().to_string(),
        owner_phone,
        visits,
    })
}
