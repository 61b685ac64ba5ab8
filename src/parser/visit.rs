use crate::models::{ParsedLineItem, ParsedVisit, VisitSections, Vitals};
use crate::parser::blocks::parse_visit_header;
use crate::parser::section::{
    extract_section, labels_after, CLINICAL_EXAMINATION, COMMENTS, HISTORY, TREATMENT,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static STAFF_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?P<code>[A-Z]{1,4})\]").unwrap());
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Weight:\s*(?P<value>-?\d+(?:\.\d+)?)").unwrap());
static TEMPERATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Temperature:\s*(?P<value>-?\d+(?:\.\d+)?)").unwrap());
/// `STAFFCODE QTY DESCRIPTION $PRICE`
static LINE_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<staff>[A-Z]{1,4})\s+(?P<qty>\d+(?:\.\d+)?)\s+(?P<desc>.+?)\s+\$(?P<price>\d[\d,]*(?:\.\d+)?)\s*$",
    )
    .unwrap()
});

/// 解析 `D/M/YYYY` 日期, 非法日历日期 (如 31/2/2026) 返回 None
pub fn parse_legacy_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// 块中第一个方括号员工代码, 缺失时为空
pub fn extract_staff_code(block: &str) -> String {
    STAFF_CODE_RE
        .captures(block)
        .and_then(|caps| caps.name("code"))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn extract_decimal(re: &Regex, block: &str) -> Option<BigDecimal> {
    let caps = re.captures(block)?;
    BigDecimal::from_str(caps.name("value")?.as_str()).ok()
}

pub fn extract_vitals(block: &str) -> Vitals {
    Vitals {
        weight: extract_decimal(&WEIGHT_RE, block),
        temperature: extract_decimal(&TEMPERATURE_RE, block),
    }
}

/// 匹配账单明细行的结果
#[derive(Debug, Clone, PartialEq)]
pub enum LineMatch {
    Item(ParsedLineItem),
    /// 描述以 `*` 开头的内部指令行, 不计费
    Directive,
    NotALineItem,
}

pub fn match_line_item(line: &str) -> LineMatch {
    let Some(caps) = LINE_ITEM_RE.captures(line) else {
        return LineMatch::NotALineItem;
    };

    let description = caps["desc"].trim();
    if description.starts_with('*') {
        return LineMatch::Directive;
    }

    let quantity = BigDecimal::from_str(&caps["qty"]);
    let unit_price = BigDecimal::from_str(&caps["price"].replace(',', ""));
    match (quantity, unit_price) {
        (Ok(quantity), Ok(unit_price)) => LineMatch::Item(ParsedLineItem {
            staff_code: caps["staff"].to_string(),
            quantity,
            description: description.to_string(),
            unit_price,
        }),
        _ => LineMatch::NotALineItem,
    }
}

pub fn extract_line_items(block: &str) -> Vec<ParsedLineItem> {
    block
        .lines()
        .filter_map(|line| match match_line_item(line) {
            LineMatch::Item(item) => Some(item),
            _ => None,
        })
        .collect()
}

/// 去掉账单行 (含指令行) 后的病历文本, 避免最后一个段落吞掉计费明细
fn narrative_text(block: &str) -> String {
    block
        .lines()
        .filter(|line| matches!(match_line_item(line), LineMatch::NotALineItem))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn extract_sections(block: &str) -> VisitSections {
    let narrative = narrative_text(block);
    let section = |label: &str| extract_section(&narrative, label, labels_after(label));

    VisitSections {
        history: section(HISTORY),
        clinical_examination: section(CLINICAL_EXAMINATION),
        treatment: section(TREATMENT),
        comments: section(COMMENTS),
    }
}

/// 把一个就诊块解析为 ParsedVisit; 块中没有头部时返回 None
pub fn parse_visit(block: &str) -> Option<ParsedVisit> {
    let header = parse_visit_header(block)?;
    let date = parse_legacy_date(&header.raw_date);

    Some(ParsedVisit {
        bill_number: header.bill_number,
        raw_date: header.raw_date,
        date,
        staff_code: extract_staff_code(block),
        vitals: extract_vitals(block),
        sections: extract_sections(block),
        line_items: extract_line_items(block),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const BLOCK: &str = "Bill No: 1/40695  Date: 3/2/2024\n\
        [HL] Dr Hui Ling\n\
        Weight: 12.4 kg  Temperature: 38.6\n\
        History: Limping on left hind since Sunday.\n\
        Clinical Examination: Mild swelling over stifle.\n\
        Treatment: Meloxicam 5 days.\n\
        Comments: Recheck in one week.\n\
        HL 1 Consultation Fee $150\n\
        HL 2 *Internal Note $0\n\
        HL 0.5 Meloxicam 1.5mg/ml 10ml $32.50\n";

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn date_round_trip_is_zero_padded() {
        let date = parse_legacy_date("3/2/2024").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2024-02-03");
        let date = parse_legacy_date("31/12/1999").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "1999-12-31");
    }

    #[test]
    fn every_calendar_day_round_trips() {
        for year in [2023, 2024] {
            let mut day = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
            let mut seen = 0;
            while day.year() == year {
                let raw = format!("{}/{}/{}", day.day(), day.month(), year);
                let parsed = parse_legacy_date(&raw).unwrap_or_else(|| panic!("{} rejected", raw));
                assert_eq!(
                    parsed.format("%Y-%m-%d").to_string(),
                    format!("{:04}-{:02}-{:02}", year, day.month(), day.day())
                );
                seen += 1;
                day = day.succ_opt().unwrap();
            }
            assert_eq!(seen, if year == 2024 { 366 } else { 365 });
        }
        assert_eq!(parse_legacy_date("29/2/2023"), None);
    }

    #[test]
    fn invalid_calendar_date_is_none() {
        assert_eq!(parse_legacy_date("31/2/2026"), None);
        assert_eq!(parse_legacy_date("12/13/2024"), None);
        assert_eq!(parse_legacy_date("0/1/2024"), None);
        assert_eq!(parse_legacy_date("1/1"), None);
    }

    #[test]
    fn consultation_line_item() {
        let item = match match_line_item("HL 1 Consultation Fee $150") {
            LineMatch::Item(item) => item,
            other => panic!("expected line item, got {:?}", other),
        };
        assert_eq!(item.staff_code, "HL");
        assert_eq!(item.quantity, dec("1"));
        assert_eq!(item.description, "Consultation Fee");
        assert_eq!(item.unit_price, dec("150"));
    }

    #[test]
    fn directive_line_is_excluded() {
        assert_eq!(match_line_item("HL 2 *Internal Note $0"), LineMatch::Directive);
    }

    #[test]
    fn prose_is_not_a_line_item() {
        assert_eq!(match_line_item("History: ate $5 of chocolate"), LineMatch::NotALineItem);
        assert_eq!(match_line_item("Weight: 12.4 kg"), LineMatch::NotALineItem);
    }

    #[test]
    fn price_with_thousands_separator() {
        match match_line_item("JT 1 TPLO Surgery $3,250.00") {
            LineMatch::Item(item) => assert_eq!(item.unit_price, dec("3250.00")),
            other => panic!("expected line item, got {:?}", other),
        }
    }

    #[test]
    fn parses_full_block() {
        let visit = parse_visit(BLOCK).unwrap();
        assert_eq!(visit.bill_number, "1/40695");
        assert_eq!(visit.date, NaiveDate::from_ymd_opt(2024, 2, 3));
        assert_eq!(visit.staff_code, "HL");
        assert_eq!(visit.vitals.weight, Some(dec("12.4")));
        assert_eq!(visit.vitals.temperature, Some(dec("38.6")));
        assert_eq!(visit.sections.history, "Limping on left hind since Sunday.");
        assert_eq!(visit.sections.clinical_examination, "Mild swelling over stifle.");
        assert_eq!(visit.sections.treatment, "Meloxicam 5 days.");
        assert_eq!(visit.sections.comments, "Recheck in one week.");

        assert_eq!(visit.line_items.len(), 2);
        assert_eq!(visit.line_items[1].description, "Meloxicam 1.5mg/ml 10ml");
        assert_eq!(visit.line_items[1].quantity, dec("0.5"));
    }

    #[test]
    fn sparse_block_defaults() {
        let visit = parse_visit("Bill No: 1/5 Date: 31/2/2026\nWeight: n/a\n").unwrap();
        assert_eq!(visit.date, None);
        assert_eq!(visit.raw_date, "31/2/2026");
        assert_eq!(visit.staff_code, "");
        assert_eq!(visit.vitals, Vitals::default());
        assert_eq!(visit.sections, VisitSections::default());
        assert!(visit.line_items.is_empty());
    }
}
