use regex::Regex;
use std::sync::LazyLock;

/// 就诊块头部: 单据号 + 日期, 例如 `Bill No: 1/40695  Date: 12/3/2024`
///
/// 日期只按数字开头的片段截取, 是否合法由 `parse_legacy_date` 判断,
/// 格式错误的日期仍然开启新块。
pub(crate) static VISIT_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Bill[ \t]*(?:No\.?)?[ \t]*:?[ \t]*(?P<bill>\d+/\d+)[ \t]+(?:Date[ \t]*:?[ \t]*)?(?P<date>\d\S*)",
    )
    .unwrap()
});

/// 就诊块头部字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitHeader {
    pub bill_number: String,
    pub raw_date: String,
}

/// 读取块中第一个头部
pub fn parse_visit_header(block: &str) -> Option<VisitHeader> {
    let caps = VISIT_HEADER_RE.captures(block)?;
    Some(VisitHeader {
        bill_number: caps.name("bill")?.as_str().to_string(),
        raw_date: caps.name("date")?.as_str().to_string(),
    })
}

/// 按头部把全文切分为互不重叠的就诊块
///
/// 每块从自身头部开始, 到下一个头部之前结束; 最后一块截至文本末尾。
/// 没有头部时返回空列表, 由文档解析决定是否视为失败。
pub fn split_visit_blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = VISIT_HEADER_RE.find_iter(text).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let end = starts.get(idx + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}
