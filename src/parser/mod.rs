pub mod blocks;
pub mod document;
pub mod section;
pub mod visit;

pub use blocks::{parse_visit_header, split_visit_blocks, VisitHeader};
pub use document::{normalize_phone, parse_document, parse_document_with, ParseOptions};
pub use section::extract_section;
pub use visit::{match_line_item, parse_legacy_date, parse_visit, LineMatch};

use crate::error::ParseError;
use crate::models::ParsedDocument;
use rayon::prelude::*;

/// 并行解析多份文档, 结果顺序与输入一致
pub fn parse_documents(
    texts: &[String],
    options: &ParseOptions,
) -> Vec<Result<ParsedDocument, ParseError>> {
    texts
        .par_iter()
        .map(|text| parse_document_with(text, options))
        .collect()
}
