use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 账单明细行 (解析阶段的临时结构，不直接落库)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLineItem {
    pub staff_code: String,      // 执行人员代码, 1-4 个大写字母
    pub quantity: BigDecimal,    // 数量
    pub description: String,     // 服务/商品描述
    pub unit_price: BigDecimal,  // 单价
}

/// 体征数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub weight: Option<BigDecimal>,
    pub temperature: Option<BigDecimal>,
}

/// 病历自由文本段落，缺失的段落为空字符串
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSections {
    pub history: String,
    pub clinical_examination: String,
    pub treatment: String,
    pub comments: String,
}

/// 单次就诊 (一个账单块)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedVisit {
    pub bill_number: String,
    /// 原文中的日期文本, 用于告警信息
    pub raw_date: String,
    /// 日期无法解析时为 None, 由导入流程跳过并告警
    pub date: Option<NaiveDate>,
    pub staff_code: String,
    pub vitals: Vitals,
    pub sections: VisitSections,
    pub line_items: Vec<ParsedLineItem>,
}

/// 整份文档的解析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub patient_name: String,
    pub patient_legacy_id: String,
    pub owner_name: String,
    pub owner_legacy_id: String,
    /// 8 位本地手机号, 无法识别时为空字符串
    pub owner_phone: String,
    pub visits: Vec<ParsedVisit>,
}

impl ParsedDocument {
    pub fn has_phone(&self) -> bool {
        !self.owner_phone.is_empty()
    }
}
