use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单据号种类 (就诊记录 / 发票)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    VisitRecord,
    Invoice,
}

impl SequenceKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SequenceKind::VisitRecord => "VR",
            SequenceKind::Invoice => "RV",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SequenceKind::VisitRecord => "visit_record",
            SequenceKind::Invoice => "invoice",
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 发票状态, 历史导入的发票一律为已结清
pub const INVOICE_STATUS_PAID: &str = "paid";

/// 待写入的就诊记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVisitRecord {
    pub visit_number: String,
    pub client_id: i64,
    pub patient_id: i64,
    pub staff_id: Option<i64>,
    pub visit_date: NaiveDate,
    pub weight: Option<BigDecimal>,
    pub temperature: Option<BigDecimal>,
    pub history: String,
    pub clinical_examination: String,
    pub treatment: String,
    pub comments: String,
}

/// 待写入的发票主表, bill_number 为幂等键
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub bill_number: String,
    pub client_id: i64,
    pub patient_id: i64,
    pub invoice_date: NaiveDate,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub status: String,
}

/// 待写入的发票明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoiceLineItem {
    pub description: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub total: BigDecimal,
}

/// 单次就诊需要在一个事务中写入的全部数据
#[derive(Debug, Clone)]
pub struct VisitBundle {
    pub visit: NewVisitRecord,
    pub invoice: NewInvoice,
    pub line_items: Vec<NewInvoiceLineItem>,
}

/// 写入结果
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Written { visit_record_id: i64, invoice_id: i64 },
    /// 并发导入已抢先写入相同单据号
    DuplicateBill,
}
