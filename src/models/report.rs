use serde::{Deserialize, Serialize};
use std::fmt;

/// 身份未匹配的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// 文档中没有可识别的手机号, 无法查找客户
    PhoneMissing,
    ClientNotFound,
    PatientNotFound,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedReason::PhoneMissing => f.write_str("client not found (owner phone not recoverable)"),
            UnmatchedReason::ClientNotFound => f.write_str("client not found"),
            UnmatchedReason::PatientNotFound => f.write_str("patient not found"),
        }
    }
}

/// 单次就诊的导入结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VisitOutcome {
    Imported {
        bill_number: String,
        visit_number: String,
        invoice_number: String,
        /// 员工代码无法识别, 就诊未归属员工
        unknown_staff: bool,
    },
    SkippedDuplicate {
        bill_number: String,
    },
    SkippedInvalidDate {
        bill_number: String,
    },
    SkippedUnmatched {
        bill_number: String,
        reason: UnmatchedReason,
    },
    Failed {
        bill_number: String,
        reason: String,
    },
}

impl VisitOutcome {
    pub fn bill_number(&self) -> &str {
        match self {
            VisitOutcome::Imported { bill_number, .. }
            | VisitOutcome::SkippedDuplicate { bill_number }
            | VisitOutcome::SkippedInvalidDate { bill_number }
            | VisitOutcome::SkippedUnmatched { bill_number, .. }
            | VisitOutcome::Failed { bill_number, .. } => bill_number,
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self, VisitOutcome::Imported { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            VisitOutcome::SkippedDuplicate { .. }
                | VisitOutcome::SkippedInvalidDate { .. }
                | VisitOutcome::SkippedUnmatched { .. }
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, VisitOutcome::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            VisitOutcome::Imported { unknown_staff: false, .. } => "imported",
            VisitOutcome::Imported { unknown_staff: true, .. } => "imported_with_warnings",
            VisitOutcome::SkippedDuplicate { .. } => "skipped_duplicate",
            VisitOutcome::SkippedInvalidDate { .. } => "skipped_invalid_date",
            VisitOutcome::SkippedUnmatched { .. } => "skipped_unmatched",
            VisitOutcome::Failed { .. } => "failed",
        }
    }
}

/// 单份文档的导入结果 (返回给调用方)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentImportResult {
    pub patient_name: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub client_found: bool,
    pub patient_found: bool,
    pub total_visits: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub warnings: Vec<String>,
    pub outcomes: Vec<VisitOutcome>,
}
