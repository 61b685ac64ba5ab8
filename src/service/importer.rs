use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use indexmap::IndexSet;

use crate::db::ImportRepository;
use crate::error::{ImportError, Result, StoreResult};
use crate::models::{
    DocumentImportResult, NewInvoice, NewInvoiceLineItem, NewVisitRecord, ParsedDocument,
    ParsedVisit, VisitBundle, VisitOutcome, WriteOutcome, INVOICE_STATUS_PAID,
};
use crate::parser::{parse_document_with, parse_documents, ParseOptions};
use crate::service::identity::{IdentityMatch, IdentityResolver};
use crate::service::report::{summary_line, ImportReport};
use crate::service::sequence::SequenceGenerator;
use crate::service::staff::{StaffDirectory, StaffResolution};

/// 写入一次就诊时的归属信息
#[derive(Debug, Clone, Copy)]
pub struct VisitContext {
    pub client_id: i64,
    pub patient_id: i64,
    pub staff_id: Option<i64>,
    pub date: NaiveDate,
}

/// 把解析出的就诊转换为待写入数据: 明细金额 = 数量 × 单价, 小计为明细之和, 不计税, 状态为已结清
pub fn build_visit_bundle(
    visit: &ParsedVisit,
    context: VisitContext,
    visit_number: String,
    invoice_number: String,
) -> VisitBundle {
    let line_items: Vec<NewInvoiceLineItem> = visit
        .line_items
        .iter()
        .map(|item| NewInvoiceLineItem {
            description: item.description.clone(),
            quantity: item.quantity.clone(),
            unit_price: item.unit_price.clone(),
            total: &item.quantity * &item.unit_price,
        })
        .collect();

    let subtotal = line_items
        .iter()
        .fold(BigDecimal::zero(), |acc, item| acc + &item.total);

    VisitBundle {
        visit: NewVisitRecord {
            visit_number,
            client_id: context.client_id,
            patient_id: context.patient_id,
            staff_id: context.staff_id,
            visit_date: context.date,
            weight: visit.vitals.weight.clone(),
            temperature: visit.vitals.temperature.clone(),
            history: visit.sections.history.clone(),
            clinical_examination: visit.sections.clinical_examination.clone(),
            treatment: visit.sections.treatment.clone(),
            comments: visit.sections.comments.clone(),
        },
        invoice: NewInvoice {
            invoice_number,
            bill_number: visit.bill_number.clone(),
            client_id: context.client_id,
            patient_id: context.patient_id,
            invoice_date: context.date,
            total: subtotal.clone(),
            subtotal,
            tax: BigDecimal::zero(),
            status: INVOICE_STATUS_PAID.to_string(),
        },
        line_items,
    }
}

/// 旧系统病历导入服务
///
/// 按文档顺序逐次处理就诊: 单据号已存在则跳过, 否则在一个事务中写入就诊记录、发票和明细。
/// 单次就诊失败只记录在结果中, 不会中断同一文档内的其他就诊。
pub struct PmsImporter<R> {
    repo: R,
    staff: StaffDirectory,
    options: ParseOptions,
}

impl<R: ImportRepository> PmsImporter<R> {
    pub fn new(repo: R, staff: StaffDirectory, options: ParseOptions) -> Self {
        Self { repo, staff, options }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.options
    }

    /// 解析并导入一份文档
    pub async fn import_text(&self, text: &str) -> Result<DocumentImportResult> {
        let document = parse_document_with(text, &self.options)?;
        self.import_document(&document).await
    }

    /// 批量导入: 并行解析, 然后按提交顺序逐份导入
    pub async fn import_batch(&self, texts: &[String]) -> Vec<Result<DocumentImportResult>> {
        let parsed = parse_documents(texts, &self.options);
        let mut results = Vec::with_capacity(parsed.len());

        for (idx, document) in parsed.into_iter().enumerate() {
            let result = match document {
                Ok(document) => self.import_document(&document).await,
                Err(e) => {
                    tracing::warn!("Document {} of batch rejected: {}", idx + 1, e);
                    Err(ImportError::from(e))
                }
            };
            results.push(result);
        }

        results
    }

    pub async fn import_document(&self, document: &ParsedDocument) -> Result<DocumentImportResult> {
        tracing::info!(
            "开始导入: owner {} ({}), patient {} ({}), {} 次就诊",
            document.owner_name,
            document.owner_legacy_id,
            document.patient_name,
            document.patient_legacy_id,
            document.visits.len()
        );

        let mut report = ImportReport::new(document);

        let identity = IdentityResolver::new(&self.repo)
            .resolve(&document.owner_phone, &document.patient_name)
            .await?;
        report.set_identity(identity.client_found(), identity.patient_found());
        if let Some(warning) = identity.warning(&document.owner_phone, &document.patient_name) {
            report.warn(warning);
        }

        let sequences = SequenceGenerator::new(&self.repo);
        let mut seen_bills: IndexSet<&str> = IndexSet::new();

        for visit in &document.visits {
            let mut warnings = Vec::new();

            let outcome = if !seen_bills.insert(visit.bill_number.as_str()) {
                warnings.push(format!(
                    "Bill {}: appears more than once in document, later occurrence skipped",
                    visit.bill_number
                ));
                VisitOutcome::SkippedDuplicate { bill_number: visit.bill_number.clone() }
            } else {
                match self.import_visit(visit, identity, &sequences, &mut warnings).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!("Bill {} import failed: {}", visit.bill_number, e);
                        warnings.push(format!("Bill {}: import failed: {}", visit.bill_number, e));
                        VisitOutcome::Failed { bill_number: visit.bill_number.clone(), reason: e.to_string() }
                    }
                }
            };

            log_outcome(&outcome);
            for warning in warnings {
                report.warn(warning);
            }
            report.record(outcome);
        }

        let result = report.finish();
        tracing::info!("导入完成: {}", summary_line(&result));
        Ok(result)
    }

    /// 单次就诊的状态迁移: 重复 -> 身份未匹配 -> 日期无效 -> 写入
    async fn import_visit(
        &self,
        visit: &ParsedVisit,
        identity: IdentityMatch,
        sequences: &SequenceGenerator<'_, R>,
        warnings: &mut Vec<String>,
    ) -> StoreResult<VisitOutcome> {
        let bill_number = visit.bill_number.clone();

        // 重复导入是常规情况, 不告警
        if self.repo.invoice_exists_for_bill_number(&visit.bill_number).await? {
            return Ok(VisitOutcome::SkippedDuplicate { bill_number });
        }

        let (client_id, patient_id) = match identity {
            IdentityMatch::Resolved { client_id, patient_id } => (client_id, patient_id),
            IdentityMatch::Unresolved { reason, .. } => {
                warnings.push(format!("Bill {}: skipped, {}", bill_number, reason));
                return Ok(VisitOutcome::SkippedUnmatched { bill_number, reason });
            }
        };

        let Some(date) = visit.date else {
            warnings.push(format!(
                "Bill {}: invalid visit date '{}', skipped",
                bill_number, visit.raw_date
            ));
            return Ok(VisitOutcome::SkippedInvalidDate { bill_number });
        };

        let staff = self.staff.resolve(&visit.staff_code);
        let context = VisitContext { client_id, patient_id, staff_id: staff.staff_id(), date };

        let visit_number = sequences.next_visit_number(date).await?;
        let invoice_number = sequences.next_invoice_number(date).await?;
        let bundle = build_visit_bundle(visit, context, visit_number.clone(), invoice_number.clone());

        match self.repo.write_visit_bundle(&bundle).await? {
            WriteOutcome::Written { .. } => {
                let unknown_staff = staff == StaffResolution::Unknown;
                if unknown_staff {
                    warnings.push(format!(
                        "Bill {}: unknown staff code '{}', imported without staff attribution",
                        bill_number, visit.staff_code
                    ));
                }
                Ok(VisitOutcome::Imported { bill_number, visit_number, invoice_number, unknown_staff })
            }
            WriteOutcome::DuplicateBill => Ok(VisitOutcome::SkippedDuplicate { bill_number }),
        }
    }
}

fn log_outcome(outcome: &VisitOutcome) {
    match outcome {
        VisitOutcome::Imported { bill_number, visit_number, invoice_number, unknown_staff } => {
            tracing::info!(
                "Bill {} imported as {} / {}{}",
                bill_number,
                visit_number,
                invoice_number,
                if *unknown_staff { " (unknown staff)" } else { "" }
            );
        }
        VisitOutcome::SkippedDuplicate { bill_number } => {
            tracing::debug!("Bill {} already imported, skipping", bill_number);
        }
        VisitOutcome::SkippedInvalidDate { bill_number } => {
            tracing::warn!("Bill {} has an invalid date, skipping", bill_number);
        }
        VisitOutcome::SkippedUnmatched { bill_number, reason } => {
            tracing::warn!("Bill {} skipped: {}", bill_number, reason);
        }
        VisitOutcome::Failed { .. } => {}
    }
}
