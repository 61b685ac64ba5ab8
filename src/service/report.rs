use crate::models::{DocumentImportResult, ParsedDocument, VisitOutcome};
use std::path::Path;

/// 汇总单份文档导入过程中的结果与告警
#[derive(Debug, Clone)]
pub struct ImportReport {
    patient_name: String,
    owner_name: String,
    owner_phone: String,
    total_visits: usize,
    client_found: bool,
    patient_found: bool,
    warnings: Vec<String>,
    outcomes: Vec<VisitOutcome>,
}

impl ImportReport {
    pub fn new(document: &ParsedDocument) -> Self {
        Self {
            patient_name: document.patient_name.clone(),
            owner_name: document.owner_name.clone(),
            owner_phone: document.owner_phone.clone(),
            total_visits: document.visits.len(),
            client_found: false,
            patient_found: false,
            warnings: Vec::new(),
            outcomes: Vec::with_capacity(document.visits.len()),
        }
    }

    pub fn set_identity(&mut self, client_found: bool, patient_found: bool) {
        self.client_found = client_found;
        self.patient_found = patient_found;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn record(&mut self, outcome: VisitOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(self) -> DocumentImportResult {
        let imported = self.outcomes.iter().filter(|o| o.is_imported()).count();
        let skipped = self.outcomes.iter().filter(|o| o.is_skipped()).count();
        let failed = self.outcomes.iter().filter(|o| o.is_failed()).count();

        DocumentImportResult {
            patient_name: self.patient_name,
            owner_name: self.owner_name,
            owner_phone: self.owner_phone,
            client_found: self.client_found,
            patient_found: self.patient_found,
            total_visits: self.total_visits,
            imported,
            skipped,
            failed,
            warnings: self.warnings,
            outcomes: self.outcomes,
        }
    }
}

/// 日志用的一行摘要
pub fn summary_line(result: &DocumentImportResult) -> String {
    format!(
        "{} / {}: 共 {} 次就诊, 导入 {}, 跳过 {}, 失败 {}, 告警 {}",
        result.owner_name,
        result.patient_name,
        result.total_visits,
        result.imported,
        result.skipped,
        result.failed,
        result.warnings.len()
    )
}

fn outcome_detail(outcome: &VisitOutcome) -> String {
    match outcome {
        VisitOutcome::SkippedUnmatched { reason, .. } => reason.to_string(),
        VisitOutcome::Failed { reason, .. } => reason.clone(),
        _ => String::new(),
    }
}

/// 导出每次就诊的导入结果到 CSV 文件
pub fn export_outcomes_csv(
    result: &DocumentImportResult,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use csv::Writer;
    use std::fs::File;

    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(["bill_number", "outcome", "visit_number", "invoice_number", "detail"])?;

    for outcome in &result.outcomes {
        let (visit_number, invoice_number) = match outcome {
            VisitOutcome::Imported { visit_number, invoice_number, .. } => {
                (visit_number.as_str(), invoice_number.as_str())
            }
            _ => ("", ""),
        };
        writer.write_record([
            outcome.bill_number(),
            outcome.label(),
            visit_number,
            invoice_number,
            outcome_detail(outcome).as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnmatchedReason;

    fn document() -> ParsedDocument {
        ParsedDocument {
            patient_name: "Max".to_string(),
            patient_legacy_id: "P1".to_string(),
            owner_name: "Jane Tan".to_string(),
            owner_legacy_id: "C1".to_string(),
            owner_phone: "91234567".to_string(),
            visits: Vec::new(),
        }
    }

    fn sample_result() -> DocumentImportResult {
        let mut report = ImportReport::new(&document());
        report.set_identity(true, true);
        report.record(VisitOutcome::Imported {
            bill_number: "1/1".to_string(),
            visit_number: "VR-2024-000001".to_string(),
            invoice_number: "RV-2024-000001".to_string(),
            unknown_staff: true,
        });
        report.record(VisitOutcome::SkippedDuplicate { bill_number: "1/2".to_string() });
        report.record(VisitOutcome::SkippedUnmatched {
            bill_number: "1/3".to_string(),
            reason: UnmatchedReason::PatientNotFound,
        });
        report.record(VisitOutcome::Failed { bill_number: "1/4".to_string(), reason: "timeout".to_string() });
        report.warn("Bill 1/1: unknown staff code 'ZZ'");
        report.finish()
    }

    #[test]
    fn counts_by_outcome() {
        let result = sample_result();
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(summary_line(&result).contains("导入 1"));
    }

    #[test]
    fn result_serializes_camel_case() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["clientFound"], true);
        assert_eq!(json["totalVisits"], 0);
        assert_eq!(json["ownerPhone"], "91234567");
        assert_eq!(json["outcomes"][1]["outcome"], "skipped_duplicate");
    }

    #[test]
    fn exports_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcomes.csv");
        export_outcomes_csv(&sample_result(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "1/1,imported_with_warnings,VR-2024-000001,RV-2024-000001,");
        assert_eq!(lines[3], "1/3,skipped_unmatched,,,patient not found");
    }
}
