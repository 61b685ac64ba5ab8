use crate::db::ImportRepository;
use crate::error::StoreResult;
use crate::models::SequenceKind;
use chrono::{Datelike, NaiveDate};

/// `VR-2024-000042` / `RV-2024-000042`
pub fn format_document_number(kind: SequenceKind, year: i32, counter: i64) -> String {
    format!("{}-{}-{:06}", kind.prefix(), year, counter)
}

/// 就诊记录号与发票号生成器
///
/// 年份取自就诊日期而不是当前时间; 计数由仓储原子分配。
pub struct SequenceGenerator<'a, R> {
    repo: &'a R,
}

impl<'a, R: ImportRepository> SequenceGenerator<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn next(&self, kind: SequenceKind, date: NaiveDate) -> StoreResult<String> {
        let year = date.year();
        let counter = self.repo.allocate_next(kind, year).await?;
        Ok(format_document_number(kind, year, counter))
    }

    pub async fn next_visit_number(&self, date: NaiveDate) -> StoreResult<String> {
        self.next(SequenceKind::VisitRecord, date).await
    }

    pub async fn next_invoice_number(&self, date: NaiveDate) -> StoreResult<String> {
        self.next(SequenceKind::Invoice, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::models::{NewInvoice, INVOICE_STATUS_PAID};
    use bigdecimal::BigDecimal;

    fn existing_invoice(number: &str, bill: &str) -> NewInvoice {
        NewInvoice {
            invoice_number: number.to_string(),
            bill_number: bill.to_string(),
            client_id: 1,
            patient_id: 2,
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            subtotal: BigDecimal::from(0),
            tax: BigDecimal::from(0),
            total: BigDecimal::from(0),
            status: INVOICE_STATUS_PAID.to_string(),
        }
    }

    #[test]
    fn zero_padded_format() {
        assert_eq!(format_document_number(SequenceKind::VisitRecord, 2024, 7), "VR-2024-000007");
        assert_eq!(format_document_number(SequenceKind::Invoice, 2019, 123456), "RV-2019-123456");
    }

    #[tokio::test]
    async fn counters_increment_per_kind_and_year() {
        let repo = MemoryRepository::new();
        let generator = SequenceGenerator::new(&repo);
        let feb_2024 = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();
        let mar_2023 = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();

        assert_eq!(generator.next_visit_number(feb_2024).await.unwrap(), "VR-2024-000001");
        assert_eq!(generator.next_visit_number(feb_2024).await.unwrap(), "VR-2024-000002");
        assert_eq!(generator.next_invoice_number(feb_2024).await.unwrap(), "RV-2024-000001");
        assert_eq!(generator.next_visit_number(mar_2023).await.unwrap(), "VR-2023-000001");
    }

    #[tokio::test]
    async fn invoice_counter_seeds_from_max_suffix() {
        let repo = MemoryRepository::new();
        repo.add_existing_invoice(existing_invoice("RV-2024-000041", "1/1"));
        repo.add_existing_invoice(existing_invoice("RV-2024-000007", "1/2"));
        repo.add_existing_invoice(existing_invoice("RV-2023-000900", "1/3"));

        let generator = SequenceGenerator::new(&repo);
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(generator.next_invoice_number(date).await.unwrap(), "RV-2024-000042");
        assert_eq!(generator.next_invoice_number(date).await.unwrap(), "RV-2024-000043");
    }
}
