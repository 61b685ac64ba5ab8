use crate::db::repository::ImportRepository;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    NewInvoice, NewInvoiceLineItem, NewVisitRecord, SequenceKind, VisitBundle, WriteOutcome,
};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Clone)]
pub struct MemoryClient {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct MemoryPatient {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct StoredInvoice {
    pub id: i64,
    pub visit_record_id: i64,
    pub invoice: NewInvoice,
}

#[derive(Debug, Clone)]
pub struct StoredLineItem {
    pub invoice_id: i64,
    pub item: NewInvoiceLineItem,
}

/// 各表行数快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub visit_records: usize,
    pub invoices: usize,
    pub line_items: usize,
}

/// 内存仓储 (本地试跑与测试使用), 语义与 PostgreSQL 实现一致
#[derive(Debug, Default)]
pub struct MemoryRepository {
    next_id: AtomicI64,
    clients: DashMap<i64, MemoryClient>,
    patients: DashMap<i64, MemoryPatient>,
    visit_records: DashMap<i64, NewVisitRecord>,
    invoices: DashMap<i64, StoredInvoice>,
    line_items: DashMap<i64, StoredLineItem>,
    /// bill_number -> invoice id, 相当于唯一约束
    bill_index: DashMap<String, i64>,
    sequences: DashMap<(SequenceKind, i32), i64>,
    /// 写入时模拟失败的单据号
    failing_bills: DashSet<String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn add_client(&self, name: &str, phone: &str) -> i64 {
        let id = self.next_id();
        self.clients.insert(id, MemoryClient { id, name: name.to_string(), phone: phone.to_string() });
        id
    }

    pub fn add_patient(&self, client_id: i64, name: &str) -> i64 {
        let id = self.next_id();
        self.patients.insert(id, MemoryPatient { id, client_id, name: name.to_string() });
        id
    }

    /// 预置一张已存在的发票 (模拟此前导入过的单据)
    pub fn add_existing_invoice(&self, invoice: NewInvoice) -> i64 {
        let id = self.next_id();
        self.bill_index.insert(invoice.bill_number.clone(), id);
        self.invoices.insert(id, StoredInvoice { id, visit_record_id: 0, invoice });
        id
    }

    pub fn fail_writes_for(&self, bill_number: &str) {
        self.failing_bills.insert(bill_number.to_string());
    }

    pub fn row_counts(&self) -> RowCounts {
        RowCounts {
            visit_records: self.visit_records.len(),
            invoices: self.invoices.len(),
            line_items: self.line_items.len(),
        }
    }

    pub fn invoice_by_bill_number(&self, bill_number: &str) -> Option<StoredInvoice> {
        let id = *self.bill_index.get(bill_number)?;
        self.invoices.get(&id).map(|inv| inv.value().clone())
    }

    pub fn visit_record(&self, id: i64) -> Option<NewVisitRecord> {
        self.visit_records.get(&id).map(|v| v.value().clone())
    }

    pub fn line_items_for(&self, invoice_id: i64) -> Vec<NewInvoiceLineItem> {
        let mut items: Vec<(i64, NewInvoiceLineItem)> = self
            .line_items
            .iter()
            .filter(|entry| entry.invoice_id == invoice_id)
            .map(|entry| (*entry.key(), entry.item.clone()))
            .collect();
        items.sort_by_key(|(id, _)| *id);
        items.into_iter().map(|(_, item)| item).collect()
    }

    fn first_patient(&self, client_id: i64, matches: impl Fn(&str) -> bool) -> Option<i64> {
        self.patients
            .iter()
            .filter(|p| p.client_id == client_id && matches(p.name.to_lowercase().as_str()))
            .map(|p| p.id)
            .min()
    }
}

impl ImportRepository for MemoryRepository {
    async fn find_client_by_phone_suffix(&self, digits: &str) -> StoreResult<Option<i64>> {
        Ok(self
            .clients
            .iter()
            .filter(|c| {
                let stored: String = c.phone.chars().filter(|ch| ch.is_ascii_digit()).collect();
                stored.ends_with(digits)
            })
            .map(|c| c.id)
            .min())
    }

    async fn find_patient_by_exact_name(&self, client_id: i64, name: &str) -> StoreResult<Option<i64>> {
        let wanted = name.to_lowercase();
        Ok(self.first_patient(client_id, |candidate| candidate == wanted))
    }

    async fn find_patient_by_name_contains(&self, client_id: i64, name: &str) -> StoreResult<Option<i64>> {
        let wanted = name.to_lowercase();
        Ok(self.first_patient(client_id, |candidate| candidate.contains(&wanted)))
    }

    async fn invoice_exists_for_bill_number(&self, bill_number: &str) -> StoreResult<bool> {
        Ok(self.bill_index.contains_key(bill_number))
    }

    async fn visit_number_seed(&self, year: i32) -> StoreResult<i64> {
        let prefix = format!("{}-{}-", SequenceKind::VisitRecord.prefix(), year);
        let count = self
            .visit_records
            .iter()
            .filter(|v| v.visit_number.starts_with(&prefix))
            .count();
        Ok(count as i64)
    }

    async fn max_invoice_number_seed(&self, year: i32) -> StoreResult<i64> {
        let prefix = format!("{}-{}-", SequenceKind::Invoice.prefix(), year);
        let max = self
            .invoices
            .iter()
            .filter_map(|inv| {
                inv.invoice
                    .invoice_number
                    .strip_prefix(&prefix)
                    .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|suffix| suffix.parse::<i64>().ok())
            })
            .max()
            .unwrap_or(0);
        Ok(max)
    }

    async fn allocate_next(&self, kind: SequenceKind, year: i32) -> StoreResult<i64> {
        let seed = if self.sequences.contains_key(&(kind, year)) {
            0
        } else {
            match kind {
                SequenceKind::VisitRecord => self.visit_number_seed(year).await?,
                SequenceKind::Invoice => self.max_invoice_number_seed(year).await?,
            }
        };

        let mut counter = self.sequences.entry((kind, year)).or_insert(seed);
        *counter += 1;
        Ok(*counter)
    }

    async fn write_visit_bundle(&self, bundle: &VisitBundle) -> StoreResult<WriteOutcome> {
        if self.failing_bills.contains(&bundle.invoice.bill_number) {
            return Err(StoreError::Unavailable(format!(
                "simulated write failure for bill {}",
                bundle.invoice.bill_number
            )));
        }

        // 持有 bill_index 的条目锁直到全部写入完成
        let slot = match self.bill_index.entry(bundle.invoice.bill_number.clone()) {
            Entry::Occupied(_) => return Ok(WriteOutcome::DuplicateBill),
            Entry::Vacant(slot) => slot,
        };

        let visit_record_id = self.next_id();
        self.visit_records.insert(visit_record_id, bundle.visit.clone());

        let invoice_id = self.next_id();
        self.invoices.insert(
            invoice_id,
            StoredInvoice { id: invoice_id, visit_record_id, invoice: bundle.invoice.clone() },
        );

        for item in &bundle.line_items {
            let id = self.next_id();
            self.line_items.insert(id, StoredLineItem { invoice_id, item: item.clone() });
        }

        slot.insert(invoice_id);
        Ok(WriteOutcome::Written { visit_record_id, invoice_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn existing_invoice(invoice_number: &str, bill_number: &str) -> NewInvoice {
        NewInvoice {
            invoice_number: invoice_number.to_string(),
            bill_number: bill_number.to_string(),
            client_id: 1,
            patient_id: 1,
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            subtotal: BigDecimal::from(100),
            tax: BigDecimal::from(0),
            total: BigDecimal::from(100),
            status: "paid".to_string(),
        }
    }

    async fn allocate_concurrently(repo: Arc<MemoryRepository>, tasks: usize) -> Vec<i64> {
        let handles: Vec<_> = (0..tasks)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.allocate_next(SequenceKind::Invoice, 2024).await })
            })
            .collect();

        let mut values = Vec::with_capacity(tasks);
        for handle in handles {
            values.push(handle.await.expect("task panicked").expect("allocate"));
        }
        values.sort_unstable();
        values
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocation_on_fresh_counter() {
        let repo = Arc::new(MemoryRepository::new());
        let values = allocate_concurrently(repo, 64).await;
        assert_eq!(values, (1..=64).collect::<Vec<i64>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocation_continues_from_seed() {
        let repo = Arc::new(MemoryRepository::new());
        repo.add_existing_invoice(existing_invoice("RV-2024-000017", "1/1"));
        repo.add_existing_invoice(existing_invoice("RV-2024-000099-A", "1/2"));
        repo.add_existing_invoice(existing_invoice("RV-2024-", "1/3"));

        let values = allocate_concurrently(repo, 32).await;
        assert_eq!(values, (18..=49).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn invoice_seed_ignores_non_numeric_suffixes() {
        let repo = MemoryRepository::new();
        repo.add_existing_invoice(existing_invoice("RV-2024-000017", "1/1"));
        repo.add_existing_invoice(existing_invoice("RV-2024-000099-A", "1/2"));
        repo.add_existing_invoice(existing_invoice("RV-2024-+500", "1/3"));
        assert_eq!(repo.max_invoice_number_seed(2024).await.unwrap(), 17);
    }
}
