use crate::db::repository::ImportRepository;
use crate::error::StoreResult;
use crate::models::{SequenceKind, VisitBundle, WriteOutcome};
use sqlx::PgPool;

/// invoices.bill_number 唯一约束名, 用于识别并发导入冲突
const BILL_NUMBER_CONSTRAINT: &str = "invoices_bill_number_key";

/// 基于 PostgreSQL 的导入仓储
#[derive(Clone)]
pub struct PgImportRepository {
    pool: PgPool,
}

impl PgImportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ImportRepository for PgImportRepository {
    /// 查询客户 (先去掉库中号码的非数字字符再比较后缀)
    async fn find_client_by_phone_suffix(&self, digits: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM clients
            WHERE regexp_replace(phone, '\D', '', 'g') LIKE '%' || $1
            ORDER BY id
            LIMIT 1
            "#
        )
        .bind(digits)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_patient_by_exact_name(&self, client_id: i64, name: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM patients
            WHERE client_id = $1
              AND lower(name) = lower($2)
            ORDER BY id
            LIMIT 1
            "#
        )
        .bind(client_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_patient_by_name_contains(&self, client_id: i64, name: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM patients
            WHERE client_id = $1
              AND position(lower($2) in lower(name)) > 0
            ORDER BY id
            LIMIT 1
            "#
        )
        .bind(client_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn invoice_exists_for_bill_number(&self, bill_number: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM invoices WHERE bill_number = $1)
            "#
        )
        .bind(bill_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn visit_number_seed(&self, year: i32) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count(*)
            FROM visit_records
            WHERE visit_number LIKE $1
            "#
        )
        .bind(format!("{}-{}-%", SequenceKind::VisitRecord.prefix(), year))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn max_invoice_number_seed(&self, year: i32) -> StoreResult<i64> {
        let max = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT coalesce(max(CAST(substring(invoice_number FROM '^[A-Z]+-\d{4}-(\d+)$') AS BIGINT)), 0)
            FROM invoices
            WHERE invoice_number ~ $1
            "#
        )
        // 只统计纯数字后缀, 其他格式的历史发票号不参与
        .bind(format!("^{}-{}-\\d+$", SequenceKind::Invoice.prefix(), year))
        .fetch_one(&self.pool)
        .await?;
        Ok(max)
    }

    /// 计数器行不存在时以现有数据为种子插入, 已存在则原子加一
    async fn allocate_next(&self, kind: SequenceKind, year: i32) -> StoreResult<i64> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM document_sequences WHERE kind = $1 AND year = $2)
            "#
        )
        .bind(kind.as_str())
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        let seed = if exists {
            0
        } else {
            match kind {
                SequenceKind::VisitRecord => self.visit_number_seed(year).await?,
                SequenceKind::Invoice => self.max_invoice_number_seed(year).await?,
            }
        };

        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO document_sequences (kind, year, last_value)
            VALUES ($1, $2, $3 + 1)
            ON CONFLICT (kind, year)
            DO UPDATE SET last_value = document_sequences.last_value + 1
            RETURNING last_value
            "#
        )
        .bind(kind.as_str())
        .bind(year)
        .bind(seed)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Allocated {} sequence {} for {}", kind, value, year);
        Ok(value)
    }

    async fn write_visit_bundle(&self, bundle: &VisitBundle) -> StoreResult<WriteOutcome> {
        let start_time = std::time::Instant::now();
        let mut tx = self.pool.begin().await?;

        let visit = &bundle.visit;
        let visit_record_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO visit_records (
                visit_number, client_id, patient_id, staff_id, visit_date,
                weight, temperature,
                history, clinical_examination, treatment, comments
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#
        )
        .bind(&visit.visit_number)
        .bind(visit.client_id)
        .bind(visit.patient_id)
        .bind(visit.staff_id)
        .bind(visit.visit_date)
        .bind(&visit.weight)
        .bind(&visit.temperature)
        .bind(&visit.history)
        .bind(&visit.clinical_examination)
        .bind(&visit.treatment)
        .bind(&visit.comments)
        .fetch_one(&mut *tx)
        .await?;

        let invoice = &bundle.invoice;
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO invoices (
                invoice_number, bill_number, client_id, patient_id, visit_record_id,
                invoice_date, subtotal, tax, total, amount_paid, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10)
            RETURNING id
            "#
        )
        .bind(&invoice.invoice_number)
        .bind(&invoice.bill_number)
        .bind(invoice.client_id)
        .bind(invoice.patient_id)
        .bind(visit_record_id)
        .bind(invoice.invoice_date)
        .bind(&invoice.subtotal)
        .bind(&invoice.tax)
        .bind(&invoice.total)
        .bind(&invoice.status)
        .fetch_one(&mut *tx)
        .await;

        let invoice_id = match inserted {
            Ok(id) => id,
            Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some(BILL_NUMBER_CONSTRAINT) => {
                tracing::info!("Bill {} was imported concurrently, rolling back", invoice.bill_number);
                tx.rollback().await?;
                return Ok(WriteOutcome::DuplicateBill);
            }
            Err(e) => return Err(e.into()),
        };

        if !bundle.line_items.is_empty() {
            let mut query_builder = sqlx::QueryBuilder::new(
                "INSERT INTO invoice_line_items (
                    invoice_id, description, quantity, unit_price, total
                ) "
            );

            query_builder.push_values(&bundle.line_items, |mut b, item| {
                b.push_bind(invoice_id)
                    .push_bind(&item.description)
                    .push_bind(&item.quantity)
                    .push_bind(&item.unit_price)
                    .push_bind(&item.total);
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Bill {} written as {} / {} ({} line items), 耗时: {:?}",
            invoice.bill_number,
            visit.visit_number,
            invoice.invoice_number,
            bundle.line_items.len(),
            start_time.elapsed()
        );

        Ok(WriteOutcome::Written { visit_record_id, invoice_id })
    }
}
