use crate::error::StoreResult;
use crate::models::{SequenceKind, VisitBundle, WriteOutcome};
use std::future::Future;

/// 导入流程依赖的仓储能力
///
/// 所有返回的 future 均为 Send, 以便在 axum handler 中直接使用。
pub trait ImportRepository: Send + Sync {
    /// 按手机号后缀查找客户 (库中号码可能带区号或格式字符)
    fn find_client_by_phone_suffix(
        &self,
        digits: &str,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    /// 客户名下按名字精确匹配患者 (不区分大小写)
    fn find_patient_by_exact_name(
        &self,
        client_id: i64,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    /// 客户名下按名字包含匹配患者 (不区分大小写), 取第一条
    fn find_patient_by_name_contains(
        &self,
        client_id: i64,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    fn invoice_exists_for_bill_number(
        &self,
        bill_number: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// 某年份已有的就诊记录数量
    fn visit_number_seed(&self, year: i32) -> impl Future<Output = StoreResult<i64>> + Send;

    /// 某年份已有发票号的最大数字后缀
    fn max_invoice_number_seed(&self, year: i32) -> impl Future<Output = StoreResult<i64>> + Send;

    /// 原子分配下一个序号; 计数器首次使用时由上面两个种子初始化
    fn allocate_next(
        &self,
        kind: SequenceKind,
        year: i32,
    ) -> impl Future<Output = StoreResult<i64>> + Send;

    /// 在一个事务中写入就诊记录、发票及其明细
    fn write_visit_bundle(
        &self,
        bundle: &VisitBundle,
    ) -> impl Future<Output = StoreResult<WriteOutcome>> + Send;
}
