use crate::db::ImportRepository;
use crate::error::StoreResult;
use crate::models::UnmatchedReason;

/// 身份匹配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMatch {
    Resolved { client_id: i64, patient_id: i64 },
    Unresolved { client_id: Option<i64>, reason: UnmatchedReason },
}

impl IdentityMatch {
    pub fn client_found(&self) -> bool {
        match self {
            IdentityMatch::Resolved { .. } => true,
            IdentityMatch::Unresolved { client_id, .. } => client_id.is_some(),
        }
    }

    pub fn patient_found(&self) -> bool {
        matches!(self, IdentityMatch::Resolved { .. })
    }

    /// 文档级告警文本, 已匹配时为 None
    pub fn warning(&self, owner_phone: &str, patient_name: &str) -> Option<String> {
        match self {
            IdentityMatch::Resolved { .. } => None,
            IdentityMatch::Unresolved { reason: UnmatchedReason::PhoneMissing, .. } => {
                Some("Owner phone could not be recovered from document; client not found".to_string())
            }
            IdentityMatch::Unresolved { reason: UnmatchedReason::ClientNotFound, .. } => {
                Some(format!("Client not found for owner phone {}", owner_phone))
            }
            IdentityMatch::Unresolved { client_id, reason: UnmatchedReason::PatientNotFound } => {
                Some(format!(
                    "Patient '{}' not found for client {}",
                    patient_name,
                    client_id.unwrap_or_default()
                ))
            }
        }
    }
}

/// 把解析出的主人手机号和患者名字映射到已有的客户/患者
pub struct IdentityResolver<'a, R> {
    repo: &'a R,
}

impl<'a, R: ImportRepository> IdentityResolver<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn resolve(&self, owner_phone: &str, patient_name: &str) -> StoreResult<IdentityMatch> {
        if owner_phone.is_empty() {
            return Ok(IdentityMatch::Unresolved { client_id: None, reason: UnmatchedReason::PhoneMissing });
        }

        let Some(client_id) = self.repo.find_client_by_phone_suffix(owner_phone).await? else {
            tracing::warn!("No client matches phone suffix {}", owner_phone);
            return Ok(IdentityMatch::Unresolved { client_id: None, reason: UnmatchedReason::ClientNotFound });
        };

        let patient_name = patient_name.trim();
        let mut patient_id = self.repo.find_patient_by_exact_name(client_id, patient_name).await?;
        if patient_id.is_none() && !patient_name.is_empty() {
            // 第二次机会: 名字包含匹配, 取第一条 ("Max" 也会命中 "Maxie")
            patient_id = self.repo.find_patient_by_name_contains(client_id, patient_name).await?;
            if let Some(id) = patient_id {
                tracing::info!("Patient '{}' matched by partial name as {}", patient_name, id);
            }
        }

        Ok(match patient_id {
            Some(patient_id) => IdentityMatch::Resolved { client_id, patient_id },
            None => {
                tracing::warn!("Patient '{}' not found for client {}", patient_name, client_id);
                IdentityMatch::Unresolved { client_id: Some(client_id), reason: UnmatchedReason::PatientNotFound }
            }
        })
    }
}
