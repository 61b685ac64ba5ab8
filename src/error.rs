use thiserror::Error;

/// 文档级解析失败, 整份文档拒绝导入
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Patient header line (\"For <name> (<id>)\") not found")]
    MissingPatientHeader,

    #[error("Owner header line (\"Owner <name> (<id>)\") not found")]
    MissingOwnerHeader,

    #[error("No visit blocks found in document")]
    NoVisits,
}

/// 仓储访问失败
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ImportError>;
