pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod parser;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, ImportRepository, MemoryRepository, PgImportRepository};
pub use error::{ImportError, ParseError, StoreError};
pub use parser::{parse_document, ParseOptions};
pub use service::{PmsImporter, StaffDirectory};
