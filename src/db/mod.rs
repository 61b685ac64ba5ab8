pub mod memory;
pub mod pool;
pub mod queries;
pub mod repository;

pub use memory::{MemoryRepository, RowCounts};
pub use pool::create_pool;
pub use queries::PgImportRepository;
pub use repository::ImportRepository;
