pub mod identity;
pub mod importer;
pub mod report;
pub mod sequence;
pub mod staff;

pub use identity::{IdentityMatch, IdentityResolver};
pub use importer::{build_visit_bundle, PmsImporter, VisitContext};
pub use report::{export_outcomes_csv, summary_line, ImportReport};
pub use sequence::{format_document_number, SequenceGenerator};
pub use staff::{StaffDirectory, StaffResolution};
