pub mod parsed;
pub mod record;
pub mod report;

pub use parsed::{ParsedDocument, ParsedLineItem, ParsedVisit, VisitSections, Vitals};
pub use record::{
    NewInvoice, NewInvoiceLineItem, NewVisitRecord, SequenceKind, VisitBundle, WriteOutcome,
    INVOICE_STATUS_PAID,
};
pub use report::{DocumentImportResult, UnmatchedReason, VisitOutcome};
