pub mod finding;
pub mod invoice;
pub mod purchase_order;

pub use finding::{AuditFinding, AuditVerdict, CONNECTION_FAILED_NARRATIVE, DEFAULT_NARRATIVE};
pub use invoice::{InvoiceRecord, InvoiceStatus, SourceMode};
pub use purchase_order::PurchaseOrderRecord;
