pub mod field;
pub mod print;
pub mod receipt;

pub use field::{FieldName, FieldValueSet, LabelOverrides};
pub use print::{PrintJob, PrintOutcome, PrintProgress};
pub use receipt::{ReceiptMode, ReceiptQuery, ReceiptRecord};
