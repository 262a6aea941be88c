pub mod invoice;
pub mod session;
pub mod status;

pub use invoice::{
    AmountValue, Invoice, InvoiceBatch, InvoiceEdit, InvoiceId, UploadReceipt, UploadedDocument,
};
pub use session::{Decision, DecisionAction, DecisionStage, Queue, RoleFlags, SessionContext};
pub use status::{effective_status, needs_attention, EffectiveStatus, StatusBadge};
