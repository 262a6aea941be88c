pub mod store;
pub mod webhook;

pub use store::InvoiceStore;
pub use webhook::WebhookStore;
