pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod service;

pub use config::AppConfig;
pub use error::AppError;
pub use remote::{InvoiceStore, WebhookStore};
pub use service::DeskService;
