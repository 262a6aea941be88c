pub mod desk;
pub mod format;
pub mod presenter;
pub mod sessions;
pub mod sorting;
pub mod view_state;
pub mod workflow;

pub use desk::DeskService;
pub use format::{format_currency, format_date, format_date_time, format_time_elapsed};
pub use presenter::{InvoiceRow, PageView};
pub use sorting::{SortColumn, SortDirection};
pub use view_state::{ListViewState, PAGE_SIZE};
pub use workflow::RowAction;
