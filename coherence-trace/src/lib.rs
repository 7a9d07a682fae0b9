mod error;
mod record;
mod report;

pub use error::TraceError;
pub use record::{load_trace, TraceRecord};
pub use report::{render, write_report};
