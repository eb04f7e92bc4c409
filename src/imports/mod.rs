mod service;

pub use service::{ImportReport, ImportService};
