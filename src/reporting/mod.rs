// src/reporting/mod.rs

pub mod sheet;

pub use sheet::{JsonSheetWriter, ReportSink};
