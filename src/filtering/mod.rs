// src/filtering/mod.rs

pub mod gain_evaluator;

pub use gain_evaluator::{GainEvaluator, ReportRow, Verdict};
