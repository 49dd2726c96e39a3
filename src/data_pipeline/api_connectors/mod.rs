// src/data_pipeline/api_connectors/mod.rs

pub mod dexscreener;
