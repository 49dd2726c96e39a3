// src/lib.rs

// On déclare tous nos modules principaux pour les rendre publics et
// utilisables par nos programmes binaires (pnl_scanner.rs, sol_price_feed.rs).
pub mod config;
pub mod data_pipeline;
pub mod decoders;
pub mod filtering;
pub mod monitoring;
pub mod reporting;
pub mod rpc;
pub mod scanner;
pub mod state;
