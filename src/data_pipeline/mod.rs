// src/data_pipeline/mod.rs

// Tout ce qui va chercher des données à l'extérieur : le RPC Solana et DexScreener.
pub mod api_connectors;
pub mod history;
pub mod transaction_adapter;

pub use history::{fetch_history, RpcTransactionSource};
pub use transaction_adapter::adapt_transaction;
