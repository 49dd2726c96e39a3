// src/state/mod.rs

pub mod price_oracle;
pub mod token_ledger;

pub use price_oracle::{PriceOracle, PricePoint, PriceSeries};
pub use token_ledger::{MintAuthorities, TokenLedger, TokenRecord, Upsert, NOT_AVAILABLE};
