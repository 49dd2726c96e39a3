// src/rpc/mod.rs

pub mod resilient_client;

pub use resilient_client::ResilientRpcClient;
