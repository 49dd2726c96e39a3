// src/decoders/raydium/amm_v4/mod.rs

pub mod instructions;
pub mod layout;

pub use instructions::{
    decode_initialize, decode_swap, RAYDIUM_AMM_V4_PROGRAM_ID, RAYDIUM_V4_CREATE_POOL_FEE_ACCOUNT,
};
