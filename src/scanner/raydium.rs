// DANS : src/scanner/raydium.rs

use super::ProtocolScanner;
use crate::{
    decoders::{
        raydium::amm_v4::{decode_initialize, decode_swap, RAYDIUM_AMM_V4_PROGRAM_ID, RAYDIUM_V4_CREATE_POOL_FEE_ACCOUNT},
        DecodeError, DomainEvent, Protocol, RawTransaction,
    },
    state::{PriceOracle, TokenRecord},
};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, trace};

/// Raydium AMM v4. Avec un oracle, les prix sont convertis en USD au temps de la transaction.
#[derive(Clone, Default)]
pub struct RaydiumScanner {
    oracle: Option<Arc<PriceOracle>>,
}

impl RaydiumScanner {
    pub fn new(oracle: Option<Arc<PriceOracle>>) -> Self {
        Self { oracle }
    }

    fn to_quote(&self, price: f64, time: i64) -> f64 {
        match &self.oracle {
            Some(oracle) => price * oracle.price_at(time),
            None => price,
        }
    }
}

fn log_skip(signature: &str, error: &DecodeError) {
    match error {
        // Les autres instructions du programme (dépôts, retraits, ...) : bruit normal.
        DecodeError::UnknownOpcode(_) | DecodeError::PoolMismatch => trace!(signature, %error, "[Raydium] Instruction ignorée."),
        _ => debug!(signature, %error, "[Raydium] Instruction non décodable, ignorée."),
    }
}

impl ProtocolScanner for RaydiumScanner {
    fn protocol(&self) -> Protocol {
        Protocol::RaydiumV4
    }

    fn discovery_address(&self) -> Pubkey {
        RAYDIUM_V4_CREATE_POOL_FEE_ACCOUNT
    }

    fn creation_events(&self, tx: &RawTransaction) -> Vec<DomainEvent> {
        tx.flattened()
            .iter()
            .filter(|ix| *ix.program_id == RAYDIUM_AMM_V4_PROGRAM_ID)
            .filter_map(|ix| decode_initialize(ix, tx).inspect_err(|e| log_skip(&tx.signature, e)).ok())
            .map(|event| match event {
                DomainEvent::PoolCreated { lp_address, mint, creator, open_price, open_time } => DomainEvent::PoolCreated {
                    lp_address,
                    mint,
                    creator,
                    open_price: self.to_quote(open_price, tx.block_time.unwrap_or(open_time)),
                    open_time,
                },
                other => other,
            })
            .collect()
    }

    fn trade_address(&self, record: &TokenRecord) -> Pubkey {
        record.pool_or_curve
    }

    fn trade_events(&self, record: &TokenRecord, tx: &RawTransaction) -> Vec<DomainEvent> {
        if tx.block_time.is_none() {
            return Vec::new();
        }
        tx.flattened()
            .iter()
            .filter(|ix| *ix.program_id == RAYDIUM_AMM_V4_PROGRAM_ID)
            .filter_map(|ix| decode_swap(ix, tx, &record.pool_or_curve).inspect_err(|e| log_skip(&tx.signature, e)).ok())
            .map(|event| match event {
                DomainEvent::Swap { pool_address, price, time } => DomainEvent::Swap {
                    pool_address,
                    price: self.to_quote(price, time),
                    time,
                },
                other => other,
            })
            .collect()
    }
}
