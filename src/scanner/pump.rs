// DANS : src/scanner/pump.rs

use super::ProtocolScanner;
use crate::{
    decoders::{
        pump::bonding_curve::{decode_event_log, PumpEvent, PUMPFUN_MINT_AUTHORITY, PUMPFUN_PROGRAM_ID},
        DecodeError, DomainEvent, Protocol, RawTransaction,
    },
    state::TokenRecord,
};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, trace};

/// Le bonding curve pump.fun. Les prix restent en SOL.
#[derive(Clone, Copy, Default)]
pub struct PumpScanner;

impl PumpScanner {
    /// Les événements émis par le programme dans la transaction, dans l'ordre d'exécution.
    fn events(tx: &RawTransaction) -> Vec<PumpEvent> {
        tx.flattened()
            .iter()
            .filter(|ix| *ix.program_id == PUMPFUN_PROGRAM_ID)
            .filter_map(|ix| match decode_event_log(ix) {
                Ok(PumpEvent::Unrecognized { discriminator }) => {
                    trace!(signature = %tx.signature, discriminator = %hex::encode(discriminator), "[Pump] Événement ignoré.");
                    None
                }
                Ok(event) => Some(event),
                // Les instructions buy/sell/create elles-mêmes.
                Err(DecodeError::NotAnEventLog) => None,
                Err(error) => {
                    debug!(signature = %tx.signature, %error, "[Pump] Log d'événement non décodable, ignoré.");
                    None
                }
            })
            .collect()
    }
}

impl ProtocolScanner for PumpScanner {
    fn protocol(&self) -> Protocol {
        Protocol::Pumpfun
    }

    fn discovery_address(&self) -> Pubkey {
        PUMPFUN_MINT_AUTHORITY
    }

    /// Le prix d'ouverture est celui du premier achat du créateur, dans la même transaction.
    /// Sans ce trade, il vaut 0 et le token sera exclu à l'évaluation.
    fn creation_events(&self, tx: &RawTransaction) -> Vec<DomainEvent> {
        let Some(open_time) = tx.block_time else {
            return Vec::new();
        };
        let events = Self::events(tx);

        events
            .iter()
            .filter_map(|event| match event {
                PumpEvent::Create(create) => Some(create),
                _ => None,
            })
            .map(|create| {
                let open_price = events
                    .iter()
                    .find_map(|event| match event {
                        PumpEvent::Trade(trade) if trade.mint == create.mint => trade.price(),
                        _ => None,
                    })
                    .unwrap_or(0.0);

                DomainEvent::TokenCreated {
                    mint: create.mint,
                    creator: create.user,
                    curve_address: create.bonding_curve,
                    open_price,
                    open_time,
                }
            })
            .collect()
    }

    fn trade_address(&self, record: &TokenRecord) -> Pubkey {
        record.mint
    }

    fn trade_events(&self, record: &TokenRecord, tx: &RawTransaction) -> Vec<DomainEvent> {
        let Some(time) = tx.block_time else {
            return Vec::new();
        };

        Self::events(tx)
            .into_iter()
            .filter_map(|event| match event {
                PumpEvent::Trade(trade) if trade.mint == record.mint => trade.price(),
                _ => None,
            })
            .map(|price| DomainEvent::Trade { mint: record.mint, price, time })
            .collect()
    }
}
