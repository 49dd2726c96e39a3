// src/decoders/pump/bonding_curve/mod.rs

pub mod events;

pub use events::{
    decode_event_log, trade_price, CreateEvent, PumpEvent, TradeEvent, PUMPFUN_MINT_AUTHORITY, PUMPFUN_PROGRAM_ID,
};
