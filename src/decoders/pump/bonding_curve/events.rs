// DANS : src/decoders/pump/bonding_curve/events.rs

use crate::decoders::{DecodeError, FlatInstruction};
use borsh::BorshDeserialize;
use solana_sdk::{pubkey, pubkey::Pubkey};

pub const PUMPFUN_PROGRAM_ID: Pubkey = pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");

/// L'autorité de mint de tous les tokens créés par le bonding curve :
/// son historique liste toutes les créations.
pub const PUMPFUN_MINT_AUTHORITY: Pubkey = pubkey!("TSLvdd1pWpHVjahSpsvCXUbgwsL3JAcvokwaKt1eokM");

/// Préfixe des instructions "self-CPI" utilisées par Anchor pour émettre un événement.
pub const EVENT_LOG_DISCRIMINATOR: [u8; 8] = [228, 69, 165, 46, 81, 203, 154, 29];

// sha256("event:<Nom>")[..8]
pub const CREATE_EVENT_DISCRIMINATOR: [u8; 8] = [27, 114, 169, 77, 222, 235, 99, 118];
pub const TRADE_EVENT_DISCRIMINATOR: [u8; 8] = [189, 219, 127, 211, 78, 230, 97, 238];

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;
const TOKEN_UNITS: f64 = 1_000_000.0;

#[derive(BorshDeserialize, Debug, Clone, PartialEq)]
#[cfg_attr(test, derive(borsh::BorshSerialize))]
pub struct CreateEvent {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub mint: Pubkey,
    pub bonding_curve: Pubkey,
    pub user: Pubkey,
}

#[derive(BorshDeserialize, Debug, Clone, PartialEq)]
#[cfg_attr(test, derive(borsh::BorshSerialize))]
pub struct TradeEvent {
    pub mint: Pubkey,
    pub sol_amount: u64,
    pub token_amount: u64,
    pub is_buy: bool,
    pub user: Pubkey,
    pub timestamp: i64,
    pub virtual_sol_reserves: u64,
    pub virtual_token_reserves: u64,
}

impl TradeEvent {
    /// Prix spot du bonding curve en SOL par token, d'après les réserves virtuelles.
    pub fn price(&self) -> Option<f64> {
        trade_price(self.virtual_sol_reserves, self.virtual_token_reserves)
    }
}

/// SOL ÷10^9, token ÷10^6. `None` si la réserve de tokens est vide.
pub fn trade_price(virtual_sol_reserves: u64, virtual_token_reserves: u64) -> Option<f64> {
    if virtual_token_reserves == 0 {
        return None;
    }
    let sol_reserves = virtual_sol_reserves as f64 / LAMPORTS_PER_SOL;
    let token_reserves = virtual_token_reserves as f64 / TOKEN_UNITS;
    Some(sol_reserves / token_reserves)
}

/// Un événement décodé. Les événements dont on n'a pas besoin (Complete, SetParams, ...)
/// restent identifiés par leur discriminateur.
#[derive(Debug, Clone, PartialEq)]
pub enum PumpEvent {
    Create(CreateEvent),
    Trade(TradeEvent),
    Unrecognized { discriminator: [u8; 8] },
}

/// Décode une instruction du programme bonding curve en événement.
pub fn decode_event_log(ix: &FlatInstruction) -> Result<PumpEvent, DecodeError> {
    decode_event_bytes(&ix.payload()?)
}

/// Décode les octets bruts d'un log d'événement :
/// `EVENT_LOG_DISCRIMINATOR | discriminateur de l'événement | données borsh`.
pub fn decode_event_bytes(bytes: &[u8]) -> Result<PumpEvent, DecodeError> {
    let body = bytes
        .strip_prefix(EVENT_LOG_DISCRIMINATOR.as_slice())
        .ok_or(DecodeError::NotAnEventLog)?;

    if body.len() < 8 {
        return Err(DecodeError::Schema(format!("discriminateur tronqué ({} octets)", body.len())));
    }
    let (head, mut data) = body.split_at(8);
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(head);

    // `deserialize` tolère les octets en trop : les versions récentes du programme
    // ajoutent des champs en fin d'événement.
    match discriminator {
        CREATE_EVENT_DISCRIMINATOR => CreateEvent::deserialize(&mut data)
            .map(PumpEvent::Create)
            .map_err(|e| DecodeError::Schema(format!("CreateEvent: {}", e))),
        TRADE_EVENT_DISCRIMINATOR => TradeEvent::deserialize(&mut data)
            .map(PumpEvent::Trade)
            .map_err(|e| DecodeError::Schema(format!("TradeEvent: {}", e))),
        _ => Ok(PumpEvent::Unrecognized { discriminator }),
    }
}
