// src/decoders/mod.rs

use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey, pubkey::Pubkey};
use thiserror::Error;

// --- 1. Déclarer tous nos modules principaux ---
pub mod transaction;
pub mod raydium;
pub mod pump;
pub mod spl_token_decoders;

// --- 2. Ré-exporter les types d'entrée ---
pub use transaction::{
    flatten_instructions, sort_chronologically, FlatInstruction, RawInstruction, RawTransaction,
    TokenBalance,
};

/// Le mint du SOL "wrappé". C'est la devise de cotation des deux protocoles.
pub const WSOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

/// Les deux protocoles surveillés.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    RaydiumV4,
    Pumpfun,
}

impl Protocol {
    /// Le tag écrit dans la colonne "protocole" du rapport.
    pub fn tag(&self) -> &'static str {
        match self {
            Protocol::RaydiumV4 => "RaydiumV4",
            Protocol::Pumpfun => "Pumpfun",
        }
    }

    /// Le nom de la feuille de rapport dédiée à ce protocole.
    pub fn sheet(&self) -> &'static str {
        match self {
            Protocol::RaydiumV4 => "Raydium",
            Protocol::Pumpfun => "Pumpfun",
        }
    }
}

/// Les événements métier extraits des transactions.
/// Les prix sont exprimés en devise de cotation par token, les temps en secondes unix.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    PoolCreated {
        lp_address: Pubkey,
        mint: Pubkey,
        creator: Pubkey,
        open_price: f64,
        open_time: i64,
    },
    Swap {
        pool_address: Pubkey,
        price: f64,
        time: i64,
    },
    TokenCreated {
        mint: Pubkey,
        creator: Pubkey,
        curve_address: Pubkey,
        open_price: f64,
        open_time: i64,
    },
    Trade {
        mint: Pubkey,
        price: f64,
        time: i64,
    },
}

impl DomainEvent {
    pub fn time(&self) -> i64 {
        match self {
            DomainEvent::PoolCreated { open_time, .. } | DomainEvent::TokenCreated { open_time, .. } => *open_time,
            DomainEvent::Swap { time, .. } | DomainEvent::Trade { time, .. } => *time,
        }
    }
}

/// Les raisons pour lesquelles une instruction n'a pas produit d'événement.
/// Aucune n'est fatale : l'appelant ignore l'instruction et continue son scan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("données d'instruction non décodables en base58")]
    InvalidEncoding,

    #[error("payload d'instruction vide")]
    EmptyPayload,

    #[error("opcode inattendu: {0}")]
    UnknownOpcode(u8),

    #[error("compte '{role}' absent (index {index}, {len} comptes)")]
    MissingAccount { role: &'static str, index: usize, len: usize },

    #[error("rôle '{role}' non défini dans le layout '{layout}'")]
    RoleNotInLayout { role: &'static str, layout: &'static str },

    #[error("payload trop court pour '{field}' ({needed} octets requis, {len} reçus)")]
    PayloadTooShort { field: &'static str, needed: usize, len: usize },

    #[error("valeur hors limites pour '{0}'")]
    FieldOutOfRange(&'static str),

    #[error("le swap ne concerne pas le pool suivi")]
    PoolMismatch,

    #[error("prix impossible à calculer")]
    UnresolvablePrice,

    #[error("la transaction n'a pas de block_time")]
    MissingBlockTime,

    #[error("l'instruction n'est pas un log d'événement")]
    NotAnEventLog,

    #[error("schéma d'événement invalide: {0}")]
    Schema(String),
}
