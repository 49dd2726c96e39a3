// DANS : src/state/token_ledger.rs

use crate::decoders::{spl_token_decoders::mint::DecodedMint, DomainEvent, Protocol};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

pub const NOT_AVAILABLE: &str = "N/A";

/// Les autorités d'un mint telles qu'écrites dans le rapport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintAuthorities {
    pub mint_authority: String,
    pub freeze_authority: String,
}

impl Default for MintAuthorities {
    fn default() -> Self {
        Self {
            mint_authority: NOT_AVAILABLE.to_string(),
            freeze_authority: NOT_AVAILABLE.to_string(),
        }
    }
}

impl From<&DecodedMint> for MintAuthorities {
    fn from(mint: &DecodedMint) -> Self {
        let render = |key: Option<Pubkey>| key.map_or_else(|| NOT_AVAILABLE.to_string(), |k| k.to_string());
        Self {
            mint_authority: render(mint.mint_authority),
            freeze_authority: render(mint.freeze_authority),
        }
    }
}

/// L'état d'un token entre sa création et l'évaluation finale.
/// `open_block` et `ath_block` sont des temps unix (secondes).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub protocol: Protocol,
    pub mint: Pubkey,
    pub pool_or_curve: Pubkey,
    pub creator: Pubkey,
    pub open_price: f64,
    pub open_block: i64,
    pub ath_price: f64,
    pub ath_block: i64,
    pub mint_authority: String,
    pub freeze_authority: String,
}

impl TokenRecord {
    pub fn new(protocol: Protocol, mint: Pubkey, pool_or_curve: Pubkey, creator: Pubkey, open_price: f64, open_time: i64) -> Self {
        let authorities = MintAuthorities::default();
        Self {
            protocol,
            mint,
            pool_or_curve,
            creator,
            open_price,
            open_block: open_time,
            ath_price: open_price,
            ath_block: open_time,
            mint_authority: authorities.mint_authority,
            freeze_authority: authorities.freeze_authority,
        }
    }

    /// Replie un prix observé. Comparaison stricte : à égalité, le premier temps est gardé.
    /// Un prix antérieur à l'ouverture est ignoré.
    pub fn observe(&mut self, price: f64, time: i64) -> bool {
        if time < self.open_block || !(price > self.ath_price) {
            return false;
        }
        self.ath_price = price;
        self.ath_block = time;
        true
    }

    pub fn set_authorities(&mut self, authorities: MintAuthorities) {
        self.mint_authority = authorities.mint_authority;
        self.freeze_authority = authorities.freeze_authority;
    }
}

/// Résultat d'un `upsert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    /// Une deuxième création pour un mint déjà suivi : la première gagne.
    AlreadyTracked,
    AthRaised,
    Unchanged,
    /// Pool ou mint inconnu : aucun record n'est créé à partir d'un trade.
    Dropped,
}

/// Un record par mint. Les swaps sont retrouvés par pool, les trades par mint.
#[derive(Debug, Default)]
pub struct TokenLedger {
    records: Vec<TokenRecord>,
    by_mint: HashMap<Pubkey, usize>,
    by_pool: HashMap<Pubkey, usize>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, event: &DomainEvent) -> Upsert {
        match *event {
            DomainEvent::PoolCreated { lp_address, mint, creator, open_price, open_time } => {
                self.insert(TokenRecord::new(Protocol::RaydiumV4, mint, lp_address, creator, open_price, open_time))
            }
            DomainEvent::TokenCreated { mint, creator, curve_address, open_price, open_time } => {
                self.insert(TokenRecord::new(Protocol::Pumpfun, mint, curve_address, creator, open_price, open_time))
            }
            DomainEvent::Swap { pool_address, price, time } => {
                let index = self.by_pool.get(&pool_address).copied();
                self.fold(index, price, time)
            }
            DomainEvent::Trade { mint, price, time } => {
                let index = self.by_mint.get(&mint).copied();
                self.fold(index, price, time)
            }
        }
    }

    fn insert(&mut self, record: TokenRecord) -> Upsert {
        if self.by_mint.contains_key(&record.mint) {
            return Upsert::AlreadyTracked;
        }
        let index = self.records.len();
        self.by_mint.insert(record.mint, index);
        self.by_pool.entry(record.pool_or_curve).or_insert(index);
        self.records.push(record);
        Upsert::Created
    }

    fn fold(&mut self, index: Option<usize>, price: f64, time: i64) -> Upsert {
        match index.and_then(|i| self.records.get_mut(i)) {
            Some(record) => if record.observe(price, time) { Upsert::AthRaised } else { Upsert::Unchanged },
            None => Upsert::Dropped,
        }
    }

    pub fn set_authorities(&mut self, mint: &Pubkey, authorities: MintAuthorities) -> bool {
        match self.by_mint.get(mint).and_then(|&i| self.records.get_mut(i)) {
            Some(record) => {
                record.set_authorities(authorities);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, mint: &Pubkey) -> Option<&TokenRecord> {
        self.by_mint.get(mint).and_then(|&i| self.records.get(i))
    }

    /// Les records dans l'ordre de découverte.
    pub fn records(&self) -> &[TokenRecord] {
        &self.records
    }

    pub fn mints(&self) -> Vec<Pubkey> {
        self.records.iter().map(|record| record.mint).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
