// DANS : src/decoders/raydium/amm_v4/layout.rs

//! Tables de positions pour les instructions Raydium AMM v4.
//!
//! Version épinglée : le programme `675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8`
//! tel que déployé, `initialize2` (opcode 1) et `swap_base_in` / `swap_base_out`
//! (opcodes 9 / 11). Toute lecture passe par ces tables : la longueur de la liste
//! de comptes est validée une seule fois avant le moindre accès par index.

use crate::decoders::DecodeError;
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Pool,
    CoinMint,
    PcMint,
    CoinVault,
    PcVault,
    Creator,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Pool => "pool",
            AccountRole::CoinMint => "coin_mint",
            AccountRole::PcMint => "pc_mint",
            AccountRole::CoinVault => "coin_vault",
            AccountRole::PcVault => "pc_vault",
            AccountRole::Creator => "creator",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AccountSlot {
    pub role: AccountRole,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadField {
    Nonce,
    OpenTime,
    InitPcAmount,
    InitCoinAmount,
}

impl PayloadField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadField::Nonce => "nonce",
            PayloadField::OpenTime => "open_time",
            PayloadField::InitPcAmount => "init_pc_amount",
            PayloadField::InitCoinAmount => "init_coin_amount",
        }
    }
}

/// Position d'un champ dans le payload. L'offset compte l'opcode (octet 0).
#[derive(Debug, Clone, Copy)]
pub struct FieldSlot {
    pub field: PayloadField,
    pub offset: usize,
    pub width: usize,
}

#[derive(Debug)]
pub struct InstructionLayout {
    pub name: &'static str,
    pub accounts: &'static [AccountSlot],
    pub fields: &'static [FieldSlot],
}

// https://github.com/raydium-io/raydium-amm/blob/ec2ef3d3f92c69644fba9640a2556f34233dc30e/program/src/instruction.rs#L836
pub static INITIALIZE2_LAYOUT: InstructionLayout = InstructionLayout {
    name: "initialize2",
    accounts: &[
        AccountSlot { role: AccountRole::Pool, index: 4 },
        AccountSlot { role: AccountRole::CoinMint, index: 8 },
        AccountSlot { role: AccountRole::PcMint, index: 9 },
        AccountSlot { role: AccountRole::CoinVault, index: 10 },
        AccountSlot { role: AccountRole::PcVault, index: 11 },
        AccountSlot { role: AccountRole::Creator, index: 17 },
    ],
    // https://github.com/raydium-io/raydium-amm/blob/ec2ef3d3f92c69644fba9640a2556f34233dc30e/program/src/instruction.rs#L383
    fields: &[
        FieldSlot { field: PayloadField::Nonce, offset: 1, width: 1 },
        FieldSlot { field: PayloadField::OpenTime, offset: 2, width: 8 },
        FieldSlot { field: PayloadField::InitPcAmount, offset: 10, width: 8 },
        FieldSlot { field: PayloadField::InitCoinAmount, offset: 18, width: 8 },
    ],
};

/// Swap sans le compte optionnel `amm_target_orders` : 17 comptes.
pub static SWAP_COMPACT_LAYOUT: InstructionLayout = InstructionLayout {
    name: "swap (17 comptes)",
    accounts: &[
        AccountSlot { role: AccountRole::Pool, index: 1 },
        AccountSlot { role: AccountRole::CoinVault, index: 4 },
        AccountSlot { role: AccountRole::PcVault, index: 5 },
    ],
    fields: &[],
};

/// Swap avec le compte optionnel : 18 comptes.
pub static SWAP_FULL_LAYOUT: InstructionLayout = InstructionLayout {
    name: "swap (18 comptes)",
    accounts: &[
        AccountSlot { role: AccountRole::Pool, index: 1 },
        AccountSlot { role: AccountRole::CoinVault, index: 5 },
        AccountSlot { role: AccountRole::PcVault, index: 6 },
    ],
    fields: &[],
};

/// La présence du compte optionnel se détecte uniquement à la longueur de la liste.
pub fn swap_layout(account_count: usize) -> &'static InstructionLayout {
    if account_count == 17 {
        &SWAP_COMPACT_LAYOUT
    } else {
        &SWAP_FULL_LAYOUT
    }
}

impl InstructionLayout {
    pub fn min_accounts(&self) -> usize {
        self.accounts.iter().map(|slot| slot.index + 1).max().unwrap_or(0)
    }

    /// Valide la liste de comptes contre le layout. Après ça, `get` ne peut plus déborder.
    pub fn resolve<'a>(&'static self, accounts: &'a [Pubkey]) -> Result<ResolvedAccounts<'a>, DecodeError> {
        if let Some(slot) = self.accounts.iter().find(|slot| slot.index >= accounts.len()) {
            return Err(DecodeError::MissingAccount {
                role: slot.role.as_str(),
                index: slot.index,
                len: accounts.len(),
            });
        }
        Ok(ResolvedAccounts { layout: self, accounts })
    }

    fn field(&self, field: PayloadField) -> Result<&FieldSlot, DecodeError> {
        self.fields
            .iter()
            .find(|slot| slot.field == field)
            .ok_or(DecodeError::RoleNotInLayout { role: field.as_str(), layout: self.name })
    }

    /// Lit un champ u64 little-endian du payload.
    pub fn read_u64(&self, payload: &[u8], field: PayloadField) -> Result<u64, DecodeError> {
        let slot = self.field(field)?;
        let end = slot.offset + slot.width;
        let bytes: [u8; 8] = payload
            .get(slot.offset..end)
            .and_then(|raw| raw.try_into().ok())
            .ok_or(DecodeError::PayloadTooShort {
                field: field.as_str(),
                needed: end,
                len: payload.len(),
            })?;
        Ok(u64::from_le_bytes(bytes))
    }
}

/// Une liste de comptes déjà validée contre un layout.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAccounts<'a> {
    layout: &'static InstructionLayout,
    accounts: &'a [Pubkey],
}

impl<'a> ResolvedAccounts<'a> {
    pub fn get(&self, role: AccountRole) -> Result<&'a Pubkey, DecodeError> {
        let slot = self
            .layout
            .accounts
            .iter()
            .find(|slot| slot.role == role)
            .ok_or(DecodeError::RoleNotInLayout { role: role.as_str(), layout: self.layout.name })?;
        Ok(&self.accounts[slot.index])
    }
}
