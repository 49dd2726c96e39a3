// src/decoders/spl_token_decoders/mint.rs

use anyhow::Result;
use solana_sdk::pubkey::Pubkey;
use spl_token_2022::{extension::StateWithExtensions, state::Mint};

// --- STRUCTURE DE SORTIE PROPRE ---
// Ce que le rapport veut savoir d'un mint : qui peut encore frapper ou geler.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMint {
    pub address: Pubkey,
    pub decimals: u8,
    pub mint_authority: Option<Pubkey>,
    pub freeze_authority: Option<Pubkey>,
}

/// Décode les données brutes d'un compte de mint (SPL Token ou Token-2022).
pub fn decode_mint(address: &Pubkey, data: &[u8]) -> Result<DecodedMint> {
    // Lit aussi bien les anciens mints (82 octets) que ceux avec extensions.
    let mint_state = StateWithExtensions::<Mint>::unpack(data)?;
    let base_mint = mint_state.base;

    let mint_authority: Option<Pubkey> = base_mint.mint_authority.into();
    let freeze_authority: Option<Pubkey> = base_mint.freeze_authority.into();

    Ok(DecodedMint {
        address: *address,
        decimals: base_mint.decimals,
        mint_authority,
        freeze_authority,
    })
}
