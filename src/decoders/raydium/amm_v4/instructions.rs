// DANS : src/decoders/raydium/amm_v4/instructions.rs

use super::layout::{swap_layout, AccountRole, PayloadField, INITIALIZE2_LAYOUT};
use crate::decoders::{DecodeError, DomainEvent, FlatInstruction, RawTransaction, WSOL_MINT};
use solana_sdk::{pubkey, pubkey::Pubkey};

pub const RAYDIUM_AMM_V4_PROGRAM_ID: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

/// Le compte qui reçoit les frais de création de pool : son historique liste
/// toutes les transactions `initialize2`.
pub const RAYDIUM_V4_CREATE_POOL_FEE_ACCOUNT: Pubkey = pubkey!("7YttLkHDoNj9wyDur5pM1ejNaAvT9X4eqaYcHQqtj2G5");

pub const INITIALIZE2_OPCODE: u8 = 1;
pub const SWAP_BASE_IN_OPCODE: u8 = 9;
pub const SWAP_BASE_OUT_OPCODE: u8 = 11;

/// Décode une instruction `initialize2` en `PoolCreated`.
/// Le prix d'ouverture est exprimé en SOL par token.
pub fn decode_initialize(ix: &FlatInstruction, tx: &RawTransaction) -> Result<DomainEvent, DecodeError> {
    let payload = ix.payload()?;
    if payload[0] != INITIALIZE2_OPCODE {
        return Err(DecodeError::UnknownOpcode(payload[0]));
    }

    let accounts = INITIALIZE2_LAYOUT.resolve(ix.accounts)?;
    let lp_address = *accounts.get(AccountRole::Pool)?;
    let creator = *accounts.get(AccountRole::Creator)?;
    let coin_mint = *accounts.get(AccountRole::CoinMint)?;
    let pc_mint = *accounts.get(AccountRole::PcMint)?;

    // Le nonce (octet 1) ne nous sert pas.
    let raw_open_time = INITIALIZE2_LAYOUT.read_u64(&payload, PayloadField::OpenTime)?;
    let open_time = if raw_open_time > 0 {
        i64::try_from(raw_open_time).map_err(|_| DecodeError::FieldOutOfRange(PayloadField::OpenTime.as_str()))?
    } else {
        tx.block_time.ok_or(DecodeError::MissingBlockTime)?
    };

    let pc_amount = ui_amount(
        INITIALIZE2_LAYOUT.read_u64(&payload, PayloadField::InitPcAmount)?,
        tx.mint_decimals(&pc_mint),
    );
    let coin_amount = ui_amount(
        INITIALIZE2_LAYOUT.read_u64(&payload, PayloadField::InitCoinAmount)?,
        tx.mint_decimals(&coin_mint),
    );

    let (mint, sol_amount, token_amount) = if coin_mint == WSOL_MINT {
        (pc_mint, coin_amount, pc_amount)
    } else if pc_mint == WSOL_MINT {
        (coin_mint, pc_amount, coin_amount)
    } else {
        return Err(DecodeError::UnresolvablePrice);
    };

    Ok(DomainEvent::PoolCreated {
        lp_address,
        mint,
        creator,
        open_price: price(sol_amount, token_amount)?,
        open_time,
    })
}

/// Décode un `swap_base_in` / `swap_base_out` en `Swap`, à partir des balances
/// post-trade des deux vaults. Le swap doit concerner `expected_pool`.
pub fn decode_swap(
    ix: &FlatInstruction,
    tx: &RawTransaction,
    expected_pool: &Pubkey,
) -> Result<DomainEvent, DecodeError> {
    let payload = ix.payload()?;
    if payload[0] != SWAP_BASE_IN_OPCODE && payload[0] != SWAP_BASE_OUT_OPCODE {
        return Err(DecodeError::UnknownOpcode(payload[0]));
    }

    let accounts = swap_layout(ix.accounts.len()).resolve(ix.accounts)?;
    let pool_address = *accounts.get(AccountRole::Pool)?;
    if &pool_address != expected_pool {
        return Err(DecodeError::PoolMismatch);
    }

    let vault_a = vault_state(tx, accounts.get(AccountRole::CoinVault)?);
    let vault_b = vault_state(tx, accounts.get(AccountRole::PcVault)?);

    let (sol_side, token_side) = match (vault_a.0 == WSOL_MINT, vault_b.0 == WSOL_MINT) {
        (true, false) => (vault_a, vault_b),
        (false, true) => (vault_b, vault_a),
        _ => return Err(DecodeError::UnresolvablePrice),
    };

    Ok(DomainEvent::Swap {
        pool_address,
        price: price(sol_side.1, token_side.1)?,
        time: tx.block_time.ok_or(DecodeError::MissingBlockTime)?,
    })
}

/// (mint, balance) d'un vault d'après le snapshot.
/// Sans entrée dans le snapshot, c'est un compte de SOL natif : balance 0.
fn vault_state(tx: &RawTransaction, vault: &Pubkey) -> (Pubkey, f64) {
    tx.post_balance(vault)
        .map_or((WSOL_MINT, 0.0), |balance| (balance.mint, balance.ui_amount))
}

fn ui_amount(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

fn price(sol_amount: f64, token_amount: f64) -> Result<f64, DecodeError> {
    if token_amount <= 0.0 || !sol_amount.is_finite() {
        return Err(DecodeError::UnresolvablePrice);
    }
    Ok(sol_amount / token_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::{RawInstruction, TokenBalance};

    fn keys(n: usize) -> Vec<Pubkey> {
        (0..n).map(|_| Pubkey::new_unique()).collect()
    }

    fn initialize_payload(open_time: u64, pc_amount: u64, coin_amount: u64) -> Vec<u8> {
        let mut payload = vec![INITIALIZE2_OPCODE, 253];
        payload.extend_from_slice(&open_time.to_le_bytes());
        payload.extend_from_slice(&pc_amount.to_le_bytes());
        payload.extend_from_slice(&coin_amount.to_le_bytes());
        payload
    }

    fn swap_tx(accounts: &[Pubkey], vaults: (usize, usize), balances: [(Pubkey, f64); 2]) -> RawTransaction {
        RawTransaction {
            block_time: Some(1_700_000_100),
            account_keys: vec![Pubkey::new_unique(), accounts[vaults.0], accounts[vaults.1]],
            post_token_balances: vec![
                TokenBalance { account_index: 1, mint: balances[0].0, decimals: 9, ui_amount: balances[0].1 },
                TokenBalance { account_index: 2, mint: balances[1].0, decimals: 6, ui_amount: balances[1].1 },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn exact_in_swap_with_17_accounts_reads_vaults_4_and_5() {
        let accounts = keys(17);
        let token = Pubkey::new_unique();
        let tx = swap_tx(&accounts, (4, 5), [(WSOL_MINT, 100.0), (token, 50.0)]);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &[SWAP_BASE_IN_OPCODE, 0, 0]);

        let event = decode_swap(&FlatInstruction::from(&raw), &tx, &accounts[1]).unwrap();

        assert_eq!(event, DomainEvent::Swap { pool_address: accounts[1], price: 2.0, time: 1_700_000_100 });
    }

    #[test]
    fn exact_out_swap_with_18_accounts_reads_vaults_5_and_6() {
        let accounts = keys(18);
        let token = Pubkey::new_unique();
        // Le vault "coin" contient le token, le vault "pc" le SOL.
        let tx = swap_tx(&accounts, (5, 6), [(token, 1_000.0), (WSOL_MINT, 5.0)]);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &[SWAP_BASE_OUT_OPCODE]);

        let event = decode_swap(&FlatInstruction::from(&raw), &tx, &accounts[1]).unwrap();

        assert_eq!(event, DomainEvent::Swap { pool_address: accounts[1], price: 0.005, time: 1_700_000_100 });
    }

    #[test]
    fn swap_on_another_pool_is_rejected() {
        let accounts = keys(17);
        let tx = swap_tx(&accounts, (4, 5), [(WSOL_MINT, 1.0), (Pubkey::new_unique(), 1.0)]);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts, &[SWAP_BASE_IN_OPCODE]);

        let result = decode_swap(&FlatInstruction::from(&raw), &tx, &Pubkey::new_unique());
        assert_eq!(result, Err(DecodeError::PoolMismatch));
    }

    #[test]
    fn swap_with_too_few_accounts_is_a_typed_error() {
        let accounts = keys(5);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &[SWAP_BASE_IN_OPCODE]);

        let result = decode_swap(&FlatInstruction::from(&raw), &RawTransaction::default(), &accounts[1]);
        assert_eq!(result, Err(DecodeError::MissingAccount { role: "coin_vault", index: 5, len: 5 }));
    }

    #[test]
    fn swap_without_snapshot_entries_has_no_price() {
        // Les deux vaults retombent sur "SOL natif, balance 0".
        let accounts = keys(17);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &[SWAP_BASE_IN_OPCODE]);
        let tx = RawTransaction { block_time: Some(1), ..Default::default() };

        let result = decode_swap(&FlatInstruction::from(&raw), &tx, &accounts[1]);
        assert_eq!(result, Err(DecodeError::UnresolvablePrice));
    }

    #[test]
    fn swap_with_a_missing_sol_vault_prices_at_zero() {
        // Seul le vault du token est dans le snapshot : l'autre compte pour du SOL à 0.
        let accounts = keys(17);
        let token = Pubkey::new_unique();
        let tx = RawTransaction {
            block_time: Some(1_700_000_100),
            account_keys: vec![Pubkey::new_unique(), accounts[5]],
            post_token_balances: vec![TokenBalance { account_index: 1, mint: token, decimals: 6, ui_amount: 50.0 }],
            ..Default::default()
        };
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &[SWAP_BASE_IN_OPCODE]);

        let event = decode_swap(&FlatInstruction::from(&raw), &tx, &accounts[1]).unwrap();

        assert_eq!(event, DomainEvent::Swap { pool_address: accounts[1], price: 0.0, time: 1_700_000_100 });
    }

    #[test]
    fn other_opcodes_are_skipped() {
        let accounts = keys(18);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &[3, 0]);
        let flat = FlatInstruction::from(&raw);

        assert_eq!(decode_swap(&flat, &RawTransaction::default(), &accounts[1]), Err(DecodeError::UnknownOpcode(3)));
        assert_eq!(decode_initialize(&flat, &RawTransaction::default()), Err(DecodeError::UnknownOpcode(3)));
    }

    #[test]
    fn initialize_normalizes_amounts_and_identifies_the_tracked_mint() {
        let mut accounts = keys(21);
        let token = accounts[8];
        accounts[9] = WSOL_MINT;
        let tx = RawTransaction {
            block_time: Some(1_700_000_000),
            post_token_balances: vec![
                TokenBalance { account_index: 3, mint: token, decimals: 6, ui_amount: 0.0 },
                TokenBalance { account_index: 4, mint: WSOL_MINT, decimals: 9, ui_amount: 0.0 },
            ],
            ..Default::default()
        };
        // 10 SOL (pc) contre 1 000 000 tokens (coin).
        let payload = initialize_payload(0, 10_000_000_000, 1_000_000_000_000);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &payload);

        let event = decode_initialize(&FlatInstruction::from(&raw), &tx).unwrap();

        assert_eq!(
            event,
            DomainEvent::PoolCreated {
                lp_address: accounts[4],
                mint: token,
                creator: accounts[17],
                open_price: 0.00001,
                open_time: 1_700_000_000,
            }
        );
    }

    #[test]
    fn initialize_keeps_an_explicit_open_time() {
        let mut accounts = keys(18);
        accounts[8] = WSOL_MINT;
        let payload = initialize_payload(1_800_000_000, 4, 2);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts.clone(), &payload);
        let tx = RawTransaction { block_time: Some(1_700_000_000), ..Default::default() };

        // Sans snapshot, les décimales valent 0 : 2 SOL (coin) pour 4 tokens (pc).
        let event = decode_initialize(&FlatInstruction::from(&raw), &tx).unwrap();
        match event {
            DomainEvent::PoolCreated { mint, open_price, open_time, .. } => {
                assert_eq!(mint, accounts[9]);
                assert_eq!(open_price, 0.5);
                assert_eq!(open_time, 1_800_000_000);
            }
            other => panic!("événement inattendu: {:?}", other),
        }
    }

    #[test]
    fn initialize_without_a_native_side_is_skipped() {
        let accounts = keys(18);
        let raw = RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts, &initialize_payload(5, 1, 1));
        let result = decode_initialize(&FlatInstruction::from(&raw), &RawTransaction::default());
        assert_eq!(result, Err(DecodeError::UnresolvablePrice));
    }
}
