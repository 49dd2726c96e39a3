// tests/pipeline.rs

use anyhow::Result;
use async_trait::async_trait;
use pnl_scanner::{
    decoders::{
        pump::bonding_curve::{
            events::{CREATE_EVENT_DISCRIMINATOR, EVENT_LOG_DISCRIMINATOR, TRADE_EVENT_DISCRIMINATOR},
            PUMPFUN_MINT_AUTHORITY, PUMPFUN_PROGRAM_ID,
        },
        raydium::amm_v4::{RAYDIUM_AMM_V4_PROGRAM_ID, RAYDIUM_V4_CREATE_POOL_FEE_ACCOUNT},
        RawInstruction, RawTransaction, TokenBalance, WSOL_MINT,
    },
    filtering::ReportRow,
    reporting::JsonSheetWriter,
    scanner::{run_protocol, PumpScanner, RaydiumScanner, RunSettings, RunSummary, TransactionSource},
    state::MintAuthorities,
};
use solana_sdk::pubkey::Pubkey;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

const NOW: i64 = 2_000;

struct InMemorySource {
    histories: HashMap<Pubkey, Vec<RawTransaction>>,
    authorities: HashMap<Pubkey, MintAuthorities>,
}

#[async_trait]
impl TransactionSource for InMemorySource {
    async fn fetch_history(&self, address: &Pubkey, _min_block_time: i64) -> Result<Vec<RawTransaction>> {
        Ok(self.histories.get(address).cloned().unwrap_or_default())
    }

    async fn fetch_mint_authorities(&self, mints: &[Pubkey]) -> HashMap<Pubkey, MintAuthorities> {
        mints
            .iter()
            .filter_map(|mint| self.authorities.get(mint).map(|a| (*mint, a.clone())))
            .collect()
    }
}

fn settings() -> RunSettings {
    RunSettings { gain_threshold_percent: 500, scan_window_secs: 3_600, batch_size: 2, batch_delay: Duration::ZERO }
}

fn keys(n: usize) -> Vec<Pubkey> {
    (0..n).map(|_| Pubkey::new_unique()).collect()
}

// --- Raydium AMM v4 ---

fn initialize_tx(pool: Pubkey, token: Pubkey, creator: Pubkey, block_time: i64) -> RawTransaction {
    let mut accounts = keys(21);
    accounts[4] = pool;
    accounts[8] = token;
    accounts[9] = WSOL_MINT;
    accounts[17] = creator;

    // 1 SOL (pc) contre 2 tokens (coin), open_time à 0 : on prend le block_time.
    let mut payload = vec![1u8, 254];
    payload.extend_from_slice(&0u64.to_le_bytes());
    payload.extend_from_slice(&1_000_000_000u64.to_le_bytes());
    payload.extend_from_slice(&2_000_000u64.to_le_bytes());

    RawTransaction {
        slot: 100,
        block_time: Some(block_time),
        signature: "initialize".to_string(),
        account_keys: accounts.clone(),
        instructions: vec![
            RawInstruction::with_payload(Pubkey::new_unique(), vec![], &[0]),
            RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts, &payload),
        ],
        post_token_balances: vec![
            TokenBalance { account_index: 10, mint: token, decimals: 6, ui_amount: 2.0 },
            TokenBalance { account_index: 11, mint: WSOL_MINT, decimals: 9, ui_amount: 1.0 },
        ],
        ..Default::default()
    }
}

fn swap_tx(pool: Pubkey, token: Pubkey, sol: f64, tokens: f64, slot: u64, block_time: i64) -> RawTransaction {
    let mut accounts = keys(17);
    accounts[1] = pool;
    RawTransaction {
        slot,
        block_time: Some(block_time),
        signature: format!("swap-{}", slot),
        account_keys: accounts.clone(),
        instructions: vec![RawInstruction::with_payload(RAYDIUM_AMM_V4_PROGRAM_ID, accounts, &[9, 1, 2, 3])],
        post_token_balances: vec![
            TokenBalance { account_index: 4, mint: WSOL_MINT, decimals: 9, ui_amount: sol },
            TokenBalance { account_index: 5, mint: token, decimals: 6, ui_amount: tokens },
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn raydium_pools_are_discovered_tracked_and_reported() {
    let (pool, token, creator) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
    let freeze = Pubkey::new_unique();

    let source = InMemorySource {
        histories: HashMap::from([
            (RAYDIUM_V4_CREATE_POOL_FEE_ACCOUNT, vec![initialize_tx(pool, token, creator, 1_000)]),
            (
                pool,
                vec![
                    swap_tx(pool, token, 6.0, 2.0, 130, 1_300),
                    swap_tx(pool, token, 8.0, 2.0, 120, 1_200),
                    // Antérieur à l'ouverture : ignoré.
                    swap_tx(pool, token, 100.0, 1.0, 90, 900),
                ],
            ),
        ]),
        authorities: HashMap::from([(
            token,
            MintAuthorities { mint_authority: "N/A".to_string(), freeze_authority: freeze.to_string() },
        )]),
    };
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonSheetWriter::new(dir.path()).unwrap();

    let summary = run_protocol(Arc::new(RaydiumScanner::default()), Arc::new(source), &sink, &settings(), NOW)
        .await
        .unwrap();

    assert_eq!(summary, RunSummary { discovered: 1, reported: 1, ..Default::default() });

    let rows = sink.read_rows("Raydium").unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.protocol, "RaydiumV4");
    assert_eq!(row.mint, token.to_string());
    assert_eq!(row.pool, pool.to_string());
    assert_eq!(row.creator, creator.to_string());
    assert_eq!((row.open_price, row.ath_price), (0.5, 4.0));
    assert_eq!(row.gain_percent, 700);
    assert_eq!(row.time_to_peak_minutes, 3);
    assert_eq!(row.open_time, "1970-01-01 00:16:40 UTC");
    assert_eq!(row.freeze_authority, freeze.to_string());
    assert!(sink.read_rows("Pumpfun").unwrap().is_empty());
}

// --- Pump.fun ---

fn push_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

fn create_event(mint: Pubkey, user: Pubkey, bonding_curve: Pubkey) -> RawInstruction {
    let mut payload = [EVENT_LOG_DISCRIMINATOR, CREATE_EVENT_DISCRIMINATOR].concat();
    push_string(&mut payload, "Token");
    push_string(&mut payload, "TKN");
    push_string(&mut payload, "https://example.org/tkn.json");
    payload.extend_from_slice(mint.as_ref());
    payload.extend_from_slice(bonding_curve.as_ref());
    payload.extend_from_slice(user.as_ref());
    RawInstruction::with_payload(PUMPFUN_PROGRAM_ID, vec![], &payload)
}

fn trade_event(mint: Pubkey, virtual_sol_reserves: u64, virtual_token_reserves: u64) -> RawInstruction {
    let mut payload = [EVENT_LOG_DISCRIMINATOR, TRADE_EVENT_DISCRIMINATOR].concat();
    payload.extend_from_slice(mint.as_ref());
    payload.extend_from_slice(&1_000u64.to_le_bytes()); // sol_amount
    payload.extend_from_slice(&2_000u64.to_le_bytes()); // token_amount
    payload.push(1); // is_buy
    payload.extend_from_slice(Pubkey::new_unique().as_ref());
    payload.extend_from_slice(&0i64.to_le_bytes());
    payload.extend_from_slice(&virtual_sol_reserves.to_le_bytes());
    payload.extend_from_slice(&virtual_token_reserves.to_le_bytes());
    RawInstruction::with_payload(PUMPFUN_PROGRAM_ID, vec![], &payload)
}

/// Instruction top-level du programme (create, buy) suivie des événements émis en CPI.
fn pump_tx(signature: &str, slot: u64, block_time: i64, events: Vec<RawInstruction>) -> RawTransaction {
    RawTransaction {
        slot,
        block_time: Some(block_time),
        signature: signature.to_string(),
        instructions: vec![RawInstruction::with_payload(PUMPFUN_PROGRAM_ID, keys(3), &[24, 30, 200, 40, 5, 28, 7, 119])],
        inner_instructions: BTreeMap::from([(0, events)]),
        ..Default::default()
    }
}

#[tokio::test]
async fn pump_tokens_are_evaluated_against_their_initial_buy() {
    let (rocket, flat, orphan) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
    let user = Pubkey::new_unique();
    let curve = Pubkey::new_unique();

    let discovery = vec![
        // Livré du plus récent au plus ancien.
        pump_tx("create-flat", 12, 1_160, vec![
            create_event(flat, user, Pubkey::new_unique()),
            trade_event(flat, 1_000_000_000, 2_000_000),
        ]),
        pump_tx("create-orphan", 11, 1_150, vec![create_event(orphan, user, Pubkey::new_unique())]),
        pump_tx("create-rocket", 10, 1_100, vec![
            create_event(rocket, user, curve),
            // 1 SOL / 2 tokens : ouverture à 0.5.
            trade_event(rocket, 1_000_000_000, 2_000_000),
        ]),
    ];

    let source = InMemorySource {
        histories: HashMap::from([
            (PUMPFUN_MINT_AUTHORITY, discovery),
            (rocket, vec![
                pump_tx("rocket-2", 31, 1_700, vec![trade_event(rocket, 3_000_000_000, 1_000_000)]),
                pump_tx("rocket-1", 30, 1_500, vec![trade_event(rocket, 4_000_000_000, 1_000_000)]),
            ]),
            (flat, vec![pump_tx("flat-1", 40, 1_600, vec![trade_event(flat, 1_000_000_000, 1_000_000)])]),
        ]),
        authorities: HashMap::new(),
    };
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonSheetWriter::new(dir.path()).unwrap();

    let summary = run_protocol(Arc::new(PumpScanner), Arc::new(source), &sink, &settings(), NOW)
        .await
        .unwrap();

    assert_eq!(
        summary,
        RunSummary { discovered: 3, reported: 1, below_threshold: 1, not_evaluable: 1, scan_failures: 0 }
    );

    let rows = sink.read_rows("Pumpfun").unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.protocol, "Pumpfun");
    assert_eq!(row.mint, rocket.to_string());
    assert_eq!(row.pool, curve.to_string());
    assert_eq!(row.creator, user.to_string());
    assert_eq!((row.open_price, row.ath_price), (0.5, 4.0));
    assert_eq!(row.gain_percent, 700);
    assert_eq!(row.time_to_peak_minutes, 6);
    assert_eq!(row.mint_authority, "N/A");
}

#[tokio::test]
async fn each_run_starts_from_an_empty_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonSheetWriter::new(dir.path()).unwrap();
    let empty = || Arc::new(InMemorySource { histories: HashMap::new(), authorities: HashMap::new() });

    let stale = ReportRow {
        creator: Pubkey::new_unique().to_string(),
        protocol: "Pumpfun".to_string(),
        mint: Pubkey::new_unique().to_string(),
        pool: Pubkey::new_unique().to_string(),
        gain_percent: 900,
        time_to_peak_minutes: 12,
        open_time: "1970-01-01 00:00:00 UTC".to_string(),
        open_price: 0.1,
        ath_price: 1.0,
        mint_authority: "N/A".to_string(),
        freeze_authority: "N/A".to_string(),
    };
    std::fs::write(sink.sheet_path("Pumpfun"), serde_json::to_string(&vec![stale]).unwrap()).unwrap();
    assert_eq!(sink.read_rows("Pumpfun").unwrap().len(), 1);

    let summary = run_protocol(Arc::new(PumpScanner), empty(), &sink, &settings(), NOW).await.unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(sink.read_rows("Pumpfun").unwrap().is_empty());
}
