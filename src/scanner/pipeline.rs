// DANS : src/scanner/pipeline.rs

use super::{batch::run_in_batches, ProtocolScanner, TransactionSource};
use crate::{
    decoders::{sort_chronologically, DomainEvent},
    filtering::{GainEvaluator, Verdict},
    reporting::ReportSink,
    state::{TokenLedger, TokenRecord, Upsert},
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, instrument, warn};

/// Les paramètres d'un run, indépendants du protocole.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub gain_threshold_percent: i64,
    pub scan_window_secs: i64,
    pub batch_size: usize,
    pub batch_delay: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub scan_failures: usize,
    pub not_evaluable: usize,
    pub below_threshold: usize,
    pub reported: usize,
}

/// Un run complet pour un protocole, sur la fenêtre `[now - scan_window_secs, now]`.
///
/// 1. Découverte : historique de l'adresse de découverte, trié, replié dans le ledger.
/// 2. Autorités des mints découverts.
/// 3. Scan des trades de chaque token, par lots concurrents. Chaque tâche ne touche
///    qu'à son propre token ; le repli dans le ledger se fait ensuite, ici.
/// 4. Évaluation et écriture des lignes retenues, dans l'ordre de découverte.
#[instrument(name = "run_protocol", skip_all, fields(protocol = scanner.protocol().tag()))]
pub async fn run_protocol(
    scanner: Arc<dyn ProtocolScanner>,
    source: Arc<dyn TransactionSource>,
    sink: &dyn ReportSink,
    settings: &RunSettings,
    now: i64,
) -> Result<RunSummary> {
    let protocol = scanner.protocol();
    let sheet = protocol.sheet();
    sink.clear(sheet).with_context(|| format!("Impossible de vider la feuille '{}'", sheet))?;

    // --- 1. Découverte ---
    let window_start = now - settings.scan_window_secs;
    let mut history = source
        .fetch_history(&scanner.discovery_address(), window_start)
        .await
        .with_context(|| format!("Échec de la découverte {}", protocol.tag()))?;
    sort_chronologically(&mut history);

    let mut ledger = TokenLedger::new();
    for tx in &history {
        for event in scanner.creation_events(tx) {
            if ledger.upsert(&event) == Upsert::AlreadyTracked {
                debug!(signature = %tx.signature, "[Pipeline] Création en double ignorée.");
            }
        }
    }
    info!(transactions = history.len(), tokens = ledger.len(), "[Pipeline] Découverte terminée.");

    let mut summary = RunSummary { discovered: ledger.len(), ..Default::default() };
    if ledger.is_empty() {
        return Ok(summary);
    }

    // --- 2. Autorités ---
    let mints = ledger.mints();
    let mut authorities = source.fetch_mint_authorities(&mints).await;
    for mint in &mints {
        if let Some(found) = authorities.remove(mint) {
            ledger.set_authorities(mint, found);
        }
    }

    // --- 3. Trades ---
    let records: Vec<TokenRecord> = ledger.records().to_vec();
    let scans = run_in_batches(records, settings.batch_size, settings.batch_delay, |record| {
        let (scanner, source) = (scanner.clone(), source.clone());
        async move { scan_trades(scanner.as_ref(), source.as_ref(), &record).await }
    })
    .await;

    for (mint, scan) in mints.iter().zip(scans) {
        match scan {
            Some(Ok(events)) => {
                let raised = events.iter().filter(|event| ledger.upsert(event) == Upsert::AthRaised).count();
                debug!(mint = %mint, trades = events.len(), raised, "[Pipeline] Trades repliés.");
            }
            Some(Err(e)) => {
                summary.scan_failures += 1;
                warn!(mint = %mint, error = ?e, "[Pipeline] Scan des trades impossible, le token garde son prix d'ouverture.");
            }
            None => summary.scan_failures += 1,
        }
    }

    // --- 4. Évaluation ---
    let evaluator = GainEvaluator::new(settings.gain_threshold_percent);
    for record in ledger.records() {
        match evaluator.evaluate(record) {
            Verdict::Reported(row) => {
                info!(
                    mint = %record.mint,
                    gain_percent = row.gain_percent,
                    time_to_peak_minutes = row.time_to_peak_minutes,
                    "[Pipeline] Token retenu."
                );
                sink.append(sheet, &row)
                    .with_context(|| format!("Impossible d'écrire dans la feuille '{}'", sheet))?;
                summary.reported += 1;
            }
            Verdict::BelowThreshold { gain_percent } => {
                debug!(mint = %record.mint, gain_percent, "[Pipeline] Sous le seuil.");
                summary.below_threshold += 1;
            }
            Verdict::NotEvaluable => {
                debug!(mint = %record.mint, "[Pipeline] Prix d'ouverture inutilisable.");
                summary.not_evaluable += 1;
            }
        }
    }

    info!(?summary, "[Pipeline] Run terminé.");
    Ok(summary)
}

/// Les trades d'un token, triés chronologiquement, depuis son ouverture.
async fn scan_trades(
    scanner: &dyn ProtocolScanner,
    source: &dyn TransactionSource,
    record: &TokenRecord,
) -> Result<Vec<DomainEvent>> {
    let mut history = source.fetch_history(&scanner.trade_address(record), record.open_block).await?;
    history.retain(|tx| tx.block_time.is_some());
    sort_chronologically(&mut history);

    Ok(history.iter().flat_map(|tx| scanner.trade_events(record, tx)).collect())
}
