// DANS : src/bin/pnl_scanner.rs

use anyhow::Result;
use chrono::Utc;
use pnl_scanner::{
    config::Config,
    data_pipeline::RpcTransactionSource,
    monitoring::logging,
    reporting::JsonSheetWriter,
    rpc::ResilientRpcClient,
    scanner::{run_protocol, ProtocolScanner, PumpScanner, RaydiumScanner, RunSettings, TransactionSource},
    state::{PriceOracle, PriceSeries},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// L'oracle SOL/USD du run, s'il y a une série de prix configurée et non vide.
fn load_oracle(config: &Config) -> Option<Arc<PriceOracle>> {
    let path = config.sol_price_file.as_ref()?;
    match PriceSeries::load(path) {
        Ok(series) => {
            let oracle = PriceOracle::try_new(series).map(Arc::new);
            if oracle.is_none() {
                warn!("[Scanner] Série de prix '{}' vide : prix Raydium en SOL.", path.display());
            }
            oracle
        }
        Err(e) => {
            warn!("[Scanner] Série de prix illisible, prix Raydium en SOL : {:?}", e);
            None
        }
    }
}

async fn run_cycle(config: &Config, source: Arc<dyn TransactionSource>, sink: &JsonSheetWriter) {
    let settings = RunSettings {
        gain_threshold_percent: config.gain_threshold_percent,
        scan_window_secs: config.scan_window_secs,
        batch_size: config.batch_size,
        batch_delay: config.batch_delay(),
    };
    let now = Utc::now().timestamp();

    let raydium: Arc<dyn ProtocolScanner> = Arc::new(RaydiumScanner::new(load_oracle(config)));
    let pump: Arc<dyn ProtocolScanner> = Arc::new(PumpScanner);

    // Les deux protocoles sont indépendants : un échec de l'un n'arrête pas l'autre.
    let (raydium_result, pump_result) = tokio::join!(
        run_protocol(raydium, source.clone(), sink, &settings, now),
        run_protocol(pump, source.clone(), sink, &settings, now),
    );

    for (name, result) in [("Raydium", raydium_result), ("Pumpfun", pump_result)] {
        match result {
            Ok(summary) => info!(protocol = name, reported = summary.reported, discovered = summary.discovered, "[Scanner] Run terminé."),
            Err(e) => error!(protocol = name, "[Scanner] Le run a échoué : {:?}", e),
        }
    }
}

async fn run_scanner() -> Result<()> {
    let config = Config::load()?;
    info!(
        threshold = config.gain_threshold_percent,
        window_secs = config.scan_window_secs,
        "[Scanner] Démarrage du scanner de gains."
    );

    let rpc_client = Arc::new(ResilientRpcClient::new(
        config.solana_rpc_url.clone(),
        config.rpc_max_retries,
        config.rpc_retry_delay_ms,
    ));
    let source: Arc<dyn TransactionSource> = Arc::new(RpcTransactionSource::new(rpc_client, config.page_limit));
    let sink = JsonSheetWriter::new(&config.report_dir)?;

    loop {
        run_cycle(&config, source.clone(), &sink).await;
        info!("[Scanner] Prochain run dans {} s.", config.scan_interval_secs);
        tokio::time::sleep(config.scan_interval()).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::setup_logging();
    if let Err(e) = run_scanner().await {
        error!("[Scanner] Le service a planté : {:?}.", e);
        return Err(e);
    }
    Ok(())
}
