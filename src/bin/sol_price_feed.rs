// DANS : src/bin/sol_price_feed.rs

use anyhow::{anyhow, Result};
use chrono::Utc;
use pnl_scanner::{
    config::Config,
    data_pipeline::api_connectors::dexscreener::get_latest_sol_price,
    monitoring::logging,
    state::{PricePoint, PriceSeries},
};
use tracing::{debug, error, info, warn};

/// Relève le prix du SOL à intervalle fixe et l'ajoute à la série quand il change.
async fn run_feed() -> Result<()> {
    let config = Config::load()?;
    let path = config
        .sol_price_file
        .clone()
        .ok_or_else(|| anyhow!("SOL_PRICE_FILE doit être défini pour le relevé de prix"))?;
    info!("[PriceFeed] Relevé du prix SOL toutes les {} s vers '{}'.", config.price_feed_interval_secs, path.display());

    let client = reqwest::Client::new();
    let mut interval = tokio::time::interval(config.price_feed_interval());

    loop {
        interval.tick().await;
        let block_time = Utc::now().timestamp();

        match get_latest_sol_price(&client).await {
            Ok(price) => match PriceSeries::append(&path, PricePoint { block_time, price }) {
                Ok(true) => info!(price, block_time, "[PriceFeed] Nouveau prix enregistré."),
                Ok(false) => debug!(price, "[PriceFeed] Prix inchangé ou invalide."),
                Err(e) => warn!("[PriceFeed] Écriture de la série impossible : {:?}", e),
            },
            Err(e) => warn!("[PriceFeed] Lecture du prix impossible : {:?}", e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::setup_logging();
    if let Err(e) = run_feed().await {
        error!("[PriceFeed] Le service a planté : {:?}.", e);
        return Err(e);
    }
    Ok(())
}
