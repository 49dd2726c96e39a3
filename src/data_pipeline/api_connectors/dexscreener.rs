// src/data_pipeline/api_connectors/dexscreener.rs

use crate::decoders::WSOL_MINT;
use anyhow::{anyhow, Result};
use serde::Deserialize;

const DEXSCREENER_TOKENS_URL: &str = "https://api.dexscreener.com/latest/dex/tokens";

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    // DexScreener renvoie `null` quand le token n'a aucune paire.
    #[serde(default)]
    pub pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub chain_id: String,
    pub pair_address: String,
    pub price_usd: Option<String>,
}

/// Prix USD de la première paire (la plus liquide) listée pour le token.
/// 0.0 si aucune paire ou prix illisible.
pub fn first_pair_price_usd(response: &ApiResponse) -> f64 {
    response
        .pairs
        .as_deref()
        .and_then(|pairs| pairs.first())
        .and_then(|pair| pair.price_usd.as_deref())
        .and_then(|price| price.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Récupère le dernier prix USD du SOL.
pub async fn get_latest_sol_price(client: &reqwest::Client) -> Result<f64> {
    let url = format!("{}/{}", DEXSCREENER_TOKENS_URL, WSOL_MINT);
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!("Erreur API DexScreener: {}", response.status()));
    }

    let response_text = response.text().await?;
    let api_response: ApiResponse = serde_json::from_str(&response_text)
        .map_err(|e| anyhow!("Erreur de décodage JSON: {}. Réponse reçue: {}", e, response_text))?;

    Ok(first_pair_price_usd(&api_response))
}
