// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

fn default_gain_threshold_percent() -> i64 { 500 }
fn default_scan_window_secs() -> i64 { 3_600 }
fn default_page_limit() -> usize { 1_000 }
fn default_batch_size() -> usize { 20 }
fn default_batch_delay_ms() -> u64 { 500 }
fn default_rpc_max_retries() -> u8 { 5 }
fn default_rpc_retry_delay_ms() -> u64 { 1_000 }
fn default_scan_interval_secs() -> u64 { 43_200 } // 12 heures
fn default_report_dir() -> PathBuf { PathBuf::from("reports") }
fn default_price_feed_interval_secs() -> u64 { 10 }

/// Lue depuis l'environnement (et le fichier `.env`). Les noms de variables sont en majuscules.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub solana_rpc_url: String,
    #[serde(default = "default_gain_threshold_percent")]
    pub gain_threshold_percent: i64,
    #[serde(default = "default_scan_window_secs")]
    pub scan_window_secs: i64,
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_rpc_max_retries")]
    pub rpc_max_retries: u8,
    #[serde(default = "default_rpc_retry_delay_ms")]
    pub rpc_retry_delay_ms: u64,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Série de prix SOL/USD. Sans elle, les prix Raydium restent en SOL.
    #[serde(default)]
    pub sol_price_file: Option<PathBuf>,
    #[serde(default = "default_price_feed_interval_secs")]
    pub price_feed_interval_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>().context("Configuration invalide (SOLANA_RPC_URL est requis)")?;
        Ok(config)
    }

    /// Même lecture, à partir de paires (NOM, valeur) explicites.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs).context("Configuration invalide")
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn price_feed_interval(&self) -> Duration {
        Duration::from_secs(self.price_feed_interval_secs)
    }
}
