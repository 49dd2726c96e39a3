// DANS : src/filtering/gain_evaluator.rs

use crate::state::TokenRecord;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Une ligne du rapport. L'ordre des champs est l'ordre des colonnes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub creator: String,
    pub protocol: String,
    pub mint: String,
    pub pool: String,
    pub gain_percent: i64,
    pub time_to_peak_minutes: i64,
    pub open_time: String,
    pub open_price: f64,
    pub ath_price: f64,
    pub mint_authority: String,
    pub freeze_authority: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Reported(ReportRow),
    BelowThreshold { gain_percent: i64 },
    /// Prix d'ouverture nul ou inutilisable : exclu, ce n'est pas une erreur.
    NotEvaluable,
}

#[derive(Debug, Clone, Copy)]
pub struct GainEvaluator {
    pub threshold_percent: i64,
}

impl GainEvaluator {
    pub fn new(threshold_percent: i64) -> Self {
        Self { threshold_percent }
    }

    pub fn evaluate(&self, record: &TokenRecord) -> Verdict {
        let Some(gain_percent) = gain_percent(record.open_price, record.ath_price) else {
            return Verdict::NotEvaluable;
        };
        if gain_percent < self.threshold_percent {
            return Verdict::BelowThreshold { gain_percent };
        }

        Verdict::Reported(ReportRow {
            creator: record.creator.to_string(),
            protocol: record.protocol.tag().to_string(),
            mint: record.mint.to_string(),
            pool: record.pool_or_curve.to_string(),
            gain_percent,
            time_to_peak_minutes: (record.ath_block - record.open_block).div_euclid(60),
            open_time: format_open_time(record.open_block),
            open_price: record.open_price,
            ath_price: record.ath_price,
            mint_authority: record.mint_authority.clone(),
            freeze_authority: record.freeze_authority.clone(),
        })
    }
}

/// floor((ath - open) / open * 100). `None` si le prix d'ouverture est inutilisable.
pub fn gain_percent(open_price: f64, ath_price: f64) -> Option<i64> {
    if !open_price.is_finite() || open_price <= 0.0 || !ath_price.is_finite() {
        return None;
    }
    Some(((ath_price - open_price) / open_price * 100.0).floor() as i64)
}

fn format_open_time(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}
