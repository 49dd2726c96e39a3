// DANS : src/state/price_oracle.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub block_time: i64,
    pub price: f64,
}

/// Série temporelle du prix de référence (SOL/USD), triée par temps.
/// Stockée sur disque comme un tableau JSON de `PricePoint`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: BTreeMap<i64, f64>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        Self {
            points: points.into_iter().map(|p| (p.block_time, p.price)).collect(),
        }
    }

    pub fn insert(&mut self, point: PricePoint) {
        self.points.insert(point.block_time, point.price);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<PricePoint> {
        self.points
            .last_key_value()
            .map(|(&block_time, &price)| PricePoint { block_time, price })
    }

    pub fn points(&self) -> Vec<PricePoint> {
        self.points
            .iter()
            .map(|(&block_time, &price)| PricePoint { block_time, price })
            .collect()
    }

    /// Charge la série. Un fichier absent donne une série vide.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path)
            .with_context(|| format!("Impossible d'ouvrir la série de prix '{}'", path.display()))?;
        let points: Vec<PricePoint> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Erreur de désérialisation de la série '{}'", path.display()))?;
        Ok(Self::from_points(points))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Impossible de créer la série de prix '{}'", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.points())
            .with_context(|| format!("Erreur de sérialisation vers '{}'", path.display()))
    }

    /// Ajoute un point au fichier si le prix est positif et diffère du dernier stocké.
    /// Retourne `true` si le point a été écrit.
    pub fn append(path: &Path, point: PricePoint) -> Result<bool> {
        if !(point.price > 0.0) {
            return Ok(false);
        }
        let mut series = Self::load(path)?;
        if series.last().is_some_and(|last| last.price == point.price) {
            return Ok(false);
        }
        series.insert(point);
        series.save(path)?;
        Ok(true)
    }
}

/// Requêtes ponctuelles en lecture seule sur une série non vide.
/// Construit une fois par run et partagé entre les tâches.
#[derive(Debug, Clone)]
pub struct PriceOracle {
    series: PriceSeries,
}

impl PriceOracle {
    /// `None` si la série est vide : il n'y a alors rien à convertir.
    pub fn try_new(series: PriceSeries) -> Option<Self> {
        if series.is_empty() {
            None
        } else {
            Some(Self { series })
        }
    }

    /// Dernier prix connu à `timestamp` ou avant ; à défaut, le plus ancien.
    pub fn price_at(&self, timestamp: i64) -> f64 {
        self.series
            .points
            .range(..=timestamp)
            .next_back()
            .or_else(|| self.series.points.first_key_value())
            .map_or(0.0, |(_, &price)| price)
    }
}
