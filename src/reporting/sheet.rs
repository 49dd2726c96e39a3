// DANS : src/reporting/sheet.rs

use crate::filtering::ReportRow;
use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::Mutex,
};

/// La destination tabulaire des rapports : une feuille par protocole.
pub trait ReportSink: Send + Sync {
    /// Vide la feuille (début de run).
    fn clear(&self, sheet: &str) -> Result<()>;
    /// Ajoute une ligne en fin de feuille.
    fn append(&self, sheet: &str, row: &ReportRow) -> Result<()>;
}

/// Une feuille = un tableau JSON `<dir>/<sheet>.json`.
pub struct JsonSheetWriter {
    dir: PathBuf,
    // Les deux protocoles tournent en parallèle : on sérialise les réécritures.
    write_lock: Mutex<()>,
}

impl JsonSheetWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Impossible de créer le dossier de rapports '{}'", dir.display()))?;
        Ok(Self { dir, write_lock: Mutex::new(()) })
    }

    pub fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sheet))
    }

    /// Relit une feuille. Une feuille absente est vide.
    pub fn read_rows(&self, sheet: &str) -> Result<Vec<ReportRow>> {
        read_sheet(&self.sheet_path(sheet))
    }

    fn write_rows(&self, sheet: &str, rows: &[ReportRow]) -> Result<()> {
        let path = self.sheet_path(sheet);
        let file = File::create(&path)
            .with_context(|| format!("Impossible de créer la feuille '{}'", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), rows)
            .with_context(|| format!("Erreur de sérialisation vers '{}'", path.display()))
    }
}

fn read_sheet(path: &Path) -> Result<Vec<ReportRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)
        .with_context(|| format!("Impossible d'ouvrir la feuille '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Erreur de désérialisation de la feuille '{}'", path.display()))
}

impl ReportSink for JsonSheetWriter {
    fn clear(&self, sheet: &str) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| anyhow::anyhow!("verrou des feuilles empoisonné"))?;
        self.write_rows(sheet, &[])
    }

    fn append(&self, sheet: &str, row: &ReportRow) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| anyhow::anyhow!("verrou des feuilles empoisonné"))?;
        let mut rows = self.read_rows(sheet)?;
        rows.push(row.clone());
        self.write_rows(sheet, &rows)
    }
}
