use crate::errors::LoadError;
use crate::types::{VolcanoDataset, VolcanoRecord};
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

// Each entry lists the accepted spellings of one required column
const REQUIRED_COLUMNS: &[&[&str]] = &[
    &["Volcano Name"],
    &["Type"],
    &["Country"],
    &["Region"],
    &["Status"],
    &["Latitude"],
    &["Longitude"],
    &["Population", "Population (2020)"],
];

pub fn load_csv(path: &Path) -> Result<VolcanoDataset, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::from_open(path, e))?;
    // Trimmed headers so the column check and serde see the same names
    let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    for spellings in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| spellings.contains(&h)) {
            return Err(LoadError::Schema {
                path: path.to_path_buf(),
                column: spellings[0].to_string(),
            });
        }
    }

    let records = rdr
        .deserialize::<VolcanoRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Loaded {} volcano records from {:?}", records.len(), path);
    Ok(records)
}

/// Parsed datasets memoized by source path.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<VolcanoDataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<VolcanoDataset>, LoadError> {
        if let Some(dataset) = self.entries.get(path) {
            debug!("Dataset cache hit for {:?}", path);
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load_csv(path)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
