use crate::{Price, ProductId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Durable part of an item's price state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPrice {
    #[serde(rename = "currentPrice")]
    pub current_price: Price,
    #[serde(rename = "lastUpdate", alias = "lastUpdateTimestamp", default)]
    pub last_update: i64,
}

pub type Snapshot = BTreeMap<ProductId, PersistedPrice>;

/// Flat JSON file holding one [`PersistedPrice`] per tracked product,
/// rewritten in full on every save.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot. A missing or unreadable file yields an empty one.
    pub fn load(&self) -> Snapshot {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("{} not readable ({e}), starting empty", self.path.display());
                return Snapshot::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("{} is not a valid state file ({e}), starting empty", self.path.display());
            Snapshot::new()
        })
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
