//! Temperament catalogue.
//!
//! A catalogue document maps identifiers to entries:
//!
//! ```json
//! {
//!   "werckmeister3": {
//!     "name": "Werckmeister III",
//!     "deviations": [0, -9.8, -7.8, -5.9, -9.8, -2.0, -11.7, -3.9, -7.8, -11.7, -3.9, -7.8],
//!     "rootNote": 0
//!   }
//! }
//! ```
//!
//! The same shape is accepted as TOML (one table per identifier). Loading is
//! all-or-nothing: one bad entry fails the whole catalogue.

use crate::{Error, Result, SharedTemperament, Temperament};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_CATALOGUE: &str = include_str!("../data/default_temperaments.json");

/// One catalogue entry as it appears on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperamentEntry {
    /// Display name; the identifier is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Twelve deviations in cents, C up to B
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviations: Option<Vec<f64>>,

    /// Pitch class of the unshifted root; absent for non-shiftable entries
    #[serde(default, alias = "root_note", skip_serializing_if = "Option::is_none")]
    pub root_note: Option<i64>,

    /// A4 in Hz, 440 when absent
    #[serde(default, alias = "concert_pitch", skip_serializing_if = "Option::is_none")]
    pub concert_pitch: Option<f64>,
}

impl TemperamentEntry {
    fn build(&self, identifier: &str) -> Result<Temperament> {
        let invalid = |reason: String| Error::InvalidEntry {
            identifier: identifier.to_string(),
            reason,
        };

        let deviations = self
            .deviations
            .as_deref()
            .ok_or_else(|| invalid("missing deviations".to_string()))?;

        let root_note = match self.root_note {
            None => None,
            Some(root @ 0..=11) => Some(root as u8),
            Some(root) => return Err(invalid(format!("root note {} out of range (0-11)", root))),
        };

        let name = self.name.as_deref().unwrap_or(identifier);
        let temperament = Temperament::new(identifier, name, deviations, root_note)
            .map_err(|e| invalid(e.to_string()))?;

        match self.concert_pitch {
            Some(hz) => temperament
                .with_concert_pitch(hz)
                .map_err(|e| invalid(e.to_string())),
            None => Ok(temperament),
        }
    }
}

/// Chart feed for one temperament: deviations along the circle of fifths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub identifier: String,
    pub name: String,
    pub values: [f64; 12],
}

/// Read-only map of identifier to shared temperament, sorted by identifier.
#[derive(Debug, Clone, Default)]
pub struct TemperamentRegistry {
    entries: BTreeMap<String, SharedTemperament>,
}

impl TemperamentRegistry {
    /// Build a registry from already-deserialized entries.
    pub fn load_from(entries: BTreeMap<String, TemperamentEntry>) -> Result<Self> {
        let mut built = BTreeMap::new();
        for (identifier, entry) in &entries {
            let temperament = entry.build(identifier)?;
            built.insert(identifier.clone(), temperament.into_shared());
        }

        debug!("Loaded {} temperaments", built.len());
        Ok(Self { entries: built })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, TemperamentEntry> = serde_json::from_str(json)?;
        Self::load_from(entries)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let entries: BTreeMap<String, TemperamentEntry> = toml::from_str(toml)?;
        Self::load_from(entries)
    }

    /// Load a `.json` or `.toml` catalogue from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let registry = match extension.as_deref() {
            Some("json") => Self::from_json_str(&text)?,
            Some("toml") => Self::from_toml_str(&text)?,
            _ => {
                return Err(Error::Catalogue(format!(
                    "unsupported catalogue format: {}",
                    path.display()
                )))
            }
        };

        info!(
            "Loaded temperament catalogue {} ({} entries)",
            path.display(),
            registry.len()
        );
        Ok(registry)
    }

    /// The bundled catalogue of historical temperaments.
    pub fn defaults() -> Result<Self> {
        Self::from_json_str(DEFAULT_CATALOGUE)
    }

    /// Shared handle to a temperament; mutations are visible to every holder.
    pub fn get(&self, identifier: &str) -> Result<SharedTemperament> {
        self.entries
            .get(identifier)
            .map(Arc::clone)
            .ok_or_else(|| Error::NotFound(identifier.to_string()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedTemperament)> {
        self.entries.iter().map(|(id, t)| (id.as_str(), t))
    }

    /// Circle-of-fifths series for every temperament, starting at `start`.
    pub fn chart_series(&self, start: i32) -> Vec<ChartSeries> {
        self.entries
            .iter()
            .map(|(identifier, temperament)| {
                let temperament = temperament.read();
                ChartSeries {
                    identifier: identifier.clone(),
                    name: temperament.name().to_string(),
                    values: temperament.deviations_in_circle_of_fifths(start),
                }
            })
            .collect()
    }
}
