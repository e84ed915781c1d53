//! Read-only view over a mock property list, used to look up the virtual tour
//! attached to a property. Only the tour accessor is modelled; listing CRUD
//! lives in the external property store.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{TourData, TourError};

#[derive(Debug, Clone, Deserialize)]
struct PropertyRecord {
    #[serde(alias = "id")]
    #[serde(rename = "Id")]
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "virtual_tour", rename = "virtualTour")]
    virtual_tour: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct PropertyEntry {
    pub title: Option<String>,
    pub tour: Option<TourData>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyCatalog {
    entries: BTreeMap<u64, PropertyEntry>,
}

impl PropertyCatalog {
    pub fn from_json_str(contents: &str) -> Result<Self, TourError> {
        let records: Vec<PropertyRecord> = serde_json::from_str(contents)?;
        let mut entries = BTreeMap::new();
        for record in records {
            let tour = match record.virtual_tour {
                Some(serde_json::Value::Null) | None => None,
                Some(value) => match serde_json::from_value::<TourData>(value) {
                    Ok(tour) => Some(tour),
                    Err(err) => {
                        log::warn!("property {}: ignoring unreadable virtual tour: {err}", record.id);
                        None
                    }
                },
            };
            entries.insert(
                record.id,
                PropertyEntry {
                    title: record.title,
                    tour,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, TourError> {
        let contents = fs::read_to_string(path).map_err(|source| TourError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn property_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    pub fn property(&self, id: u64) -> Option<&PropertyEntry> {
        self.entries.get(&id)
    }

    /// Tour data for a property. Unknown properties and properties without a
    /// tour both come back as `None`; callers render the unavailable state.
    pub fn virtual_tour(&self, id: u64) -> Option<&TourData> {
        self.entries.get(&id).and_then(|entry| entry.tour.as_ref())
    }
}
