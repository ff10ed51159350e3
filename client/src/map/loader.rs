//! Classroom dataset loading and validation

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;

use super::marker::{Availability, ClassroomMarker, ViewerMarker};
use super::projection::GeoPoint;
use crate::error::{Error, Result};

const DEMO_DATASET: &str = include_str!("../../assets/classrooms.json");

/// Raw classroom record as served by the backend
#[derive(Debug, Deserialize)]
struct ClassroomRecord {
    id: String,
    name: String,
    #[serde(default)]
    location: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default)]
    availability: BTreeMap<String, Vec<i64>>,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewerRecord {
    name: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default)]
    schedule: BTreeMap<String, Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct DatasetRecord {
    #[serde(default)]
    viewer: Option<ViewerRecord>,
    #[serde(default)]
    classrooms: Vec<ClassroomRecord>,
}

/// Validated markers ready for the map
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub viewer: Option<ViewerMarker>,
    pub classrooms: Vec<ClassroomMarker>,
}

/// Read and validate a dataset file
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_dataset(&text)?;
    log::info!(
        "Loaded {} classrooms from {}",
        dataset.classrooms.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse a dataset, dropping records that cannot be placed on the map
pub fn parse_dataset(text: &str) -> Result<Dataset> {
    let record: DatasetRecord = serde_json::from_str(text)?;

    let mut seen = HashSet::new();
    let mut classrooms = Vec::with_capacity(record.classrooms.len());
    let mut skipped = 0usize;

    for raw in record.classrooms {
        match classroom_from_record(raw) {
            Ok(marker) => {
                if seen.insert(marker.id.clone()) {
                    classrooms.push(marker);
                } else {
                    warn!("Skipping duplicate classroom id {}", marker.id);
                    skipped += 1;
                }
            }
            Err(reason) => {
                warn!("Skipping classroom: {}", reason);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        debug!("{} classroom records skipped", skipped);
    }

    let viewer = match record.viewer {
        Some(raw) => match viewer_from_record(raw) {
            Ok(viewer) => Some(viewer),
            Err(reason) => {
                warn!("Ignoring viewer record: {}", reason);
                None
            }
        },
        None => None,
    };

    Ok(Dataset { viewer, classrooms })
}

/// Bundled sample data, used when no dataset is given
pub fn demo_dataset() -> Dataset {
    match parse_dataset(DEMO_DATASET) {
        Ok(dataset) => dataset,
        Err(e) => {
            log::error!("Bundled dataset is invalid: {}", e);
            Dataset::default()
        }
    }
}

fn classroom_from_record(raw: ClassroomRecord) -> std::result::Result<ClassroomMarker, String> {
    if raw.id.trim().is_empty() {
        return Err(format!("classroom '{}' has an empty id", raw.name));
    }
    let geo = validate_geo(raw.latitude, raw.longitude).map_err(|e| format!("{}: {}", raw.id, e))?;
    let availability = validate_hours(raw.availability).map_err(|e| format!("{}: {}", raw.id, e))?;

    Ok(ClassroomMarker {
        id: raw.id,
        name: raw.name,
        location: raw.location,
        geo,
        interests: raw.interests.into_iter().collect(),
        availability,
        size: raw.size,
        description: raw.description,
    })
}

fn viewer_from_record(raw: ViewerRecord) -> std::result::Result<ViewerMarker, String> {
    let geo = match (raw.latitude, raw.longitude) {
        (Some(lat), Some(lon)) => Some(validate_geo(lat, lon)?),
        (None, None) => None,
        _ => return Err("viewer needs both latitude and longitude".into()),
    };
    Ok(ViewerMarker {
        name: raw.name,
        geo,
        interests: raw.interests.into_iter().collect(),
        schedule: validate_hours(raw.schedule)?,
    })
}

fn validate_geo(latitude: f64, longitude: f64) -> std::result::Result<GeoPoint, String> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {latitude} out of range"));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {longitude} out of range"));
    }
    Ok(GeoPoint::new(latitude, longitude))
}

fn validate_hours(raw: BTreeMap<String, Vec<i64>>) -> std::result::Result<Availability, String> {
    let mut availability = Availability::new();
    for (day, hours) in raw {
        let mut set = BTreeSet::new();
        for hour in hours {
            let hour = u8::try_from(hour)
                .ok()
                .filter(|h| *h <= 23)
                .ok_or_else(|| format!("hour {hour} on {day} is outside 0-23"))?;
            set.insert(hour);
        }
        availability.insert(day, set);
    }
    Ok(availability)
}
