//! Classroom records placed on the map

use std::collections::{BTreeMap, BTreeSet};

use super::projection::GeoPoint;

/// Weekly availability: day name -> hours of day in [0, 23]
pub type Availability = BTreeMap<String, BTreeSet<u8>>;

/// A classroom's renderable position plus the metadata relevance needs
#[derive(Clone, Debug, PartialEq)]
pub struct ClassroomMarker {
    pub id: String,
    pub name: String,
    pub location: String,
    pub geo: GeoPoint,
    pub interests: BTreeSet<String>,
    pub availability: Availability,
    pub size: Option<u32>,
    pub description: Option<String>,
}

impl ClassroomMarker {
    pub fn new(id: impl Into<String>, name: impl Into<String>, geo: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: String::new(),
            geo,
            interests: BTreeSet::new(),
            availability: Availability::new(),
            size: None,
            description: None,
        }
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hours(mut self, day: &str, hours: impl IntoIterator<Item = u8>) -> Self {
        self.availability
            .entry(day.to_string())
            .or_default()
            .extend(hours);
        self
    }
}

/// The viewer's own classroom. Always drawn, never clustered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewerMarker {
    pub name: String,
    /// `None` until the viewer has set a location
    pub geo: Option<GeoPoint>,
    pub interests: BTreeSet<String>,
    pub schedule: Availability,
}

impl ViewerMarker {
    pub fn new(name: impl Into<String>, geo: Option<GeoPoint>) -> Self {
        Self {
            name: name.into(),
            geo,
            ..Default::default()
        }
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hours(mut self, day: &str, hours: impl IntoIterator<Item = u8>) -> Self {
        self.schedule.entry(day.to_string()).or_default().extend(hours);
        self
    }
}
