//! How well a candidate classroom matches the viewer

use egui::Color32;

use super::marker::{Availability, ClassroomMarker, ViewerMarker};

/// Match quality, ordered from weakest to strongest
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Relevance {
    None,
    Partial,
    Good,
    Perfect,
}

impl Relevance {
    pub const ALL: [Relevance; 4] = [
        Relevance::Perfect,
        Relevance::Good,
        Relevance::Partial,
        Relevance::None,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Relevance::Perfect => "Perfect match",
            Relevance::Good => "Good match",
            Relevance::Partial => "Shared interests",
            Relevance::None => "No match",
        }
    }

    pub fn color(self) -> Color32 {
        match self {
            Relevance::Perfect => Color32::from_rgb(34, 197, 94),
            Relevance::Good => Color32::from_rgb(59, 130, 246),
            Relevance::Partial => Color32::from_rgb(245, 158, 11),
            Relevance::None => Color32::from_rgb(148, 163, 184),
        }
    }
}

/// True if both sides share at least one hour on the same day
pub fn schedule_overlap(a: &Availability, b: &Availability) -> bool {
    a.iter().any(|(day, hours)| {
        b.get(day)
            .is_some_and(|other| !hours.is_disjoint(other))
    })
}

/// Fraction of the viewer's interests the candidate shares; 0 when the viewer has none
pub fn interest_ratio(viewer: &ViewerMarker, candidate: &ClassroomMarker) -> f64 {
    if viewer.interests.is_empty() {
        return 0.0;
    }
    let shared = viewer.interests.intersection(&candidate.interests).count();
    shared as f64 / viewer.interests.len() as f64
}

/// Classify a candidate against the viewer
pub fn relevance(viewer: &ViewerMarker, candidate: &ClassroomMarker) -> Relevance {
    let overlap = schedule_overlap(&viewer.schedule, &candidate.availability);
    let ratio = interest_ratio(viewer, candidate);

    if overlap && ratio >= 1.0 {
        Relevance::Perfect
    } else if ratio > 0.0 && overlap {
        Relevance::Good
    } else if ratio > 0.0 {
        Relevance::Partial
    } else {
        Relevance::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::projection::GeoPoint;

    fn viewer() -> ViewerMarker {
        ViewerMarker::new("Us", Some(GeoPoint::new(51.5074, -0.1278)))
            .with_interests(["Math"])
            .with_hours("Mon", [9])
    }

    fn candidate() -> ClassroomMarker {
        ClassroomMarker::new("c1", "Them", GeoPoint::new(48.8566, 2.3522))
    }

    #[test]
    fn test_perfect() {
        let c = candidate().with_interests(["Math"]).with_hours("Mon", [9]);
        assert_eq!(relevance(&viewer(), &c), Relevance::Perfect);
    }

    #[test]
    fn test_good_needs_some_interests_and_overlap() {
        let v = viewer().with_interests(["Math", "Art"]);
        let c = candidate().with_interests(["Math"]).with_hours("Mon", [8, 9]);
        assert_eq!(relevance(&v, &c), Relevance::Good);
    }

    #[test]
    fn test_partial_without_overlap() {
        let c = candidate().with_interests(["Math"]).with_hours("Mon", [10]);
        assert_eq!(relevance(&viewer(), &c), Relevance::Partial);

        // Same hour on a different day is not an overlap
        let c = candidate().with_interests(["Math"]).with_hours("Tue", [9]);
        assert_eq!(relevance(&viewer(), &c), Relevance::Partial);
    }

    #[test]
    fn test_none_without_shared_interests() {
        let c = candidate().with_interests(["History"]).with_hours("Mon", [9]);
        assert_eq!(relevance(&viewer(), &c), Relevance::None);
    }

    #[test]
    fn test_empty_viewer_interests_is_none() {
        let v = ViewerMarker::new("Us", None).with_hours("Mon", [9]);
        let c = candidate().with_interests(["Math"]).with_hours("Mon", [9]);
        assert_eq!(interest_ratio(&v, &c), 0.0);
        assert_eq!(relevance(&v, &c), Relevance::None);
    }

    #[test]
    fn test_extra_candidate_interests_still_perfect() {
        let c = candidate()
            .with_interests(["Math", "Music"])
            .with_hours("Mon", [9]);
        assert_eq!(relevance(&viewer(), &c), Relevance::Perfect);
    }

    #[test]
    fn test_priority_order() {
        assert!(Relevance::Perfect > Relevance::Good);
        assert!(Relevance::Good > Relevance::Partial);
        assert!(Relevance::Partial > Relevance::None);
    }
}
