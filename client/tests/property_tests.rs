use std::collections::{BTreeSet, HashMap};

use classmap::map::camera::Viewport;
use classmap::map::cluster::{ClusterParams, compute_layout};
use classmap::map::marker::{ClassroomMarker, ViewerMarker};
use classmap::map::projection::{GeoPoint, to_plane};
use classmap::map::relevance::{Relevance, relevance, schedule_overlap};
use egui::{pos2, vec2};
use proptest::prelude::*;

const DAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];
const TOPICS: [&str; 6] = ["Math", "Science", "Art", "Music", "History", "Coding"];

fn markers_strategy() -> impl Strategy<Value = Vec<ClassroomMarker>> {
    prop::collection::vec((-85.0f64..85.0, -180.0f64..180.0), 0..40).prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (lat, lon))| {
                ClassroomMarker::new(format!("m{i}"), format!("Room {i}"), GeoPoint::new(lat, lon))
            })
            .collect()
    })
}

fn hours_strategy() -> impl Strategy<Value = Vec<(usize, u8)>> {
    prop::collection::vec((0..DAYS.len(), 0u8..24), 0..6)
}

fn topics_strategy() -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::btree_set(0..TOPICS.len(), 0..4)
}

proptest! {
    #[test]
    fn prop_plane_in_unit_square(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
        let p = to_plane(GeoPoint::new(lat, lon));
        prop_assert!((0.0..=1.0).contains(&p.x));
        prop_assert!((0.0..=1.0).contains(&p.y));
    }

    #[test]
    fn prop_layout_places_every_marker_once(
        markers in markers_strategy(),
        zoom in 1.0f32..=4.0,
        offset_x in -2000.0f32..2000.0,
        offset_y in -1000.0f32..1000.0,
    ) {
        let viewport = Viewport::new(zoom, vec2(offset_x, offset_y));
        let layout = compute_layout(
            &markers,
            &viewport,
            vec2(800.0, 600.0),
            0.0,
            &ClusterParams::default(),
        );

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for cluster in &layout.clusters {
            prop_assert!(cluster.len() >= 2);
            for member in &cluster.members {
                *counts.entry(member.id.as_str()).or_default() += 1;
            }
        }
        for individual in &layout.individuals {
            *counts.entry(individual.marker.id.as_str()).or_default() += 1;
        }

        prop_assert_eq!(counts.len(), markers.len());
        prop_assert!(counts.values().all(|&n| n == 1));
    }

    #[test]
    fn prop_no_clusters_above_cutoff(markers in markers_strategy(), zoom in 2.51f32..=4.0) {
        let viewport = Viewport::new(zoom, vec2(0.0, 0.0));
        let layout = compute_layout(
            &markers,
            &viewport,
            vec2(800.0, 600.0),
            0.0,
            &ClusterParams::default(),
        );
        prop_assert!(layout.clusters.is_empty());
        prop_assert_eq!(layout.individuals.len(), markers.len());
    }

    #[test]
    fn prop_zoom_keeps_cursor_point(
        zoom in 1.0f32..=4.0,
        offset_x in -1500.0f32..1500.0,
        offset_y in -800.0f32..800.0,
        cursor_x in 0.0f32..800.0,
        cursor_y in 0.0f32..600.0,
        zoom_in in any::<bool>(),
    ) {
        let container = vec2(800.0, 600.0);
        let cursor = pos2(cursor_x, cursor_y);
        let mut viewport = Viewport::new(zoom, vec2(offset_x, offset_y));

        let before = viewport.screen_to_plane(cursor, container, 0.0);
        viewport.zoom_at(if zoom_in { 1.1 } else { 0.9 }, cursor, 1.0, 4.0);
        let after = viewport.screen_to_plane(cursor, container, 0.0);

        prop_assert!((1.0..=4.0).contains(&viewport.zoom));
        prop_assert!((before.x - after.x).abs() < 1e-3);
        prop_assert!((before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn prop_perfect_iff_overlap_and_all_interests(
        viewer_topics in prop::collection::btree_set(0..TOPICS.len(), 1..4),
        candidate_topics in topics_strategy(),
        viewer_hours in hours_strategy(),
        candidate_hours in hours_strategy(),
    ) {
        let mut viewer = ViewerMarker::new("Us", None)
            .with_interests(viewer_topics.iter().map(|&i| TOPICS[i]));
        for (day, hour) in &viewer_hours {
            viewer = viewer.with_hours(DAYS[*day], [*hour]);
        }
        let mut candidate = ClassroomMarker::new("c", "Them", GeoPoint::new(0.0, 0.0))
            .with_interests(candidate_topics.iter().map(|&i| TOPICS[i]));
        for (day, hour) in &candidate_hours {
            candidate = candidate.with_hours(DAYS[*day], [*hour]);
        }

        let overlap = schedule_overlap(&viewer.schedule, &candidate.availability);
        let all_shared = viewer_topics.is_subset(&candidate_topics);
        let level = relevance(&viewer, &candidate);

        prop_assert_eq!(level == Relevance::Perfect, overlap && all_shared);
    }

    #[test]
    fn prop_no_viewer_interests_is_none(
        candidate_topics in topics_strategy(),
        viewer_hours in hours_strategy(),
        candidate_hours in hours_strategy(),
    ) {
        let mut viewer = ViewerMarker::new("Us", None);
        for (day, hour) in &viewer_hours {
            viewer = viewer.with_hours(DAYS[*day], [*hour]);
        }
        let mut candidate = ClassroomMarker::new("c", "Them", GeoPoint::new(0.0, 0.0))
            .with_interests(candidate_topics.iter().map(|&i| TOPICS[i]));
        for (day, hour) in &candidate_hours {
            candidate = candidate.with_hours(DAYS[*day], [*hour]);
        }

        prop_assert_eq!(relevance(&viewer, &candidate), Relevance::None);
    }
}
