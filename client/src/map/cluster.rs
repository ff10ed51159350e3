//! Greedy screen-space clustering of classroom markers.
//!
//! Layouts are recomputed from scratch every frame and on every idle pointer
//! move. Cluster ids are frame-local: they are the zero-based emission index
//! and carry no meaning across frames. Anything that must survive a frame
//! (hover) keys on [`Cluster::anchor_id`] instead.
//!
//! The grouping is single pass and compares candidates only against the seed
//! marker, not transitively. Two markers that are both close to the seed end up
//! in the seed's cluster even if they are far from each other. With tens of
//! markers the O(n²) scan is cheap enough to run per frame and per world copy.

use egui::{Pos2, Vec2};

use super::camera::Viewport;
use super::marker::ClassroomMarker;
use super::projection::{GeoPoint, to_plane};

/// Parameters that shape a layout pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterParams {
    /// Above this zoom clustering is switched off
    pub max_zoom: f32,
    /// Threshold at zoom 1, divided by the current zoom
    pub distance: f32,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            max_zoom: 2.5,
            distance: 100.0,
        }
    }
}

impl ClusterParams {
    /// Screen distance below which markers join a cluster
    pub fn threshold(&self, zoom: f32) -> f32 {
        self.distance / zoom
    }
}

/// Two or more markers drawn as one circle
#[derive(Clone, Debug)]
pub struct Cluster<'a> {
    pub id: usize,
    pub members: Vec<&'a ClassroomMarker>,
    pub centroid: GeoPoint,
    pub screen_pos: Pos2,
}

impl Cluster<'_> {
    /// Id of the seed marker; stable as long as the input order is
    pub fn anchor_id(&self) -> &str {
        &self.members[0].id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

/// A marker drawn on its own
#[derive(Clone, Copy, Debug)]
pub struct Individual<'a> {
    pub marker: &'a ClassroomMarker,
    pub screen_pos: Pos2,
}

/// Layout of one world copy
#[derive(Clone, Debug, Default)]
pub struct Layout<'a> {
    pub clusters: Vec<Cluster<'a>>,
    pub individuals: Vec<Individual<'a>>,
}

impl Layout<'_> {
    /// Total number of markers placed, counting cluster members
    pub fn marker_count(&self) -> usize {
        self.individuals.len() + self.clusters.iter().map(Cluster::len).sum::<usize>()
    }
}

/// Layout of a single world copy, with the shift it was computed for
#[derive(Clone, Debug)]
pub struct WorldLayout<'a> {
    pub world_offset: f32,
    pub layout: Layout<'a>,
}

/// Layouts for every visible world copy of one frame.
/// Drawing and hit-testing consume the same value.
#[derive(Clone, Debug, Default)]
pub struct FrameLayout<'a> {
    pub worlds: Vec<WorldLayout<'a>>,
}

impl<'a> FrameLayout<'a> {
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster<'a>> {
        self.worlds.iter().flat_map(|w| w.layout.clusters.iter())
    }

    pub fn individuals(&self) -> impl Iterator<Item = &Individual<'a>> {
        self.worlds.iter().flat_map(|w| w.layout.individuals.iter())
    }
}

/// Group markers for one world copy
pub fn compute_layout<'a>(
    markers: &'a [ClassroomMarker],
    viewport: &Viewport,
    container: Vec2,
    world_offset: f32,
    params: &ClusterParams,
) -> Layout<'a> {
    let positions: Vec<Pos2> = markers
        .iter()
        .map(|m| viewport.to_screen(to_plane(m.geo), container, world_offset))
        .collect();

    if viewport.zoom > params.max_zoom {
        let individuals = markers
            .iter()
            .zip(&positions)
            .map(|(marker, &screen_pos)| Individual { marker, screen_pos })
            .collect();
        return Layout {
            clusters: Vec::new(),
            individuals,
        };
    }

    let threshold = params.threshold(viewport.zoom);
    let mut processed = vec![false; markers.len()];
    let mut layout = Layout::default();

    for seed in 0..markers.len() {
        if processed[seed] {
            continue;
        }

        let mut group = vec![seed];
        for other in 0..markers.len() {
            if other == seed || processed[other] {
                continue;
            }
            if positions[seed].distance(positions[other]) < threshold {
                group.push(other);
            }
        }

        if group.len() >= 2 {
            for &i in &group {
                processed[i] = true;
            }
            let members: Vec<&ClassroomMarker> = group.iter().map(|&i| &markers[i]).collect();
            let centroid = GeoPoint::mean(members.iter().map(|m| &m.geo))
                .unwrap_or(markers[seed].geo);
            let screen_pos = viewport.to_screen(to_plane(centroid), container, world_offset);
            layout.clusters.push(Cluster {
                id: layout.clusters.len(),
                members,
                centroid,
                screen_pos,
            });
        } else {
            processed[seed] = true;
            layout.individuals.push(Individual {
                marker: &markers[seed],
                screen_pos: positions[seed],
            });
        }
    }

    layout
}

/// Layouts for every world copy the viewport needs
pub fn frame_layout<'a>(
    markers: &'a [ClassroomMarker],
    viewport: &Viewport,
    container: Vec2,
    params: &ClusterParams,
) -> FrameLayout<'a> {
    let worlds = viewport
        .world_offsets(container)
        .into_iter()
        .map(|world_offset| WorldLayout {
            world_offset,
            layout: compute_layout(markers, viewport, container, world_offset, params),
        })
        .collect();
    FrameLayout { worlds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    const CONTAINER: Vec2 = vec2(1000.0, 1000.0);

    // 1.8 degrees of longitude is 5 px at zoom 1 in a 1000 px container
    fn pair_5px_apart() -> Vec<ClassroomMarker> {
        vec![
            ClassroomMarker::new("a", "A", GeoPoint::new(0.0, 0.0)),
            ClassroomMarker::new("b", "B", GeoPoint::new(0.0, 1.8)),
        ]
    }

    #[test]
    fn test_close_pair_clusters_at_low_zoom() {
        let markers = pair_5px_apart();
        let layout = compute_layout(
            &markers,
            &Viewport::default(),
            CONTAINER,
            0.0,
            &ClusterParams::default(),
        );
        assert_eq!(layout.clusters.len(), 1);
        assert_eq!(layout.clusters[0].len(), 2);
        assert_eq!(layout.clusters[0].id, 0);
        assert_eq!(layout.clusters[0].anchor_id(), "a");
        assert_eq!(layout.clusters[0].centroid, GeoPoint::new(0.0, 0.9));
        assert!(layout.individuals.is_empty());
    }

    #[test]
    fn test_high_zoom_disables_clustering() {
        let markers = pair_5px_apart();
        let viewport = Viewport::new(3.0, Vec2::ZERO);
        let layout = compute_layout(&markers, &viewport, CONTAINER, 0.0, &ClusterParams::default());
        assert!(layout.clusters.is_empty());
        assert_eq!(layout.individuals.len(), 2);
    }

    #[test]
    fn test_grouping_is_not_transitive() {
        // b and c are each 60 px from a but 120 px from each other
        let markers = vec![
            ClassroomMarker::new("a", "A", GeoPoint::new(0.0, 0.0)),
            ClassroomMarker::new("b", "B", GeoPoint::new(0.0, -21.6)),
            ClassroomMarker::new("c", "C", GeoPoint::new(0.0, 21.6)),
        ];
        let layout = compute_layout(
            &markers,
            &Viewport::default(),
            CONTAINER,
            0.0,
            &ClusterParams::default(),
        );
        assert_eq!(layout.clusters.len(), 1);
        let ids: Vec<&str> = layout.clusters[0].members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_order_decides_membership() {
        // b sits between a and c; seeding from b claims both neighbours
        let a = ClassroomMarker::new("a", "A", GeoPoint::new(0.0, -25.2));
        let b = ClassroomMarker::new("b", "B", GeoPoint::new(0.0, 0.0));
        let c = ClassroomMarker::new("c", "C", GeoPoint::new(0.0, 25.2));

        let from_a = [a.clone(), b.clone(), c.clone()];
        let layout = compute_layout(
            &from_a,
            &Viewport::default(),
            CONTAINER,
            0.0,
            &ClusterParams::default(),
        );
        assert_eq!(layout.clusters.len(), 1);
        assert_eq!(layout.clusters[0].len(), 2);
        assert_eq!(layout.individuals.len(), 1);
        assert_eq!(layout.individuals[0].marker.id, "c");

        let from_b = [b, a, c];
        let layout = compute_layout(
            &from_b,
            &Viewport::default(),
            CONTAINER,
            0.0,
            &ClusterParams::default(),
        );
        assert_eq!(layout.clusters.len(), 1);
        assert_eq!(layout.clusters[0].len(), 3);
        assert!(layout.individuals.is_empty());
    }

    #[test]
    fn test_threshold_shrinks_with_zoom() {
        let params = ClusterParams::default();
        assert_eq!(params.threshold(1.0), 100.0);
        assert_eq!(params.threshold(2.0), 50.0);

        // 40 px apart at zoom 1 becomes 80 px at zoom 2, past the 50 px threshold
        let markers = vec![
            ClassroomMarker::new("a", "A", GeoPoint::new(0.0, 0.0)),
            ClassroomMarker::new("b", "B", GeoPoint::new(0.0, 14.4)),
        ];
        let zoomed = Viewport::new(2.0, Vec2::ZERO);
        let layout = compute_layout(&markers, &zoomed, CONTAINER, 0.0, &params);
        assert!(layout.clusters.is_empty());
        assert_eq!(layout.individuals.len(), 2);
    }

    #[test]
    fn test_empty_and_single() {
        let none: Vec<ClassroomMarker> = Vec::new();
        let layout = compute_layout(
            &none,
            &Viewport::default(),
            CONTAINER,
            0.0,
            &ClusterParams::default(),
        );
        assert!(layout.clusters.is_empty() && layout.individuals.is_empty());

        let one = vec![ClassroomMarker::new("a", "A", GeoPoint::new(10.0, 10.0))];
        let layout = compute_layout(
            &one,
            &Viewport::default(),
            CONTAINER,
            0.0,
            &ClusterParams::default(),
        );
        assert_eq!(layout.individuals.len(), 1);
    }

    #[test]
    fn test_frame_layout_covers_every_world() {
        let markers = pair_5px_apart();
        let viewport = Viewport::default();
        let frame = frame_layout(&markers, &viewport, CONTAINER, &ClusterParams::default());
        assert_eq!(frame.worlds.len(), viewport.world_offsets(CONTAINER).len());
        for world in &frame.worlds {
            assert_eq!(world.layout.marker_count(), markers.len());
        }
        // World copies are shifted by exactly one world width
        let xs: Vec<f32> = frame.clusters().map(|c| c.screen_pos.x).collect();
        assert_eq!(xs.len(), 3);
        assert!((xs[1] - xs[0] - 1000.0).abs() < 1e-3);
    }
}
