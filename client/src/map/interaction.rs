//! Pointer handling: pan, zoom, hover and selection

use egui::{Pos2, Vec2, pos2};

use super::camera::Viewport;
use super::cluster::{ClusterParams, FrameLayout, frame_layout};
use super::marker::ClassroomMarker;
use super::projection::to_plane;
use super::renderer::cluster_radius;
use crate::config::{MapConfig, ZOOM_LIMITS};

/// Pointer input, in container-local pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerInput {
    Down(Pos2),
    Move(Pos2),
    /// Release anywhere, including outside the map
    Up,
    Click(Pos2),
    Wheel { pos: Pos2, zoom_in: bool },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor: Pos2,
        offset_at_start: Vec2,
    },
}

/// What the pointer is over. Clusters are keyed by their anchor marker so the
/// key survives layout recomputation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum HoverTarget {
    Cluster(String),
    Marker(String),
}

/// Effects reported to the surrounding application
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    MarkerSelected(ClassroomMarker),
}

/// Markers and container size for the current frame
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub markers: &'a [ClassroomMarker],
    pub container: Vec2,
}

/// Hit radii
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitParams {
    pub cluster_base_radius: f32,
    pub cluster_radius_scale: f32,
    pub cluster_slack: f32,
    pub marker_radius: f32,
}

impl From<&MapConfig> for HitParams {
    fn from(config: &MapConfig) -> Self {
        Self {
            cluster_base_radius: config.cluster_base_radius,
            cluster_radius_scale: config.cluster_radius_scale,
            cluster_slack: config.cluster_hit_slack,
            marker_radius: config.marker_hit_radius,
        }
    }
}

/// First marker whose center lies within `radius` of `pos`
pub fn hit_test_points<'a>(
    points: impl IntoIterator<Item = (&'a ClassroomMarker, Pos2)>,
    pos: Pos2,
    radius: f32,
) -> Option<&'a ClassroomMarker> {
    points
        .into_iter()
        .find(|(_, center)| center.distance(pos) <= radius)
        .map(|(marker, _)| marker)
}

/// Hover hit-test over a frame layout. Clusters win over individuals.
pub fn hit_test_layout(
    frame: &FrameLayout<'_>,
    pos: Pos2,
    params: &HitParams,
) -> Option<HoverTarget> {
    let cluster = frame.clusters().find(|cluster| {
        let radius = cluster_radius(
            cluster.len(),
            params.cluster_base_radius,
            params.cluster_radius_scale,
        );
        cluster.screen_pos.distance(pos) <= radius + params.cluster_slack
    });
    if let Some(cluster) = cluster {
        return Some(HoverTarget::Cluster(cluster.anchor_id().to_string()));
    }

    let individuals = frame.individuals().map(|i| (i.marker, i.screen_pos));
    hit_test_points(individuals, pos, params.marker_radius)
        .map(|marker| HoverTarget::Marker(marker.id.clone()))
}

/// Owns the viewport and the pointer-driven UI state
pub struct MapController {
    viewport: Viewport,
    drag: DragState,
    hover: Option<HoverTarget>,
    selected: Option<String>,
    min_zoom: f32,
    max_zoom: f32,
    zoom_in_factor: f32,
    zoom_out_factor: f32,
    cluster: ClusterParams,
    hit: HitParams,
}

impl MapController {
    pub fn new(config: &MapConfig) -> Self {
        let (min_zoom, max_zoom) = zoom_bounds(config);
        Self {
            viewport: Viewport::new(min_zoom, Vec2::ZERO),
            drag: DragState::Idle,
            hover: None,
            selected: None,
            min_zoom,
            max_zoom,
            zoom_in_factor: config.zoom_in_factor,
            zoom_out_factor: config.zoom_out_factor,
            cluster: ClusterParams {
                max_zoom: config.cluster_max_zoom,
                distance: config.cluster_distance,
            },
            hit: HitParams::from(config),
        }
    }

    /// Feed one pointer event
    pub fn handle(&mut self, input: PointerInput, scene: &Scene<'_>) -> Option<MapEvent> {
        match input {
            PointerInput::Down(pos) => self.pointer_down(pos),
            PointerInput::Move(pos) => self.pointer_move(pos, scene),
            PointerInput::Up => self.pointer_up(),
            PointerInput::Click(pos) => return self.click(pos, scene),
            PointerInput::Wheel { pos, zoom_in } => self.wheel(pos, zoom_in),
        }
        None
    }

    pub fn pointer_down(&mut self, pos: Pos2) {
        self.drag = DragState::Dragging {
            anchor: pos,
            offset_at_start: self.viewport.offset,
        };
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Pans while dragging, otherwise re-derives hover from the current layout
    pub fn pointer_move(&mut self, pos: Pos2, scene: &Scene<'_>) {
        match self.drag {
            DragState::Dragging {
                anchor,
                offset_at_start,
            } => {
                self.viewport.pan_from(offset_at_start, pos - anchor);
            }
            DragState::Idle => {
                let frame =
                    frame_layout(scene.markers, &self.viewport, scene.container, &self.cluster);
                self.hover = hit_test_layout(&frame, pos, &self.hit);
            }
        }
    }

    /// Select the first marker under `pos` in the unwrapped world, ignoring clusters
    pub fn click(&mut self, pos: Pos2, scene: &Scene<'_>) -> Option<MapEvent> {
        let viewport = self.viewport;
        let points = scene.markers.iter().map(|marker| {
            let screen = viewport.to_screen(to_plane(marker.geo), scene.container, 0.0);
            (marker, screen)
        });
        let marker = hit_test_points(points, pos, self.hit.marker_radius)?;

        log::info!("Selected classroom {} ({})", marker.name, marker.id);
        self.selected = Some(marker.id.clone());
        Some(MapEvent::MarkerSelected(marker.clone()))
    }

    pub fn wheel(&mut self, pos: Pos2, zoom_in: bool) {
        let factor = if zoom_in {
            self.zoom_in_factor
        } else {
            self.zoom_out_factor
        };
        self.zoom_by(factor, pos);
    }

    /// Zoom keeping `anchor` fixed on screen
    pub fn zoom_by(&mut self, factor: f32, anchor: Pos2) -> bool {
        let changed = self
            .viewport
            .zoom_at(factor, anchor, self.min_zoom, self.max_zoom);
        if changed {
            log::debug!("Zoom {:.2} at ({:.0}, {:.0})", self.viewport.zoom, anchor.x, anchor.y);
        }
        changed
    }

    pub fn zoom_in(&mut self, container: Vec2) -> bool {
        self.zoom_by(self.zoom_in_factor, center_of(container))
    }

    pub fn zoom_out(&mut self, container: Vec2) -> bool {
        self.zoom_by(self.zoom_out_factor, center_of(container))
    }

    /// Back to the whole world at minimum zoom
    pub fn reset(&mut self) {
        self.viewport = Viewport::new(self.min_zoom, Vec2::ZERO);
        self.drag = DragState::Idle;
        self.hover = None;
    }

    /// Pointer left the map without dragging
    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Zoom as a whole-number percentage, for readouts
    pub fn zoom_percent(&self) -> u32 {
        (self.viewport.zoom * 100.0).round() as u32
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn hover(&self) -> Option<&HoverTarget> {
        self.hover.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn cluster_params(&self) -> &ClusterParams {
        &self.cluster
    }
}

/// Configured zoom range, forced inside [`ZOOM_LIMITS`]
fn zoom_bounds(config: &MapConfig) -> (f32, f32) {
    let (lo, hi) = ZOOM_LIMITS;
    let min = if config.min_zoom.is_finite() {
        config.min_zoom.clamp(lo, hi)
    } else {
        lo
    };
    let max = if config.max_zoom.is_finite() {
        config.max_zoom.clamp(lo, hi)
    } else {
        hi
    };
    (min, max.max(min))
}

fn center_of(container: Vec2) -> Pos2 {
    pos2(container.x / 2.0, container.y / 2.0)
}
