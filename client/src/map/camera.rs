//! Viewport state: zoom, pixel pan offset and horizontal world wrapping

use egui::{Pos2, Vec2, pos2, vec2};

use super::projection::PlanePoint;

/// Far enough that an f32 offset cannot resolve neighbouring worlds
const MAX_WORLD_INDEX: i64 = 1 << 40;

/// Upper bound on copies needed to cover the container
const MAX_WORLD_COPIES: i64 = 64;

/// Current zoom level and pan offset applied to the projected map
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Scale factor over the container size, 1.0 shows the whole world once
    pub zoom: f32,

    /// Pan offset in pixels
    pub offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(zoom: f32, offset: Vec2) -> Self {
        Self { zoom, offset }
    }

    /// Width of one copy of the world in pixels
    pub fn world_width(&self, container: Vec2) -> f32 {
        container.x * self.zoom
    }

    /// Plane to screen, for the world copy shifted by `world_offset` pixels
    pub fn to_screen(&self, plane: PlanePoint, container: Vec2, world_offset: f32) -> Pos2 {
        pos2(
            plane.x as f32 * container.x * self.zoom + self.offset.x + world_offset,
            plane.y as f32 * container.y * self.zoom + self.offset.y,
        )
    }

    /// Screen to plane for the given world copy. Degenerate containers map to the origin.
    pub fn screen_to_plane(&self, screen: Pos2, container: Vec2, world_offset: f32) -> PlanePoint {
        let scale = vec2(container.x * self.zoom, container.y * self.zoom);
        let x = if scale.x > 0.0 {
            (screen.x - self.offset.x - world_offset) / scale.x
        } else {
            0.0
        };
        let y = if scale.y > 0.0 {
            (screen.y - self.offset.y) / scale.y
        } else {
            0.0
        };
        PlanePoint {
            x: x as f64,
            y: y as f64,
        }
    }

    /// Horizontal pixel shifts of every world copy needed to cover the container.
    ///
    /// Renderer and hit-testing must both iterate exactly this list.
    pub fn world_offsets(&self, container: Vec2) -> Vec<f32> {
        let world_width = self.world_width(container);
        if !(world_width > 0.0) || !self.offset.x.is_finite() {
            return vec![0.0];
        }

        let copies = ((container.x / world_width).ceil() as i64).clamp(0, MAX_WORLD_COPIES) + 2;
        let start = ((-self.offset.x / world_width).floor() as i64)
            .clamp(-MAX_WORLD_INDEX, MAX_WORLD_INDEX)
            - 1;

        (start..start + copies)
            .map(|index| index as f32 * world_width)
            .collect()
    }

    /// Pan so the offset equals `start + delta`
    pub fn pan_from(&mut self, start: Vec2, delta: Vec2) {
        self.offset = start + delta;
    }

    /// Multiply zoom by `factor`, clamped to `[min, max]`, keeping `anchor` fixed on screen.
    /// Returns true if the zoom actually changed.
    pub fn zoom_at(&mut self, factor: f32, anchor: Pos2, min: f32, max: f32) -> bool {
        let old_zoom = self.zoom;
        let new_zoom = (old_zoom * factor).clamp(min, max);

        if (new_zoom - old_zoom).abs() < f32::EPSILON {
            return false;
        }

        let ratio = new_zoom / old_zoom;
        let anchor = anchor.to_vec2();
        self.offset = anchor - (anchor - self.offset) * ratio;
        self.zoom = new_zoom;
        true
    }
}
