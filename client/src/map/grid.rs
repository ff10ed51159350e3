//! Background grid that scales and scrolls with the viewport

use egui::{Stroke, Vec2, pos2};

use super::camera::Viewport;
use crate::config::MIN_GRID_SPACING;
use super::renderer::DrawCommand;

/// Grid overlay drawn under the markers
#[derive(Clone, Copy, Debug)]
pub struct MapGrid {
    /// Cell size at zoom 1, in pixels
    pub spacing: f32,
    pub stroke: Stroke,
}

impl MapGrid {
    pub fn new(spacing: f32, stroke: Stroke) -> Self {
        Self { spacing, stroke }
    }

    /// Screen-space cell size at the viewport's zoom, never below [`MIN_GRID_SPACING`]
    pub fn cell_size(&self, viewport: &Viewport) -> f32 {
        (self.spacing * viewport.zoom).max(MIN_GRID_SPACING)
    }

    /// Line commands covering the container
    pub fn lines(&self, viewport: &Viewport, container: Vec2) -> Vec<DrawCommand> {
        let cell = self.cell_size(viewport);
        if !cell.is_finite() || !(container.x > 0.0) || !(container.y > 0.0) {
            return Vec::new();
        }
        if !viewport.offset.x.is_finite() || !viewport.offset.y.is_finite() {
            return Vec::new();
        }

        let mut commands = Vec::new();

        // First line at or left of the container edge, aligned to the pan offset
        let mut x = viewport.offset.x.rem_euclid(cell);
        while x <= container.x {
            commands.push(DrawCommand::Line {
                from: pos2(x, 0.0),
                to: pos2(x, container.y),
                stroke: self.stroke,
            });
            x += cell;
        }

        let mut y = viewport.offset.y.rem_euclid(cell);
        while y <= container.y {
            commands.push(DrawCommand::Line {
                from: pos2(0.0, y),
                to: pos2(container.x, y),
                stroke: self.stroke,
            });
            y += cell;
        }

        commands
    }
}
