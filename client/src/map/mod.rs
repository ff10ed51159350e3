//! Classroom map: projection, clustering, relevance coloring and pointer interaction

pub mod cache;
pub mod camera;
pub mod cluster;
pub mod grid;
pub mod interaction;
pub mod loader;
pub mod marker;
pub mod projection;
pub mod relevance;
pub mod renderer;

use std::collections::HashMap;

use egui::{Pos2, Sense, Vec2};

use crate::config::MapConfig;
use cache::{RelevanceCache, viewer_signature};
use camera::Viewport;
use cluster::frame_layout;
use interaction::{MapController, MapEvent, PointerInput, Scene};
use loader::Dataset;
use marker::{ClassroomMarker, ViewerMarker};
use relevance::Relevance;
use renderer::{DrawCommand, FrameInput, MapRenderer, Theme};

/// Integrated map view
pub struct MapView {
    controller: MapController,
    renderer: MapRenderer,
    relevance_cache: RelevanceCache,

    classrooms: Vec<ClassroomMarker>,
    viewer: Option<ViewerMarker>,
    theme: Theme,

    /// Container size in pixels (updated on layout)
    container: Vec2,

    /// Per-classroom relevance for the current frame
    relevance: HashMap<String, Relevance>,
}

impl MapView {
    pub fn new(config: &MapConfig, dataset: Dataset, theme: Theme) -> Self {
        Self {
            controller: MapController::new(config),
            renderer: MapRenderer::new(config),
            relevance_cache: RelevanceCache::new(config.relevance_cache_size),
            classrooms: dataset.classrooms,
            viewer: dataset.viewer,
            theme,
            container: Vec2::ZERO,
            relevance: HashMap::new(),
        }
    }

    /// Replace the classroom list. Cached relevance is keyed by classroom id, so it is dropped.
    pub fn set_classrooms(&mut self, classrooms: Vec<ClassroomMarker>) {
        let still_present = self
            .controller
            .selected()
            .is_none_or(|id| classrooms.iter().any(|c| c.id == id));
        if !still_present {
            self.controller.select(None);
        }
        self.classrooms = classrooms;
        self.relevance_cache.clear();
        self.controller.clear_hover();
    }

    pub fn set_viewer(&mut self, viewer: Option<ViewerMarker>) {
        self.viewer = viewer;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Handle container resize
    pub fn resize(&mut self, container: Vec2) {
        self.container = container;
    }

    /// Feed pointer input
    pub fn handle_input(&mut self, input: PointerInput) -> Option<MapEvent> {
        let scene = Scene {
            markers: &self.classrooms,
            container: self.container,
        };
        self.controller.handle(input, &scene)
    }

    /// Build the draw commands for the current state
    pub fn frame(&mut self, time: f64) -> Vec<DrawCommand> {
        self.refresh_relevance();

        let viewport = *self.controller.viewport();
        let layout = frame_layout(
            &self.classrooms,
            &viewport,
            self.container,
            self.controller.cluster_params(),
        );

        self.renderer.render(&FrameInput {
            viewport: &viewport,
            container: self.container,
            layout: &layout,
            markers: &self.classrooms,
            viewer: self.viewer.as_ref(),
            relevance: &self.relevance,
            hover: self.controller.hover(),
            selected: self.controller.selected(),
            theme: self.theme,
            time,
        })
    }

    /// Every classroom is `None` until the viewer has a location on the map
    fn refresh_relevance(&mut self) {
        self.relevance.clear();
        let located = self.viewer.as_ref().filter(|v| v.geo.is_some());
        let signature = located.map(viewer_signature);

        for classroom in &self.classrooms {
            let level = match (located, signature) {
                (Some(viewer), Some(signature)) => {
                    self.relevance_cache.get_or_compute(signature, viewer, classroom)
                }
                _ => Relevance::None,
            };
            self.relevance.insert(classroom.id.clone(), level);
        }
    }

    /// Allocate the remaining space, translate egui input and paint the map
    pub fn ui(&mut self, ui: &mut egui::Ui, time: f64) -> Option<MapEvent> {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.resize(rect.size());

        let local = |p: Pos2| (p - rect.min).to_pos2();
        let (pressed, released, pointer, scroll) = ui.input(|i| {
            (
                i.pointer.any_pressed(),
                i.pointer.any_released(),
                i.pointer.latest_pos(),
                i.raw_scroll_delta.y,
            )
        });

        let mut inputs = Vec::new();
        if let Some(p) = pointer {
            if pressed && response.hovered() {
                inputs.push(PointerInput::Down(local(p)));
            }
            if response.hovered() || self.controller.is_dragging() {
                inputs.push(PointerInput::Move(local(p)));
            } else {
                self.controller.clear_hover();
            }
        }
        // Released anywhere ends a drag
        if released {
            inputs.push(PointerInput::Up);
        }
        if response.clicked() {
            if let Some(p) = response.interact_pointer_pos() {
                inputs.push(PointerInput::Click(local(p)));
            }
        }
        if response.hovered() && scroll != 0.0 {
            let pos = pointer.map(local).unwrap_or_else(|| (rect.size() / 2.0).to_pos2());
            inputs.push(PointerInput::Wheel {
                pos,
                zoom_in: scroll > 0.0,
            });
        }

        let mut event = None;
        for input in inputs {
            if let Some(e) = self.handle_input(input) {
                event = Some(e);
            }
        }

        let commands = self.frame(time);
        renderer::paint(&ui.painter_at(rect), rect.min, &commands);

        // Keeps the viewer halo pulsing
        ui.ctx().request_repaint();
        event
    }

    pub fn zoom_in(&mut self) -> bool {
        self.controller.zoom_in(self.container)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.controller.zoom_out(self.container)
    }

    pub fn reset_view(&mut self) {
        self.controller.reset();
    }

    /// Get current viewport
    pub fn viewport(&self) -> &Viewport {
        self.controller.viewport()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.controller.zoom_percent()
    }

    pub fn selected_classroom(&self) -> Option<&ClassroomMarker> {
        let id = self.controller.selected()?;
        self.classrooms.iter().find(|c| c.id == id)
    }

    pub fn classrooms(&self) -> &[ClassroomMarker] {
        &self.classrooms
    }

    pub fn viewer(&self) -> Option<&ViewerMarker> {
        self.viewer.as_ref()
    }

    pub fn relevance_of(&self, id: &str) -> Option<Relevance> {
        self.relevance.get(id).copied()
    }

    pub fn cache_stats(&self) -> cache::CacheStats {
        self.relevance_cache.stats()
    }
}
