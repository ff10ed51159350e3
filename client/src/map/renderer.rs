//! Frame renderer producing a flat list of draw commands
//!
//! The renderer is pure: the same inputs always yield the same commands, and
//! it never touches egui state. [`paint`] replays a command list onto an
//! `egui::Painter`.

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;
use std::str::FromStr;

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use super::camera::Viewport;
use super::cluster::{Cluster, FrameLayout};
use super::grid::MapGrid;
use super::interaction::HoverTarget;
use super::marker::{ClassroomMarker, ViewerMarker};
use super::projection::to_plane;
use super::relevance::Relevance;
use crate::config::MapConfig;

const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_PADDING: f32 = 5.0;
// Rough advance of one proportional glyph relative to font size
const GLYPH_WIDTH: f32 = 0.6;
const COUNT_FONT_SIZE: f32 = 12.0;

const VIEWER_RADIUS: f32 = 9.0;
const VIEWER_HALO_RADIUS: f32 = 16.0;
const VIEWER_HALO_PULSE: f32 = 5.0;
const VIEWER_PULSE_PERIOD: f64 = 1.6;

/// A single drawing operation in container-local pixels
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole container
    Clear(Color32),
    Line {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
    },
    DashedLine {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
        dash: f32,
        gap: f32,
    },
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Rect {
        rect: Rect,
        corner_radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        anchor: Align2,
        text: String,
        size: f32,
        color: Color32,
    },
}

/// Display theme
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Color32::from_rgb(241, 245, 249),
                grid: Color32::from_rgb(226, 232, 240),
                text: Color32::from_rgb(15, 23, 42),
                label_fill: Color32::WHITE,
                label_stroke: Color32::from_rgb(203, 213, 225),
                marker_stroke: Color32::WHITE,
                accent: Color32::from_rgb(124, 58, 237),
                connector: Color32::from_rgb(100, 116, 139),
            },
            Theme::Dark => Palette {
                background: Color32::from_rgb(15, 23, 42),
                grid: Color32::from_rgb(30, 41, 59),
                text: Color32::from_rgb(241, 245, 249),
                label_fill: Color32::from_rgb(30, 41, 59),
                label_stroke: Color32::from_rgb(71, 85, 105),
                marker_stroke: Color32::from_rgb(15, 23, 42),
                accent: Color32::from_rgb(167, 139, 250),
                connector: Color32::from_rgb(148, 163, 184),
            },
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}', expected 'light' or 'dark'")),
        }
    }
}

/// Theme colors
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub background: Color32,
    pub grid: Color32,
    pub text: Color32,
    pub label_fill: Color32,
    pub label_stroke: Color32,
    pub marker_stroke: Color32,
    pub accent: Color32,
    pub connector: Color32,
}

/// Circle radius for a cluster of `count` markers
pub fn cluster_radius(count: usize, base: f32, scale: f32) -> f32 {
    base + (count.max(1) as f32).ln() * scale
}

/// Strongest relevance among the members, used as the cluster color
pub fn cluster_relevance(cluster: &Cluster<'_>, levels: &HashMap<String, Relevance>) -> Relevance {
    cluster
        .members
        .iter()
        .map(|m| levels.get(&m.id).copied().unwrap_or(Relevance::None))
        .max()
        .unwrap_or(Relevance::None)
}

/// Position a label box next to `anchor`, flipping to stay inside the container.
///
/// Prefers up and to the right of the anchor. `gap` is the distance kept from
/// the anchor on both axes.
pub fn place_label(anchor: Pos2, size: Vec2, container: Vec2, gap: f32) -> Rect {
    let mut x = anchor.x + gap;
    if x + size.x > container.x {
        x = anchor.x - gap - size.x;
    }
    let mut y = anchor.y - gap - size.y;
    if y < 0.0 {
        y = anchor.y + gap;
    }
    Rect::from_min_size(pos2(x, y), size)
}

/// Estimated box size for a label
pub fn label_size(text: &str) -> Vec2 {
    let chars = text.chars().count() as f32;
    vec2(
        chars * LABEL_FONT_SIZE * GLYPH_WIDTH + LABEL_PADDING * 2.0,
        LABEL_FONT_SIZE + LABEL_PADDING * 2.0,
    )
}

/// Everything one frame depends on
pub struct FrameInput<'a> {
    pub viewport: &'a Viewport,
    pub container: Vec2,
    pub layout: &'a FrameLayout<'a>,
    pub markers: &'a [ClassroomMarker],
    pub viewer: Option<&'a ViewerMarker>,
    pub relevance: &'a HashMap<String, Relevance>,
    pub hover: Option<&'a HoverTarget>,
    pub selected: Option<&'a str>,
    pub theme: Theme,
    /// Seconds since start, drives the viewer halo
    pub time: f64,
}

struct LabelRequest {
    key: HoverTarget,
    anchor: Pos2,
    radius: f32,
    text: String,
}

/// Draws markers, clusters and overlays
pub struct MapRenderer {
    cluster_base_radius: f32,
    cluster_radius_scale: f32,
    marker_radius: f32,
    marker_hover_radius: f32,
    marker_selected_radius: f32,
    grid_spacing: f32,
    show_legend: bool,
}

impl MapRenderer {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            cluster_base_radius: config.cluster_base_radius,
            cluster_radius_scale: config.cluster_radius_scale,
            marker_radius: config.marker_radius,
            marker_hover_radius: config.marker_hover_radius,
            marker_selected_radius: config.marker_selected_radius,
            grid_spacing: config.grid_spacing,
            show_legend: config.show_legend,
        }
    }

    /// Build the command list for one frame
    pub fn render(&self, input: &FrameInput<'_>) -> Vec<DrawCommand> {
        let palette = input.theme.palette();
        let mut out = vec![DrawCommand::Clear(palette.background)];

        let grid = MapGrid::new(self.grid_spacing, Stroke::new(1.0, palette.grid));
        out.extend(grid.lines(input.viewport, input.container));

        self.draw_connector(input, &palette, &mut out);

        let mut labels = Vec::new();
        for world in &input.layout.worlds {
            for cluster in &world.layout.clusters {
                self.draw_cluster(input, cluster, &palette, &mut labels, &mut out);
            }
            for individual in &world.layout.individuals {
                let marker = individual.marker;
                let selected = input.selected == Some(marker.id.as_str());
                let hovered =
                    matches!(input.hover, Some(HoverTarget::Marker(id)) if *id == marker.id);
                let level = input
                    .relevance
                    .get(&marker.id)
                    .copied()
                    .unwrap_or(Relevance::None);

                let radius = if selected {
                    self.marker_selected_radius
                } else if hovered {
                    self.marker_hover_radius
                } else {
                    self.marker_radius
                };

                if selected {
                    out.push(DrawCommand::Circle {
                        center: individual.screen_pos,
                        radius: radius + 4.0,
                        fill: Color32::TRANSPARENT,
                        stroke: Stroke::new(2.0, level.color()),
                    });
                }
                out.push(DrawCommand::Circle {
                    center: individual.screen_pos,
                    radius,
                    fill: level.color(),
                    stroke: Stroke::new(2.0, palette.marker_stroke),
                });

                if selected || hovered {
                    labels.push(LabelRequest {
                        key: HoverTarget::Marker(marker.id.clone()),
                        anchor: individual.screen_pos,
                        radius,
                        text: marker.name.clone(),
                    });
                }
            }
        }

        self.draw_viewer(input, &palette, &mut out);
        self.draw_labels(input, labels, &palette, &mut out);

        if self.show_legend {
            self.draw_legend(input.container, &palette, &mut out);
        }

        out
    }

    fn draw_cluster(
        &self,
        input: &FrameInput<'_>,
        cluster: &Cluster<'_>,
        palette: &Palette,
        labels: &mut Vec<LabelRequest>,
        out: &mut Vec<DrawCommand>,
    ) {
        let radius = cluster_radius(
            cluster.len(),
            self.cluster_base_radius,
            self.cluster_radius_scale,
        );
        let level = cluster_relevance(cluster, input.relevance);
        let hovered =
            matches!(input.hover, Some(HoverTarget::Cluster(id)) if id == cluster.anchor_id());

        out.push(DrawCommand::Circle {
            center: cluster.screen_pos,
            radius,
            fill: level.color(),
            stroke: Stroke::new(if hovered { 3.0 } else { 2.0 }, palette.marker_stroke),
        });
        out.push(DrawCommand::Text {
            pos: cluster.screen_pos,
            anchor: Align2::CENTER_CENTER,
            text: cluster.len().to_string(),
            size: COUNT_FONT_SIZE,
            color: Color32::WHITE,
        });

        if hovered {
            labels.push(LabelRequest {
                key: HoverTarget::Cluster(cluster.anchor_id().to_string()),
                anchor: cluster.screen_pos,
                radius,
                text: format!("{} classrooms", cluster.len()),
            });
        }
    }

    /// Dashed line from the viewer to the selected marker, using the closest pair of world copies
    fn draw_connector(
        &self,
        input: &FrameInput<'_>,
        palette: &Palette,
        out: &mut Vec<DrawCommand>,
    ) {
        let Some(viewer_geo) = input.viewer.and_then(|v| v.geo) else {
            return;
        };
        let Some(selected) = input
            .selected
            .and_then(|id| input.markers.iter().find(|m| m.id == id))
        else {
            return;
        };

        let from_plane = to_plane(viewer_geo);
        let to_plane_pt = to_plane(selected.geo);
        let worlds: Vec<f32> = input.layout.worlds.iter().map(|w| w.world_offset).collect();

        let mut best: Option<(Pos2, Pos2)> = None;
        for &a in &worlds {
            let from = input.viewport.to_screen(from_plane, input.container, a);
            for &b in &worlds {
                let to = input.viewport.to_screen(to_plane_pt, input.container, b);
                let closer = match best {
                    None => true,
                    Some((f, t)) => (to.x - from.x).abs() < (t.x - f.x).abs(),
                };
                if closer {
                    best = Some((from, to));
                }
            }
        }

        if let Some((from, to)) = best {
            out.push(DrawCommand::DashedLine {
                from,
                to,
                stroke: Stroke::new(2.0, palette.connector),
                dash: 6.0,
                gap: 4.0,
            });
        }
    }

    fn draw_viewer(&self, input: &FrameInput<'_>, palette: &Palette, out: &mut Vec<DrawCommand>) {
        let Some(geo) = input.viewer.and_then(|v| v.geo) else {
            return;
        };
        let plane = to_plane(geo);

        let phase = ((input.time / VIEWER_PULSE_PERIOD).fract() as f32 * TAU).sin() * 0.5 + 0.5;
        let halo_radius = VIEWER_HALO_RADIUS + phase * VIEWER_HALO_PULSE;
        let halo_alpha = (90.0 * (1.0 - phase * 0.6)) as u8;
        let halo = Color32::from_rgba_unmultiplied(
            palette.accent.r(),
            palette.accent.g(),
            palette.accent.b(),
            halo_alpha,
        );

        for world in &input.layout.worlds {
            let center = input.viewport.to_screen(plane, input.container, world.world_offset);
            out.push(DrawCommand::Circle {
                center,
                radius: halo_radius,
                fill: halo,
                stroke: Stroke::NONE,
            });
            out.push(DrawCommand::Circle {
                center,
                radius: VIEWER_RADIUS,
                fill: palette.accent,
                stroke: Stroke::new(2.0, palette.marker_stroke),
            });
            out.push(DrawCommand::Circle {
                center,
                radius: 3.0,
                fill: Color32::WHITE,
                stroke: Stroke::NONE,
            });
        }
    }

    /// One label per hovered or selected entity, at its first on-screen occurrence
    fn draw_labels(
        &self,
        input: &FrameInput<'_>,
        labels: Vec<LabelRequest>,
        palette: &Palette,
        out: &mut Vec<DrawCommand>,
    ) {
        let bounds = Rect::from_min_size(Pos2::ZERO, input.container);
        let mut drawn = HashSet::new();

        for label in labels {
            if !bounds.contains(label.anchor) || drawn.contains(&label.key) {
                continue;
            }

            let size = label_size(&label.text);
            let rect = place_label(label.anchor, size, input.container, label.radius + 6.0);
            out.push(DrawCommand::Rect {
                rect,
                corner_radius: 4.0,
                fill: palette.label_fill,
                stroke: Stroke::new(1.0, palette.label_stroke),
            });
            out.push(DrawCommand::Text {
                pos: rect.left_center() + vec2(LABEL_PADDING, 0.0),
                anchor: Align2::LEFT_CENTER,
                text: label.text,
                size: LABEL_FONT_SIZE,
                color: palette.text,
            });
            drawn.insert(label.key);
        }
    }

    fn draw_legend(&self, container: Vec2, palette: &Palette, out: &mut Vec<DrawCommand>) {
        let row_height = 18.0;
        let width = 140.0;
        let height = row_height * Relevance::ALL.len() as f32 + 12.0;
        let origin = pos2(12.0, container.y - height - 12.0);

        out.push(DrawCommand::Rect {
            rect: Rect::from_min_size(origin, vec2(width, height)),
            corner_radius: 6.0,
            fill: palette.label_fill,
            stroke: Stroke::new(1.0, palette.label_stroke),
        });

        for (row, level) in Relevance::ALL.iter().enumerate() {
            let y = origin.y + 6.0 + row_height * (row as f32 + 0.5);
            out.push(DrawCommand::Circle {
                center: pos2(origin.x + 14.0, y),
                radius: 5.0,
                fill: level.color(),
                stroke: Stroke::NONE,
            });
            out.push(DrawCommand::Text {
                pos: pos2(origin.x + 26.0, y),
                anchor: Align2::LEFT_CENTER,
                text: level.label().to_string(),
                size: 11.0,
                color: palette.text,
            });
        }
    }
}

/// Replay commands onto an egui painter, offset to the widget origin
pub fn paint(painter: &Painter, origin: Pos2, commands: &[DrawCommand]) {
    let shift = origin.to_vec2();
    for command in commands {
        match command {
            DrawCommand::Clear(color) => {
                painter.rect_filled(painter.clip_rect(), 0.0, *color);
            }
            DrawCommand::Line { from, to, stroke } => {
                painter.line_segment([*from + shift, *to + shift], *stroke);
            }
            DrawCommand::DashedLine {
                from,
                to,
                stroke,
                dash,
                gap,
            } => {
                painter.extend(egui::Shape::dashed_line(
                    &[*from + shift, *to + shift],
                    *stroke,
                    *dash,
                    *gap,
                ));
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                painter.circle(*center + shift, *radius, *fill, *stroke);
            }
            DrawCommand::Rect {
                rect,
                corner_radius,
                fill,
                stroke,
            } => {
                let rect = rect.translate(shift);
                painter.rect_filled(rect, *corner_radius, *fill);
                painter.rect_stroke(rect, *corner_radius, *stroke, egui::StrokeKind::Inside);
            }
            DrawCommand::Text {
                pos,
                anchor,
                text,
                size,
                color,
            } => {
                painter.text(*pos + shift, *anchor, text, FontId::proportional(*size), *color);
            }
        }
    }
}
